//! Population recorder (C7): periodic snapshots of C4's full contents.

use crate::cell::Phase;
use crate::spatial_index::SpatialIndex;

/// One cell's state at a recording event, per spec §3's 9-field tuple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellSnapshot {
    /// Center x-coordinate.
    pub x: f64,
    /// Center y-coordinate.
    pub y: f64,
    /// Short-axis radius.
    pub radius: f64,
    /// Long-axis length.
    pub axis_length: f64,
    /// Long-axis orientation, in `[0, 2*pi)`.
    pub axis_angle: f64,
    /// Sampled cell-cycle length.
    pub cycle_length: f64,
    /// Cell-cycle phase at recording time.
    pub phase: Phase,
    /// The cell's type id.
    pub type_id: u32,
    /// Growth-trial acceptance ratio at recording time.
    pub trial_ratio: f64,
}

/// A full-population snapshot taken at one recording event.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationSnapshot {
    /// Simulation time at which this snapshot was taken.
    pub time: f64,
    /// One entry per live cell, in the order C4 yielded them.
    pub cells: Vec<CellSnapshot>,
}

impl PopulationSnapshot {
    /// Take a snapshot of every live cell currently in `index`.
    pub fn capture(time: f64, index: &SpatialIndex) -> Self {
        let cells = index
            .handles()
            .map(|handle| {
                let cell = index.get(handle);
                let (x, y) = (cell.coordinates().x, cell.coordinates().y);
                CellSnapshot {
                    x,
                    y,
                    radius: cell.radius(),
                    axis_length: cell.axis_length(),
                    axis_angle: cell.axis_angle(),
                    cycle_length: cell.cycle_length(),
                    phase: cell.phase(),
                    type_id: cell.cell_type().id(),
                    trial_ratio: cell.trial_ratio(),
                }
            })
            .collect();
        Self { time, cells }
    }

    /// Number of live cells captured in this snapshot.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True if no cells were live at recording time.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Accumulates [`PopulationSnapshot`]s at a fixed step interval.
///
/// The buffer grows monotonically for the lifetime of a run and is handed
/// back to the caller as the ordered sequence spec §6 describes as the run's
/// output.
pub struct Recorder {
    interval: u64,
    snapshots: Vec<PopulationSnapshot>,
}

impl Recorder {
    /// Construct a recorder that records every `interval` completed steps.
    /// `interval` of zero means "record only what is explicitly requested
    /// via [`Recorder::record_initial`]".
    pub fn new(interval: u64) -> Self {
        Self {
            interval,
            snapshots: Vec::new(),
        }
    }

    /// Record the initial population state (step 0), unconditionally.
    pub fn record_initial(&mut self, index: &SpatialIndex) {
        self.snapshots.push(PopulationSnapshot::capture(0.0, index));
    }

    /// Offer a completed step for recording. Records iff `interval` is
    /// nonzero and `step` is a multiple of it.
    pub fn maybe_record(&mut self, step: u64, time: f64, index: &SpatialIndex) {
        if self.interval != 0 && step % self.interval == 0 {
            log::debug!("recording snapshot at step {step} (time {time})");
            self.snapshots.push(PopulationSnapshot::capture(time, index));
        }
    }

    /// Number of snapshots recorded so far.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// True if no snapshots have been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consume the recorder, handing back the ordered snapshot sequence.
    pub fn into_snapshots(self) -> Vec<PopulationSnapshot> {
        self.snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;
    use crate::cell_type::{CellType, UniformCycleLengthSampler};
    use rand::SeedableRng;
    use std::sync::Arc;

    fn make_type() -> Arc<CellType> {
        Arc::new(
            CellType::new(
                0,
                "t",
                1.0,
                24.0,
                Arc::new(UniformCycleLengthSampler::new(24.0, 30.0)),
            )
            .unwrap(),
        )
    }

    #[test]
    fn capture_yields_one_entry_per_live_cell() {
        let mut index = SpatialIndex::new(1.0);
        let ty = make_type();
        let mut rng = rand::rngs::StdRng::seed_from_u64(0);
        for _ in 0..5 {
            index.insert(Cell::new(ty.clone(), &mut rng).unwrap());
        }
        let snap = PopulationSnapshot::capture(1.5, &index);
        assert_eq!(snap.len(), 5);
        assert_eq!(snap.time, 1.5);
    }

    #[test]
    fn maybe_record_honors_interval() {
        let mut index = SpatialIndex::new(1.0);
        let ty = make_type();
        let mut rng = rand::rngs::StdRng::seed_from_u64(0);
        index.insert(Cell::new(ty, &mut rng).unwrap());

        let mut recorder = Recorder::new(10);
        for step in 0..=30u64 {
            recorder.maybe_record(step, step as f64, &index);
        }
        assert_eq!(recorder.len(), 4); // steps 0, 10, 20, 30
    }

    #[test]
    fn zero_interval_records_nothing_but_initial() {
        let mut index = SpatialIndex::new(1.0);
        let ty = make_type();
        let mut rng = rand::rngs::StdRng::seed_from_u64(0);
        index.insert(Cell::new(ty, &mut rng).unwrap());

        let mut recorder = Recorder::new(0);
        recorder.record_initial(&index);
        for step in 1..=5u64 {
            recorder.maybe_record(step, step as f64, &index);
        }
        assert_eq!(recorder.len(), 1);
    }
}
