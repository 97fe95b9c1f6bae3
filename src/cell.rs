//! Mutable per-cell state (C3).

use std::collections::HashSet;
use std::f64::consts::PI;
use std::sync::Arc;

use crate::cell_type::CellType;
use crate::drug::Drug;
use crate::error::SimResult;
use crate::point::Point;
use crate::radius_solver::invert_axis_to_radius;

/// Cell-cycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Single-lobe growth phase.
    Interphase,
    /// Dumbbell elongation phase leading to division.
    Mitosis,
}

/// Running acceptance counters used to throttle growth trials.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrialRecord {
    accepted: u32,
    total: u32,
}

impl TrialRecord {
    fn clear(&mut self) {
        self.accepted = 0;
        self.total = 0;
    }

    fn add(&mut self, accepted: bool) {
        self.total += 1;
        if accepted {
            self.accepted += 1;
        }
    }

    /// Warm-up fraction of `1.0` until five trials are recorded, then the
    /// running acceptance ratio.
    pub fn ratio(&self) -> f64 {
        if self.total < 5 {
            1.0
        } else {
            f64::from(self.accepted) / f64::from(self.total)
        }
    }
}

/// A single simulated cell.
#[derive(Clone)]
pub struct Cell {
    coordinates: Point,
    radius: f64,
    axis_length: f64,
    axis_angle: f64,
    phase: Phase,
    ready_to_divide: bool,
    cycle_length: f64,
    cell_type: Arc<CellType>,
    trial_record: TrialRecord,
    drugs_applied: HashSet<u32>,
}

impl Cell {
    /// Construct a fresh interphase cell of the given type at the origin,
    /// with a freshly-sampled cycle length and a random axis orientation.
    pub fn new(cell_type: Arc<CellType>, rng: &mut impl rand::Rng) -> SimResult<Self> {
        let cycle_length = cell_type.cycle_length(rng)?;
        let radius = cell_type.size().sqrt();
        Ok(Self {
            coordinates: Point::new(0.0, 0.0),
            radius,
            axis_length: 2.0 * radius,
            axis_angle: rng.random_range(0.0..2.0 * PI),
            phase: Phase::Interphase,
            ready_to_divide: false,
            cycle_length,
            cell_type,
            trial_record: TrialRecord::default(),
            drugs_applied: HashSet::new(),
        })
    }

    /// Current center position.
    pub fn coordinates(&self) -> Point {
        self.coordinates
    }

    /// Move the cell's center (does not touch the spatial index — callers
    /// must also call `SpatialIndex::update`).
    pub fn set_coordinates(&mut self, p: Point) {
        self.coordinates = p;
    }

    /// Current short-axis radius.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Current long-axis length.
    pub fn axis_length(&self) -> f64 {
        self.axis_length
    }

    /// Current orientation of the long axis, in `[0, 2*pi)`.
    pub fn axis_angle(&self) -> f64 {
        self.axis_angle
    }

    /// Current cell-cycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the cell's mitotic axis has reached its maximum.
    pub fn ready_to_divide(&self) -> bool {
        self.ready_to_divide
    }

    /// This cell's sampled cycle length.
    pub fn cycle_length(&self) -> f64 {
        self.cycle_length
    }

    /// The cell's (shared, immutable) type.
    pub fn cell_type(&self) -> &Arc<CellType> {
        &self.cell_type
    }

    /// Set the cell's radius, deriving the (interphase) axis length as
    /// `2 * radius`.
    pub fn set_radius(&mut self, radius: f64) {
        self.radius = radius;
        self.axis_length = 2.0 * radius;
    }

    /// Set the cell's mitotic axis length, `len`, re-deriving the radius at
    /// (approximately) constant area. `len` must be at least
    /// `sqrt(8 * size)` — the mitotic deformation domain.
    pub fn set_axis_length(&mut self, len: f64) {
        debug_assert!(
            len >= (8.0 * self.cell_type.size()).sqrt(),
            "adjusting axis on an interphase cell"
        );
        self.axis_length = len;
        self.radius = invert_axis_to_radius(len, self.cell_type.size());
    }

    /// Transition to `MITOSIS`.
    pub fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    /// Mark the cell ready to divide.
    pub fn set_ready_to_divide(&mut self, ready: bool) {
        self.ready_to_divide = ready;
    }

    /// Rotate the axis angle in place.
    pub fn set_axis_angle(&mut self, angle: f64) {
        self.axis_angle = angle;
    }

    /// Centers of the two dumbbell lobes, offset from the cell center along
    /// the axis angle by `(axis_length / 2 - radius)`.
    pub fn centers(&self) -> (Point, Point) {
        let offset = 0.5 * self.axis_length - self.radius;
        let dx = offset * self.axis_angle.cos();
        let dy = offset * self.axis_angle.sin();
        (
            Point::new(self.coordinates.x + dx, self.coordinates.y + dy),
            Point::new(self.coordinates.x - dx, self.coordinates.y - dy),
        )
    }

    /// Edge distance to another cell: the smallest distance between any of
    /// the 2x2 lobe-center pairs, minus both radii. Negative means overlap.
    pub fn distance(&self, other: &Cell) -> f64 {
        let (a1, a2) = self.centers();
        let (b1, b2) = other.centers();
        let min_center_distance = a1
            .distance(&b1)
            .min(a1.distance(&b2))
            .min(a2.distance(&b1))
            .min(a2.distance(&b2));
        min_center_distance - self.radius - other.radius
    }

    /// Split this cell in two: `daughter` (already constructed, fresh
    /// interphase state) takes one lobe center, `self` resets to a fresh
    /// interphase cell at the other lobe center.
    pub fn divide(&mut self, daughter: &mut Cell, rng: &mut impl rand::Rng) {
        let (first, second) = self.centers();
        daughter.set_coordinates(first);
        self.set_coordinates(second);
        self.set_radius(self.cell_type.size().sqrt());
        self.axis_angle = rng.random_range(0.0..2.0 * PI);
        self.phase = Phase::Interphase;
        self.ready_to_divide = false;
        self.trial_record.clear();
    }

    /// Place the cell at a uniform-random point of its own cell cycle.
    pub fn goto_random_cycle_point(&mut self, rng: &mut impl rand::Rng) {
        let size = self.cell_type.size();
        let chance_interphase = 1.0 - 2.0 / (self.cycle_length + 2.0);
        if rng.random_range(0.0..1.0) < chance_interphase {
            self.phase = Phase::Interphase;
            let r = rng.random_range(size.sqrt()..(2.0 * size).sqrt());
            self.set_radius(r);
        } else {
            self.phase = Phase::Mitosis;
            let len = rng.random_range((8.0 * size).sqrt()..(16.0 * size).sqrt());
            self.set_axis_length(len);
        }
    }

    /// Record the outcome of a growth trial.
    pub fn add_to_trial_record(&mut self, accepted: bool) {
        self.trial_record.add(accepted);
    }

    /// Current growth-trial acceptance ratio (warm-up value of `1.0` until
    /// five trials have been recorded).
    pub fn trial_ratio(&self) -> f64 {
        self.trial_record.ratio()
    }

    /// Whether a drug has already been applied to this cell.
    pub fn drug_applied(&self, drug_id: u32) -> bool {
        self.drugs_applied.contains(&drug_id)
    }

    /// Apply a drug's effect to this cell. Idempotent for the same drug id.
    pub fn apply_drug(&mut self, drug: &Drug) {
        self.drugs_applied.insert(drug.id());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell_type::UniformCycleLengthSampler;
    use rand::SeedableRng;

    fn make_type(size: f64) -> Arc<CellType> {
        Arc::new(
            CellType::new(
                0,
                "t",
                size,
                24.0,
                Arc::new(UniformCycleLengthSampler::new(24.0, 30.0)),
            )
            .unwrap(),
        )
    }

    #[test]
    fn fresh_cell_is_interphase_at_min_radius() {
        let ty = make_type(2.0);
        let mut rng = rand::rngs::StdRng::seed_from_u64(0);
        let cell = Cell::new(ty.clone(), &mut rng).unwrap();
        assert_eq!(cell.phase(), Phase::Interphase);
        assert_eq!(cell.radius(), 2.0_f64.sqrt());
        assert_eq!(cell.axis_length(), 2.0 * cell.radius());
    }

    #[test]
    fn centers_collapse_to_coordinates_in_interphase() {
        let ty = make_type(1.0);
        let mut rng = rand::rngs::StdRng::seed_from_u64(0);
        let cell = Cell::new(ty, &mut rng).unwrap();
        let (a, b) = cell.centers();
        assert!((a.x - cell.coordinates().x).abs() < 1e-12);
        assert!((b.x - cell.coordinates().x).abs() < 1e-12);
    }

    #[test]
    fn distance_accounts_for_both_radii() {
        let ty = make_type(1.0);
        let mut rng = rand::rngs::StdRng::seed_from_u64(0);
        let mut a = Cell::new(ty.clone(), &mut rng).unwrap();
        let mut b = Cell::new(ty, &mut rng).unwrap();
        a.set_coordinates(Point::new(0.0, 0.0));
        b.set_coordinates(Point::new(10.0, 0.0));
        let expected = 10.0 - a.radius() - b.radius();
        assert!((a.distance(&b) - expected).abs() < 1e-9);
    }

    #[test]
    fn divide_resets_parent_and_places_daughter() {
        let ty = make_type(1.0);
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let mut parent = Cell::new(ty.clone(), &mut rng).unwrap();
        parent.set_axis_length((16.0_f64).sqrt());
        parent.set_ready_to_divide(true);
        let mut daughter = Cell::new(ty, &mut rng).unwrap();
        parent.divide(&mut daughter, &mut rng);

        assert_eq!(parent.phase(), Phase::Interphase);
        assert!(!parent.ready_to_divide());
        assert_eq!(parent.radius(), 1.0_f64.sqrt());
        assert_eq!(parent.axis_length(), 2.0 * parent.radius());
    }

    #[test]
    fn trial_record_warms_up_before_five_trials() {
        let ty = make_type(1.0);
        let mut rng = rand::rngs::StdRng::seed_from_u64(0);
        let mut cell = Cell::new(ty, &mut rng).unwrap();
        cell.add_to_trial_record(false);
        cell.add_to_trial_record(false);
        assert_eq!(cell.trial_ratio(), 1.0);
        for _ in 0..10 {
            cell.add_to_trial_record(false);
        }
        assert_eq!(cell.trial_ratio(), 0.0);
    }
}
