//! Time-gated drug effects (C6).

use std::collections::HashMap;

use crate::spatial_index::SpatialIndex;

/// An immutable drug descriptor: when it switches on, and its per-cell-type
/// effect vector (consumed opaquely by [`crate::cell::Cell`] — the crate
/// only tracks *that* a drug has been applied, not what it does).
#[derive(Debug, Clone)]
pub struct Drug {
    id: u32,
    time_added: f64,
    effect_by_type: HashMap<u32, Vec<f64>>,
}

impl Drug {
    /// Construct a new drug, switching on at `time_added`.
    pub fn new(id: u32, time_added: f64, effect_by_type: HashMap<u32, Vec<f64>>) -> Self {
        Self {
            id,
            time_added,
            effect_by_type,
        }
    }

    /// Unique drug id.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Simulation time at which this drug begins to act.
    pub fn time_added(&self) -> f64 {
        self.time_added
    }

    /// The effect vector for a given cell type, if this drug affects it.
    pub fn effect_for_type(&self, type_id: u32) -> Option<&[f64]> {
        self.effect_by_type.get(&type_id).map(Vec::as_slice)
    }
}

/// Applies time-gated drugs to every cell in the population once their
/// `timeAdded` has passed, exactly once per drug per cell.
pub struct DrugSchedule {
    drugs: Vec<Drug>,
}

impl DrugSchedule {
    /// Construct a schedule from an ordered list of drugs.
    pub fn new(drugs: Vec<Drug>) -> Self {
        Self { drugs }
    }

    /// Registered drugs.
    pub fn drugs(&self) -> &[Drug] {
        &self.drugs
    }

    /// Apply every drug whose `timeAdded` has passed to every cell that has
    /// not yet received it. Iterates the whole population once, as spec
    /// §4.3 requires ("Apply drugs once (C6), iterating C4 globally").
    pub fn update(&self, time: f64, index: &mut SpatialIndex) {
        if self.drugs.is_empty() {
            return;
        }
        let handles: Vec<_> = index.handles().collect();
        for handle in handles {
            let cell = index.get_mut(handle);
            for drug in &self.drugs {
                if !cell.drug_applied(drug.id()) && time >= drug.time_added() {
                    log::debug!(
                        "drug {} now applying to cell at {}",
                        drug.id(),
                        cell.coordinates()
                    );
                    cell.apply_drug(drug);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;
    use crate::cell_type::{CellType, UniformCycleLengthSampler};
    use crate::point::Point;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn make_cell() -> Cell {
        let ty = Arc::new(
            CellType::new(
                0,
                "t",
                1.0,
                24.0,
                Arc::new(UniformCycleLengthSampler::new(24.0, 30.0)),
            )
            .unwrap(),
        );
        let mut rng = rand::rngs::StdRng::seed_from_u64(0);
        Cell::new(ty, &mut rng).unwrap()
    }

    #[test]
    fn drug_applies_only_once_time_gate_passed() {
        let mut index = SpatialIndex::new(1.0);
        for i in 0..10 {
            let mut c = make_cell();
            c.set_coordinates(Point::new(i as f64 * 5.0, 0.0));
            index.insert(c);
        }

        let schedule = DrugSchedule::new(vec![Drug::new(0, 5.0, HashMap::new())]);

        schedule.update(4.9, &mut index);
        assert!(index.handles().all(|h| !index.get(h).drug_applied(0)));

        schedule.update(5.0, &mut index);
        assert!(index.handles().all(|h| index.get(h).drug_applied(0)));
    }
}
