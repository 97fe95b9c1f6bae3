//! Immutable cell-type registry (C2).

use std::sync::Arc;

use crate::error::{SimError, SimResult};

/// Produces a cycle length for a newly-seeded or newly-divided cell.
///
/// The core treats any result below `CellType::min_cycle` as a failure of
/// the external sampler, not a recoverable condition — see spec §6's
/// "Error contract".
pub trait CycleLengthSampler: Send + Sync {
    /// Draw one cycle length. May be non-finite or below the type's
    /// minimum; the caller (`CellType::cycle_length`) validates the draw.
    fn sample(&self, rng: &mut dyn rand::RngCore) -> f64;
}

/// Cycle lengths drawn uniformly from `[min, max)`.
///
/// A convenient, common sampler; hosts may supply any other
/// [`CycleLengthSampler`] (e.g. one backed by an empirical distribution).
#[derive(Debug, Clone, Copy)]
pub struct UniformCycleLengthSampler {
    min: f64,
    max: f64,
}

impl UniformCycleLengthSampler {
    /// Construct a sampler drawing uniformly from `[min, max)`.
    pub fn new(min: f64, max: f64) -> Self {
        debug_assert!(max > min, "sampler range must be non-empty");
        Self { min, max }
    }
}

impl CycleLengthSampler for UniformCycleLengthSampler {
    fn sample(&self, rng: &mut dyn rand::RngCore) -> f64 {
        rand::Rng::random_range(rng, self.min..self.max)
    }
}

/// An immutable descriptor shared by every cell of one biological type.
pub struct CellType {
    id: u32,
    name: String,
    size: f64,
    min_cycle: f64,
    sampler: Arc<dyn CycleLengthSampler>,
}

impl CellType {
    /// Construct a new cell type. `size` and `min_cycle` must be positive.
    pub fn new(
        id: u32,
        name: impl Into<String>,
        size: f64,
        min_cycle: f64,
        sampler: Arc<dyn CycleLengthSampler>,
    ) -> SimResult<Self> {
        if !(size > 0.0) {
            return Err(SimError::configuration("size", "must be positive"));
        }
        if !(min_cycle > 0.0) {
            return Err(SimError::configuration("minCycle", "must be positive"));
        }
        Ok(Self {
            id,
            name: name.into(),
            size,
            min_cycle,
            sampler,
        })
    }

    /// The type's unique small integer id.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `size` — base area scale for this cell type.
    pub fn size(&self) -> f64 {
        self.size
    }

    /// Minimum allowable cycle length.
    pub fn min_cycle(&self) -> f64 {
        self.min_cycle
    }

    /// Draw a fresh cycle length from this type's sampler, validating the
    /// sampler's contract (finite, `>= min_cycle`).
    pub fn cycle_length(&self, rng: &mut dyn rand::RngCore) -> SimResult<f64> {
        let length = self.sampler.sample(rng);
        if !length.is_finite() {
            return Err(SimError::sampler_contract("cycle length draw is not finite"));
        }
        if length < self.min_cycle {
            return Err(SimError::sampler_contract(format!(
                "cycle length {length} is below minimum {}",
                self.min_cycle
            )));
        }
        Ok(length)
    }
}

/// An immutable collection of registered cell types, indexed by id.
pub struct CellTypeRegistry {
    types: Vec<Arc<CellType>>,
}

impl CellTypeRegistry {
    /// Construct a registry from an ordered list of types (ids need not be
    /// contiguous but must be unique).
    pub fn new(types: Vec<Arc<CellType>>) -> SimResult<Self> {
        if types.is_empty() {
            return Err(SimError::configuration("cellTypes", "must not be empty"));
        }
        let mut ids: Vec<u32> = types.iter().map(|t| t.id()).collect();
        ids.sort_unstable();
        if ids.windows(2).any(|w| w[0] == w[1]) {
            return Err(SimError::configuration("cellTypes", "ids must be unique"));
        }
        Ok(Self { types })
    }

    /// Look up a type by id.
    pub fn get(&self, id: u32) -> Option<&Arc<CellType>> {
        self.types.iter().find(|t| t.id() == id)
    }

    /// All registered types.
    pub fn types(&self) -> &[Arc<CellType>] {
        &self.types
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// True if no types are registered (never true for a valid registry).
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Largest `sqrt(2 * size)` across every registered type — the maximum
    /// radius any cell in this population can ever reach.
    pub fn max_radius(&self) -> f64 {
        self.types
            .iter()
            .map(|t| (2.0 * t.size()).sqrt())
            .fold(0.0, f64::max)
    }

    /// Pick a uniform-random registered type.
    pub fn random_type(&self, rng: &mut impl rand::Rng) -> Arc<CellType> {
        let idx = rng.random_range(0..self.types.len());
        Arc::clone(&self.types[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn rejects_non_positive_size() {
        let sampler = Arc::new(UniformCycleLengthSampler::new(24.0, 30.0));
        let err = CellType::new(0, "tumor", -1.0, 24.0, sampler).unwrap_err();
        assert!(matches!(err, SimError::Configuration { field: "size", .. }));
    }

    #[test]
    fn cycle_length_below_minimum_is_sampler_contract_error() {
        let sampler = Arc::new(UniformCycleLengthSampler::new(1.0, 2.0));
        let ty = CellType::new(0, "tumor", 1.0, 24.0, sampler).unwrap();
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let err = ty.cycle_length(&mut rng).unwrap_err();
        assert!(matches!(err, SimError::SamplerContract { .. }));
    }

    #[test]
    fn registry_rejects_duplicate_ids() {
        let sampler = Arc::new(UniformCycleLengthSampler::new(24.0, 30.0));
        let a = Arc::new(CellType::new(0, "a", 1.0, 24.0, sampler.clone()).unwrap());
        let b = Arc::new(CellType::new(0, "b", 1.0, 24.0, sampler).unwrap());
        assert!(CellTypeRegistry::new(vec![a, b]).is_err());
    }

    #[test]
    fn max_radius_across_types() {
        let sampler = Arc::new(UniformCycleLengthSampler::new(24.0, 30.0));
        let a = Arc::new(CellType::new(0, "a", 1.0, 24.0, sampler.clone()).unwrap());
        let b = Arc::new(CellType::new(1, "b", 4.0, 24.0, sampler).unwrap());
        let reg = CellTypeRegistry::new(vec![a, b]).unwrap();
        assert_eq!(reg.max_radius(), (8.0_f64).sqrt());
    }
}
