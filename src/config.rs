//! External configuration (spec §6): a structured parameter object
//! loadable from YAML, generalizing the teacher's `RuleSet::load`/`save`.

use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::cell_type::{CellType, CellTypeRegistry, CycleLengthSampler, UniformCycleLengthSampler};
use crate::drug::{Drug, DrugSchedule};
use crate::error::{SimError, SimResult};

/// How a cell type's cycle length is drawn. `serde` cannot deserialize a
/// trait object directly, so the config layer enumerates the samplers the
/// crate ships and turns the chosen one into an `Arc<dyn CycleLengthSampler>`
/// at load time (§6: "cycleLength sampler (callable returning a real)").
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CycleLengthSamplerConfig {
    /// Uniform over `[min, max)`.
    Uniform {
        /// Lower bound, inclusive.
        min: f64,
        /// Upper bound, exclusive.
        max: f64,
    },
}

impl CycleLengthSamplerConfig {
    fn build(self) -> Arc<dyn CycleLengthSampler> {
        match self {
            CycleLengthSamplerConfig::Uniform { min, max } => {
                Arc::new(UniformCycleLengthSampler::new(min, max))
            }
        }
    }
}

/// One cell-type entry of the configuration (spec §6: "Cell-type descriptor
/// (per entry)").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellTypeConfig {
    /// Unique small integer id.
    pub id: u32,
    /// Display name.
    pub name: String,
    /// Base area scale.
    pub size: f64,
    /// Minimum allowable cycle length.
    pub min_cycle: f64,
    /// Cycle-length sampler descriptor.
    pub cycle_length: CycleLengthSamplerConfig,
}

impl CellTypeConfig {
    fn build(&self) -> SimResult<CellType> {
        CellType::new(
            self.id,
            self.name.clone(),
            self.size,
            self.min_cycle,
            self.cycle_length.build(),
        )
    }
}

/// One drug entry of the configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrugConfig {
    /// Unique drug id.
    pub id: u32,
    /// Simulation time at which the drug switches on.
    pub time_added: f64,
    /// Per-cell-type effect vectors, keyed by cell-type id.
    pub effect_by_type: std::collections::HashMap<u32, Vec<f64>>,
}

impl DrugConfig {
    fn build(&self) -> Drug {
        Drug::new(self.id, self.time_added, self.effect_by_type.clone())
    }
}

/// The full structured parameter object of spec §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationConfig {
    /// Number of cells to seed at construction.
    pub initial_num: u32,
    /// Target area fraction for the seeding boundary.
    pub density: f64,
    /// Maximum per-trial translation distance.
    pub max_translation: f64,
    /// Maximum per-trial rotation, in radians.
    pub max_rotation: f64,
    /// Maximum per-trial deformation growth.
    pub max_deformation: f64,
    /// Resistance constant consumed by a variant's Hamiltonian.
    pub epsilon: f64,
    /// Compression constant consumed by a variant's Hamiltonian.
    pub delta: f64,
    /// Record a population snapshot every this many completed steps (0 ⇒
    /// record only the initial state).
    pub output_interval: u64,
    /// Random seed; reproducible given identical parameters.
    pub seed: u64,
    /// Per-type maximum growth rate, scaling `maxGrowth`.
    pub growth_rate: f64,
    /// Whether a daughter cell inherits its parent's growth rate.
    pub inherit_growth: bool,
    /// Growth throttle exponent/divisor used by a variant's `maxGrowth`.
    pub n_g: f64,
    /// Simulation time advanced per completed time step.
    pub time_increment: f64,
    /// Total number of time steps to run.
    pub num_steps: u64,
    /// Circular boundary radius; `0.0` means unbounded.
    #[serde(default)]
    pub boundary: f64,
    /// If set, every seeded cell starts at a synchronized cell-cycle point
    /// (fresh interphase at minimum radius) instead of a random one.
    #[serde(default)]
    pub sync_cell_cycle: bool,
    /// Registered cell types.
    pub cell_types: Vec<CellTypeConfig>,
    /// Scheduled drugs.
    #[serde(default)]
    pub drugs: Vec<DrugConfig>,
    /// Name of the model variant to dispatch to (spec §9, C8).
    pub variant: String,
}

impl SimulationConfig {
    /// Load a configuration from a YAML file.
    pub fn load(filepath: &str) -> Result<Self> {
        let yaml = std::fs::read_to_string(filepath)?;
        let parsed = serde_yaml::from_str(&yaml)?;
        Ok(parsed)
    }

    /// Save this configuration as a YAML file.
    pub fn save(&self, filepath: &str) -> Result<(), std::io::Error> {
        let yaml = serde_yaml::to_string(&self).expect("config always serializes");
        std::fs::write(filepath, yaml)
    }

    /// Build the immutable cell-type registry named by this configuration.
    pub fn build_registry(&self) -> SimResult<CellTypeRegistry> {
        if self.cell_types.is_empty() {
            return Err(SimError::configuration("cellTypes", "must not be empty"));
        }
        let types = self
            .cell_types
            .iter()
            .map(|c| c.build().map(Arc::new))
            .collect::<SimResult<Vec<_>>>()?;
        CellTypeRegistry::new(types)
    }

    /// Build the drug schedule named by this configuration.
    pub fn build_drug_schedule(&self) -> DrugSchedule {
        DrugSchedule::new(self.drugs.iter().map(DrugConfig::build).collect())
    }

    /// Validate the numeric fields that must be strictly positive,
    /// independent of any one variant or cell-type entry.
    pub fn validate(&self) -> SimResult<()> {
        if !(self.density > 0.0) {
            return Err(SimError::configuration("density", "must be positive"));
        }
        if !(self.time_increment > 0.0) {
            return Err(SimError::configuration("timeIncrement", "must be positive"));
        }
        if self.boundary < 0.0 {
            return Err(SimError::configuration("boundary", "must be non-negative"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
initialNum: 10
density: 0.3
maxTranslation: 0.1
maxRotation: 0.1
maxDeformation: 0.1
epsilon: 1.0
delta: 1.0
outputInterval: 10
seed: 42
growthRate: 1.0
inheritGrowth: false
nG: 24.0
timeIncrement: 1.0
numSteps: 100
boundary: 0.0
syncCellCycle: false
variant: drasdoHohme
cellTypes:
  - id: 0
    name: tumor
    size: 1.0
    minCycle: 24.0
    cycleLength:
      kind: uniform
      min: 24.0
      max: 30.0
drugs: []
"#
    }

    #[test]
    fn parses_a_complete_config() {
        let cfg: SimulationConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(cfg.initial_num, 10);
        assert_eq!(cfg.cell_types.len(), 1);
        assert_eq!(cfg.variant, "drasdoHohme");
    }

    #[test]
    fn builds_a_registry_from_config() {
        let cfg: SimulationConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        let registry = cfg.build_registry().unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.get(0).is_some());
    }

    #[test]
    fn rejects_empty_cell_type_list() {
        let mut cfg: SimulationConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        cfg.cell_types.clear();
        assert!(cfg.build_registry().is_err());
    }

    #[test]
    fn validate_rejects_non_positive_density() {
        let mut cfg: SimulationConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        cfg.density = 0.0;
        assert!(cfg.validate().is_err());
    }
}
