//! # `off_lattice_cell_mc`
//!
//! A Metropolis Monte Carlo simulator of an off-lattice biological cell
//! population growing on a two-dimensional continuous plane.

#![deny(missing_docs)]
#![deny(clippy::all)]

mod cell;
mod cell_type;
mod config;
mod drug;
mod engine;
mod error;
mod point;
mod radius_solver;
mod recorder;
mod spatial_index;
mod variant;

pub use cell::{Cell, Phase};
pub use cell_type::{CellType, CellTypeRegistry, CycleLengthSampler, UniformCycleLengthSampler};
pub use config::{CellTypeConfig, CycleLengthSamplerConfig, DrugConfig, SimulationConfig};
pub use drug::{Drug, DrugSchedule};
pub use engine::Engine;
pub use error::{RunOutcome, SimError, SimResult};
pub use point::{GridPoint, Point};
pub use recorder::{CellSnapshot, PopulationSnapshot, Recorder};
pub use spatial_index::{CellHandle, LocalIterator, SpatialIndex};
pub use variant::{by_name as variant_by_name, DrasdoHohme, Energy, ModelVariant, TrialKind};
