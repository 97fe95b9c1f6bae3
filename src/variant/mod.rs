//! Model dispatch (C8): concrete biological model variants plug five pure
//! hooks into the Monte Carlo engine. Dynamic selection happens once, by
//! name, at engine construction — spec §9's "Design Notes" replaces the
//! source's virtual dispatch with a small sum type over variant names.

mod drasdo_hohme;

pub use drasdo_hohme::DrasdoHohme;

use crate::cell::Cell;
use crate::error::{SimError, SimResult};

/// A Hamiltonian value, possibly infinite. An infinite post-trial energy
/// forces rejection unless the trial was growth (spec §4.4).
pub type Energy = f64;

/// Which of the four trial geometries (spec §4.3) a variant chose.
///
/// Growth is only eligible in `Phase::Interphase`, deformation only in
/// `Phase::Mitosis`; translation and rotation are always eligible. The
/// engine enforces this split, not the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialKind {
    /// Grow the radius, up to the type's growth cap.
    Growth,
    /// Move the center by a random offset.
    Translation,
    /// Elongate the mitotic axis, up to the full-elongation cap.
    Deformation,
    /// Rotate the axis angle.
    Rotation,
}

/// The five hooks a concrete biological model plugs into the engine.
///
/// Implementations are pure functions of the cell (and, for
/// `accept_trial`, of energies/neighbor counts) — no variant holds index
/// access or mutable state of its own.
pub trait ModelVariant: Send + Sync {
    /// Choose which trial kind to attempt for `c`, respecting its current
    /// phase. The concrete trial geometry is shared engine code (spec
    /// §4.3); this hook only picks which kind applies.
    fn attempt_trial(&self, c: &Cell, rng: &mut dyn rand::RngCore) -> TrialKind;

    /// Metropolis acceptance criterion for a non-growth trial.
    fn accept_trial(
        &self,
        pre_energy: Energy,
        post_energy: Energy,
        pre_neighbors: u32,
        post_neighbors: u32,
        rng: &mut dyn rand::RngCore,
    ) -> bool;

    /// The Hamiltonian contribution of `c` given its current neighbors.
    fn calculate_hamiltonian(&self, c: &Cell, neighbors: &[&Cell]) -> Energy;

    /// Count of interacting neighbors considered by this variant's energy.
    fn num_neighbors(&self, c: &Cell, candidates: &[&Cell]) -> u32;

    /// Maximum growth step size available to `c` this trial.
    fn max_growth(&self, c: &Cell) -> f64;

    /// Maximum deformation step size available to `c` this trial.
    fn max_deformation(&self, c: &Cell) -> f64;
}

/// Construct a registered variant by name (spec §6: "model variant name").
///
/// Unknown names are a configuration error, not a panic — spec §7 lists
/// "unknown variant name" among the configuration-error conditions.
pub fn by_name(name: &str, epsilon: f64, delta: f64, growth_rate: f64, n_g: f64) -> SimResult<Box<dyn ModelVariant>> {
    match name {
        "drasdoHohme" | "DrasdoHohme" => {
            Ok(Box::new(DrasdoHohme::new(epsilon, delta, growth_rate, n_g)))
        }
        other => Err(SimError::configuration(
            "variant",
            format!("unknown model variant '{other}'"),
        )),
    }
}
