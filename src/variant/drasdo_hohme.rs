//! A representative concrete model variant: a pairwise elastic contact
//! potential in the style of Drasdo & Höhme's off-lattice cell model.
//!
//! The source's exact Hamiltonian is explicitly out of scope (spec §1:
//! "the concrete energy/Hamiltonian function of a given biological model
//! variant ... the core defines *how* it is consumed, not its formula").
//! This variant exists so the dispatch-by-name path (C8) and the S1
//! scenario are exercised end to end; any other `ModelVariant` can be
//! registered alongside it without touching the engine.

use rand::Rng;

use crate::cell::{Cell, Phase};
use crate::variant::{Energy, ModelVariant, TrialKind};

/// Elastic-contact variant: cells closer than `delta` accrue a quadratic
/// compression energy scaled by `epsilon`; growth throttles on a cell's own
/// trial-acceptance history, scaled by `growth_rate` and `n_g`.
pub struct DrasdoHohme {
    epsilon: f64,
    delta: f64,
    growth_rate: f64,
    n_g: f64,
}

impl DrasdoHohme {
    /// Construct a variant from the configuration constants of spec §6.
    pub fn new(epsilon: f64, delta: f64, growth_rate: f64, n_g: f64) -> Self {
        Self {
            epsilon,
            delta,
            growth_rate,
            n_g,
        }
    }
}

impl ModelVariant for DrasdoHohme {
    fn attempt_trial(&self, c: &Cell, rng: &mut dyn rand::RngCore) -> TrialKind {
        let choice: f64 = rng.random_range(0.0..1.0);
        match c.phase() {
            Phase::Interphase => {
                if choice < 0.25 {
                    TrialKind::Growth
                } else if choice < 0.625 {
                    TrialKind::Translation
                } else {
                    TrialKind::Rotation
                }
            }
            Phase::Mitosis => {
                if choice < 0.25 {
                    TrialKind::Deformation
                } else if choice < 0.625 {
                    TrialKind::Translation
                } else {
                    TrialKind::Rotation
                }
            }
        }
    }

    fn accept_trial(
        &self,
        pre_energy: Energy,
        post_energy: Energy,
        _pre_neighbors: u32,
        _post_neighbors: u32,
        rng: &mut dyn rand::RngCore,
    ) -> bool {
        if !post_energy.is_finite() {
            return false;
        }
        let delta_e = post_energy - pre_energy;
        if delta_e <= 0.0 {
            true
        } else {
            rng.random_range(0.0..1.0) < (-delta_e).exp()
        }
    }

    fn calculate_hamiltonian(&self, c: &Cell, neighbors: &[&Cell]) -> Energy {
        neighbors
            .iter()
            .map(|other| {
                let gap = c.distance(other);
                let compression = (self.delta - gap).max(0.0);
                self.epsilon * compression * compression
            })
            .sum()
    }

    fn num_neighbors(&self, c: &Cell, candidates: &[&Cell]) -> u32 {
        candidates
            .iter()
            .filter(|other| c.distance(other) < self.delta)
            .count() as u32
    }

    fn max_growth(&self, c: &Cell) -> f64 {
        self.growth_rate * c.trial_ratio() / self.n_g
    }

    fn max_deformation(&self, _c: &Cell) -> f64 {
        self.growth_rate / self.n_g
    }
}
