//! Error contract for the simulation (spec §7).
//!
//! Recoverable conditions — a proposed trial overlapping a neighbor, or
//! crossing the boundary — are not errors, they are trial rejections
//! handled entirely inside [`crate::engine`]. Everything in this module is
//! either a configuration mistake the caller made, a contract violation by
//! an external collaborator (the cycle-length sampler), or an internal
//! invariant failure that should never happen in a correct build.

use thiserror::Error;

/// Error kinds surfaced to the host.
#[derive(Debug, Error)]
pub enum SimError {
    /// An invalid parameter was supplied (negative size, unknown variant
    /// name, non-positive bucket size, ...).
    #[error("invalid configuration for `{field}`: {reason}")]
    Configuration {
        /// Name of the offending configuration field.
        field: &'static str,
        /// Human-readable explanation.
        reason: String,
    },

    /// An external sampler violated its contract (e.g. a cycle-length
    /// sampler returned a value below the type's `minCycle`, or a
    /// non-finite draw).
    #[error("sampler contract violated: {reason}")]
    SamplerContract {
        /// Human-readable explanation.
        reason: String,
    },

    /// An internal invariant was violated: a programming error, not a
    /// recoverable runtime condition. Fatal.
    #[error("internal invariant violated: {reason}")]
    Invariant {
        /// Human-readable explanation.
        reason: String,
    },
}

/// Convenience alias used throughout the crate's public surface.
pub type SimResult<T> = Result<T, SimError>;

impl SimError {
    /// Construct a [`SimError::Configuration`] error.
    pub fn configuration(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Configuration {
            field,
            reason: reason.into(),
        }
    }

    /// Construct a [`SimError::SamplerContract`] error.
    pub fn sampler_contract(reason: impl Into<String>) -> Self {
        Self::SamplerContract {
            reason: reason.into(),
        }
    }

    /// Construct a [`SimError::Invariant`] error.
    pub fn invariant(reason: impl Into<String>) -> Self {
        Self::Invariant {
            reason: reason.into(),
        }
    }
}

/// Outcome of a completed call to [`crate::engine::Engine::run`].
///
/// Cancellation is surfaced through this type rather than through
/// [`SimError`], matching spec §7's statement that cancellation is "non
/// error": a cancelled run still hands back whatever snapshots were
/// recorded before the cancellation was observed.
#[derive(Debug)]
pub enum RunOutcome {
    /// The run executed every requested time step.
    Completed(Vec<crate::recorder::PopulationSnapshot>),
    /// The cooperative cancellation hook requested an early stop.
    Cancelled(Vec<crate::recorder::PopulationSnapshot>),
}

impl RunOutcome {
    /// Borrow the recorded snapshots regardless of how the run ended.
    pub fn snapshots(&self) -> &[crate::recorder::PopulationSnapshot] {
        match self {
            RunOutcome::Completed(s) | RunOutcome::Cancelled(s) => s,
        }
    }

    /// True if the cancellation hook cut the run short.
    pub fn was_cancelled(&self) -> bool {
        matches!(self, RunOutcome::Cancelled(_))
    }
}
