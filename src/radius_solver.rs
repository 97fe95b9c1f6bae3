//! Radius ↔ axis-length inversion for mitotic deformation (spec §9,
//! "Radius ↔ axis-length inversion").
//!
//! The original `CancerInSilico` source inverts a tabulated, size-normalized
//! relation (`OffLatticeRadiusSolver`) to recover the radius that keeps a
//! cell's area constant as its mitotic axis elongates. That table is not
//! recoverable from the distilled spec, so this module instead defines a
//! closed-form monotone relation over the same normalized domain, pinned to
//! the same two boundary cases the original's invariants require:
//!
//! - entering mitosis (`x = sqrt(8)`, axis length just reached `2 *
//!   sqrt(2 * size)`): radius is still at the growth cap, `sqrt(2 * size)`.
//! - fully elongated (`x = sqrt(16)`, `readyToDivide` threshold): radius
//!   has fallen to the lower bound of the invariant, `sqrt(size)`.
//!
//! Any monotone curve between those two pinned points keeps every
//! intermediate state inside the required `radius ∈ [sqrt(size), sqrt(2 *
//! size)]` invariant; this module uses the simplest one (affine in the
//! normalized axis length) and documents it as an approximation rather than
//! a physical derivation, per spec §9's explicit allowance.

/// Lower end of the normalized mitotic axis-length domain, `sqrt(8)`.
const X_MIN: f64 = 2.828_427_124_746_190_1; // sqrt(8)
/// Upper end of the normalized mitotic axis-length domain, `sqrt(16)`.
const X_MAX: f64 = 4.0; // sqrt(16)
/// Radius (normalized by `sqrt(size)`) at `X_MIN`.
const RHO_AT_MIN: f64 = 1.414_213_562_373_095_1; // sqrt(2)
/// Radius (normalized by `sqrt(size)`) at `X_MAX`.
const RHO_AT_MAX: f64 = 1.0;

/// Given a mitotic axis length `axis_length` and a cell type's `size`,
/// return the radius that conserves area under the approximation documented
/// above.
///
/// `axis_length` must lie in `[sqrt(8 * size), sqrt(16 * size)]` (the
/// mitotic deformation domain); values outside that range are clamped.
pub fn invert_axis_to_radius(axis_length: f64, size: f64) -> f64 {
    debug_assert!(size > 0.0, "size must be positive");
    let scale = size.sqrt();
    let x = (axis_length / scale).clamp(X_MIN, X_MAX);
    let t = (x - X_MIN) / (X_MAX - X_MIN);
    let rho = RHO_AT_MIN + (RHO_AT_MAX - RHO_AT_MIN) * t;
    rho * scale
}
