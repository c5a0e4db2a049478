//! The absent-value sentinel.
//!
//! A panel cell either holds an observation or is *absent* ("no
//! observation"), which is distinct from zero. Absent is carried as a
//! non-finite `f64` payload, but all code in the workspace goes through
//! this module instead of testing for NaN directly, so the propagation
//! rules live in one place:
//!
//! - arithmetic combining absent with anything yields absent;
//! - comparisons against absent are always false;
//! - reductions (mean, std, quantile, correlation) skip absent inputs.

/// Returns the absent-value sentinel.
#[inline]
#[must_use]
pub const fn absent() -> f64 {
    f64::NAN
}

/// Returns true if the cell holds an observation.
///
/// Infinities are treated as absent as well: the rolling kernels guard
/// every division, so a non-finite value can only mean "no usable
/// observation".
#[inline]
#[must_use]
pub fn is_present(x: f64) -> bool {
    x.is_finite()
}

/// Returns true if the cell is the absent sentinel.
#[inline]
#[must_use]
pub fn is_absent(x: f64) -> bool {
    !x.is_finite()
}
