//! Core types for the ronda factor-research pipeline.
//!
//! This crate provides the foundational pieces shared by every other ronda
//! crate: the [`Panel`] data structure (a date × instrument matrix with an
//! explicit absent-value sentinel), the [`RondaError`] error type, and the
//! statistical helpers used for cross-sectional work.

#![forbid(unsafe_code)]

/// The version of the ronda-traits crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod absent;
pub mod error;
pub mod panel;
pub mod stats;

pub use absent::{absent, is_absent, is_present};
pub use error::{Result, RondaError};
pub use panel::{OhlcvPanels, Panel};

// Re-export date type from chrono
pub use chrono::NaiveDate as Date;

/// An instrument identifier (ticker or exchange code).
pub type Instrument = String;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }
}
