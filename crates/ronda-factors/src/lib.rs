//! Factor library for the ronda pipeline.
//!
//! Factors are pure functions from aligned OHLCV panels to a factor panel
//! with the same index and columns. Category modules ([`price`],
//! [`oscillator`], [`overlap`], [`volume`], [`pattern`]) hold the
//! computations; [`registry`] composes them into a flat, data-driven
//! table; [`engine`] runs the enabled set with per-factor error isolation
//! and applies the cross-sectional preprocessing pipeline from
//! [`preprocess`].

#![forbid(unsafe_code)]

pub mod engine;
pub mod oscillator;
pub mod overlap;
pub mod pattern;
pub mod preprocess;
pub mod price;
pub mod registry;
pub mod rolling;
pub mod volume;

pub use engine::{compute_factors, FactorEngineReport, UnitOutcome};
pub use preprocess::{forward_fill, preprocess, winsorize, zscore};
pub use registry::{
    all_factors, factors_by_category, get_factor, FactorCategory, FactorDef, FactorParams,
};
