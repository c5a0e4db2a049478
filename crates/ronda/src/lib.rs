//! ronda: a cross-sectional factor research pipeline.
//!
//! The workspace splits into focused crates; this umbrella re-exports
//! the pieces and adds the end-to-end [`pipeline`]:
//!
//! - `ronda-traits`: the [`Panel`] type, absent-value handling, errors,
//!   and statistics.
//! - `ronda-config`: the YAML-backed [`ResearchConfig`].
//! - `ronda-factors`: the factor library and preprocessing.
//! - `ronda-eval`: forward returns and information coefficients.
//! - `ronda-fuse`: composite fusion strategies.

#![forbid(unsafe_code)]

pub mod pipeline;

pub use ronda_config::{load_config, FactorSettings, FusionMethod, ResearchConfig};
pub use ronda_eval::{evaluate_factors, forward_returns, IcReport, IcSummary};
pub use ronda_factors::{all_factors, compute_factors, FactorEngineReport, UnitOutcome};
pub use ronda_fuse::{FusionOutcome, WeightVector};
pub use ronda_traits::{absent, is_absent, is_present, Date, OhlcvPanels, Panel, Result, RondaError};

pub use pipeline::{run, PipelineReport, RunSummary};
