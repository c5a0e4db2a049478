//! Information-coefficient evaluation for the ronda pipeline.
//!
//! [`forward`] produces horizon returns, [`ic`] the per-date rank
//! correlation between a factor cross-section and those returns,
//! [`metrics`] the summary statistics over an IC series, and [`engine`]
//! the multi-factor report with the cross-factor correlation matrix.

#![forbid(unsafe_code)]

pub mod engine;
pub mod forward;
pub mod ic;
pub mod metrics;

pub use engine::{evaluate_factors, IcReport};
pub use forward::forward_returns;
pub use ic::{ic_series, IcSeries};
pub use metrics::{rolling_ic, IcSummary};
