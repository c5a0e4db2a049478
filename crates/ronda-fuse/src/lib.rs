//! Fusion strategies for combining standardized factor panels into one
//! composite signal.
//!
//! Every strategy implements [`FusionStrategy`]: given the standardized
//! panels, the IC report, and forward returns, it produces a composite
//! panel and the weights behind it. Composite cells always renormalize
//! over the constituents actually present at that cell, so missing data
//! shrinks the divisor instead of dragging the signal toward zero.

#![forbid(unsafe_code)]

pub mod equal_weight;
pub mod ic_weight;
pub mod model_weight;
pub mod strategy;
pub mod weights;

pub use equal_weight::EqualWeight;
pub use ic_weight::IcWeight;
pub use model_weight::ModelWeight;
pub use strategy::{run_strategy, FusionInputs, FusionOutcome, FusionStrategy};
pub use weights::WeightVector;
