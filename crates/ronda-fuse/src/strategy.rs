//! The fusion strategy seam and shared composite machinery.

use std::collections::BTreeMap;

use ronda_config::ResearchConfig;
use ronda_eval::IcReport;
use ronda_traits::stats::zscore_inplace;
use ronda_traits::{absent, is_present, Panel, Result, RondaError};
use tracing::info;

use crate::weights::WeightVector;

/// Everything a fusion strategy may consult. Strategies never see data
/// beyond what is in here, which keeps them trivially causal given
/// causal inputs.
pub struct FusionInputs<'a> {
    /// Standardized factor panels, keyed by factor name, sharing one
    /// date/instrument index.
    pub standardized: &'a BTreeMap<String, Panel>,
    /// The factor IC report for the same panels.
    pub ic: &'a IcReport,
    /// Forward returns aligned with the panels, for model training.
    pub forward: &'a Panel,
    pub cfg: &'a ResearchConfig,
}

impl FusionInputs<'_> {
    /// Factors eligible for weighting: usable IC series and at least one
    /// present cell. A factor whose IC series is entirely absent carries
    /// no evidence and must not dilute any composite.
    #[must_use]
    pub fn eligible_factors(&self) -> Vec<String> {
        self.standardized
            .iter()
            .filter(|(name, p)| {
                p.present_count() > 0
                    && self
                        .ic
                        .series
                        .get(name.as_str())
                        .is_some_and(|s| !s.is_all_absent())
            })
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// A template panel carrying the shared index, for shaping outputs.
    pub fn template(&self) -> Result<&Panel> {
        self.standardized
            .values()
            .next()
            .ok_or_else(|| RondaError::Fusion("no factor panels to fuse".to_string()))
    }
}

/// What one strategy produced.
#[derive(Debug, Clone)]
pub struct FusionOutcome {
    pub strategy: String,
    /// The composite signal. Built as the per-cell weighted sum with
    /// present-constituent renormalization, then cross-sectionally
    /// standardized; cell-level weight identities hold for the
    /// pre-standardization sum, not for these published values.
    pub composite: Panel,
    /// The weights behind the composite. For piecewise-constant
    /// strategies these are the weights of the final block; for the
    /// learned model, the normalized feature importances.
    pub weights: WeightVector,
    /// True when the strategy could not run as designed and fell back to
    /// equal weighting.
    pub fell_back: bool,
}

/// A method of combining standardized factor panels into one composite.
pub trait FusionStrategy {
    /// Stable identifier, used in configuration and report file names.
    fn name(&self) -> &'static str;

    /// Produces the composite and its weights.
    fn fuse(&self, inputs: &FusionInputs<'_>) -> Result<FusionOutcome>;
}

/// Runs a strategy and logs its outcome.
pub fn run_strategy(
    strategy: &dyn FusionStrategy,
    inputs: &FusionInputs<'_>,
) -> Result<FusionOutcome> {
    let outcome = strategy.fuse(inputs)?;
    info!(
        strategy = strategy.name(),
        n_factors = outcome.weights.len(),
        fell_back = outcome.fell_back,
        "fusion strategy finished"
    );
    Ok(outcome)
}

/// Weighted composite with per-cell renormalization.
///
/// `weight_at(t, factor)` supplies the weight in force at date index `t`.
/// For each cell, only factors with a present value participate; their
/// absolute weights are rescaled to sum to one before the weighted sum.
/// A cell with no present constituent (or all-zero weights) is absent.
pub(crate) fn weighted_composite<F>(
    panels: &BTreeMap<String, Panel>,
    factors: &[String],
    template: &Panel,
    weight_at: F,
) -> Result<Panel>
where
    F: Fn(usize, &str) -> f64,
{
    for name in factors {
        let panel = panels
            .get(name)
            .ok_or_else(|| RondaError::Fusion(format!("missing panel for factor `{name}`")))?;
        panel.require_same_shape(template, "fusion composite")?;
    }

    let mut out = Panel::absent_like(template);
    for t in 0..template.n_dates() {
        for j in 0..template.n_instruments() {
            let mut total_abs = 0.0;
            let mut acc = 0.0;
            for name in factors {
                let v = panels[name].get(t, j);
                let w = weight_at(t, name);
                if is_present(v) && w.abs() > 0.0 {
                    total_abs += w.abs();
                    acc += w * v;
                }
            }
            if total_abs > 0.0 {
                out.set(t, j, acc / total_abs);
            } else {
                out.set(t, j, absent());
            }
        }
    }
    Ok(out)
}

/// Cross-sectionally standardizes each row of a composite, leaving
/// degenerate rows unmodified.
#[must_use]
pub(crate) fn standardize_rows(panel: &Panel) -> Panel {
    let mut out = panel.clone();
    for t in 0..panel.n_dates() {
        let mut row: Vec<f64> = out.row(t).to_vec();
        if zscore_inplace(&mut row) {
            for (j, v) in row.into_iter().enumerate() {
                out.set(t, j, v);
            }
        }
    }
    out
}
