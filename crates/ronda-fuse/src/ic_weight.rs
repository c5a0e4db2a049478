//! IC-weighted fusion.
//!
//! Weights are proportional to the absolute mean IC of each factor over
//! a trailing lookback window, recomputed every `rebalance` dates and
//! held constant in between. The trailing window for weights applied at
//! date `t` ends at `t - horizon`: an IC at date `s` depends on returns
//! realized through `s + horizon`, so nothing later may inform `t`.

use std::collections::BTreeMap;

use ronda_traits::stats::mean_present;
use ronda_traits::{is_present, Result};
use tracing::debug;

use crate::strategy::{standardize_rows, weighted_composite, FusionInputs, FusionOutcome, FusionStrategy};
use crate::weights::WeightVector;

/// Piecewise-constant IC-magnitude weighting with an equal-weight
/// fallback for blocks without usable IC history.
#[derive(Debug, Clone, Copy, Default)]
pub struct IcWeight;

impl FusionStrategy for IcWeight {
    fn name(&self) -> &'static str {
        "ic_weight"
    }

    fn fuse(&self, inputs: &FusionInputs<'_>) -> Result<FusionOutcome> {
        let factors = inputs.eligible_factors();
        let template = inputs.template()?;
        let n_dates = template.n_dates();
        let rebalance = inputs.cfg.fusion.rebalance;
        let lookback = inputs.cfg.fusion.lookback;
        let horizon = inputs.cfg.ic.horizon;

        let mut blocks: Vec<WeightVector> = Vec::new();
        let mut fallbacks = 0usize;
        let mut start = 0usize;
        while start < n_dates {
            let (weights, fell_back) =
                block_weights(inputs, &factors, start, lookback, horizon)?;
            if fell_back {
                fallbacks += 1;
            }
            blocks.push(weights);
            start += rebalance;
        }
        debug!(
            blocks = blocks.len(),
            fallbacks, "computed IC weight schedule"
        );

        let composite = weighted_composite(
            inputs.standardized,
            &factors,
            template,
            |t, name| blocks[t / rebalance].get(name),
        )?;

        let all_fell_back = fallbacks == blocks.len();
        let weights = blocks
            .pop()
            .unwrap_or(WeightVector::equal(&factors)?);
        Ok(FusionOutcome {
            strategy: self.name().to_string(),
            composite: standardize_rows(&composite),
            weights,
            fell_back: all_fell_back,
        })
    }
}

/// Weights for the block starting at date index `start`. Falls back to
/// equal weight when no factor has a defined trailing mean IC or all
/// magnitudes vanish.
fn block_weights(
    inputs: &FusionInputs<'_>,
    factors: &[String],
    start: usize,
    lookback: usize,
    horizon: usize,
) -> Result<(WeightVector, bool)> {
    let Some(cutoff) = start.checked_sub(horizon) else {
        return Ok((WeightVector::equal(factors)?, true));
    };
    if cutoff == 0 {
        return Ok((WeightVector::equal(factors)?, true));
    }

    let mut magnitudes = BTreeMap::new();
    for name in factors {
        let Some(series) = inputs.ic.series.get(name) else {
            continue;
        };
        let end = cutoff.min(series.values.len());
        let begin = end.saturating_sub(lookback);
        let mean = mean_present(&series.values[begin..end]);
        if is_present(mean) {
            magnitudes.insert(name.clone(), mean.abs());
        }
    }

    match WeightVector::from_magnitudes(magnitudes) {
        Ok(w) => Ok((w, false)),
        Err(_) => Ok((WeightVector::equal(factors)?, true)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use ndarray::Array2;
    use ronda_config::ResearchConfig;
    use ronda_eval::evaluate_factors;
    use ronda_traits::Panel;

    fn panel(n_dates: usize, n_inst: usize, f: impl Fn(usize, usize) -> f64) -> Panel {
        let dates: Vec<_> = (0..n_dates)
            .map(|i| {
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(i as u64)
            })
            .collect();
        let instruments: Vec<String> = (0..n_inst).map(|i| format!("I{i}")).collect();
        let mut values = Array2::zeros((n_dates, n_inst));
        for t in 0..n_dates {
            for j in 0..n_inst {
                values[[t, j]] = f(t, j);
            }
        }
        Panel::new(dates, instruments, values).unwrap()
    }

    struct Fixture {
        standardized: std::collections::BTreeMap<String, Panel>,
        ic: ronda_eval::IcReport,
        forward: Panel,
        cfg: ResearchConfig,
    }

    fn fixture(n_dates: usize, noisy: bool, cfg: ResearchConfig) -> Fixture {
        // instrument ordering by forward return follows j
        let close = panel(n_dates, 4, |t, j| {
            100.0 * (1.0 + 0.01 * j as f64).powi(t as i32)
        });
        // `good` ranks instruments correctly; `noise` alternates sign
        let good = panel(n_dates, 4, |_, j| j as f64);
        let noise = panel(n_dates, 4, |t, j| {
            if noisy && t % 2 == 0 {
                -(j as f64)
            } else {
                j as f64
            }
        });
        let standardized = std::collections::BTreeMap::from([
            ("good".to_string(), good),
            ("noise".to_string(), noise),
        ]);
        let ic = evaluate_factors(&cfg, &standardized, &close).unwrap();
        let forward = ronda_eval::forward_returns(&close, cfg.ic.horizon).unwrap();
        Fixture { standardized, ic, forward, cfg }
    }

    #[test]
    fn test_ic_weight_prefers_predictive_factor() {
        let mut cfg = ResearchConfig::default();
        cfg.fusion.rebalance = 5;
        cfg.fusion.lookback = 20;
        let fx = fixture(30, true, cfg);
        let inputs = FusionInputs {
            standardized: &fx.standardized,
            ic: &fx.ic,
            forward: &fx.forward,
            cfg: &fx.cfg,
        };
        let outcome = IcWeight.fuse(&inputs).unwrap();
        assert!(!outcome.fell_back);
        assert_relative_eq!(outcome.weights.abs_sum(), 1.0, epsilon = 1e-12);
        // the consistent factor carries |mean IC| = 1, the alternating
        // one nets out near zero
        assert!(outcome.weights.get("good") > outcome.weights.get("noise"));
    }

    #[test]
    fn test_warm_up_blocks_fall_back() {
        let mut cfg = ResearchConfig::default();
        cfg.fusion.rebalance = 50;
        let fx = fixture(30, false, cfg);
        let inputs = FusionInputs {
            standardized: &fx.standardized,
            ic: &fx.ic,
            forward: &fx.forward,
            cfg: &fx.cfg,
        };
        // single block starting at t = 0 has no prior IC history
        let outcome = IcWeight.fuse(&inputs).unwrap();
        assert!(outcome.fell_back);
        assert_relative_eq!(
            outcome.weights.get("good"),
            0.5,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_fallback_matches_equal_weight_composite() {
        let mut cfg = ResearchConfig::default();
        cfg.fusion.rebalance = 50; // one warm-up block, guaranteed fallback
        let fx = fixture(20, false, cfg);
        let inputs = FusionInputs {
            standardized: &fx.standardized,
            ic: &fx.ic,
            forward: &fx.forward,
            cfg: &fx.cfg,
        };
        let ic_outcome = IcWeight.fuse(&inputs).unwrap();
        let eq_outcome = crate::EqualWeight.fuse(&inputs).unwrap();
        for t in 0..ic_outcome.composite.n_dates() {
            for j in 0..ic_outcome.composite.n_instruments() {
                let a = ic_outcome.composite.get(t, j);
                let b = eq_outcome.composite.get(t, j);
                assert!((a.is_nan() && b.is_nan()) || (a - b).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_weights_are_piecewise_constant() {
        let mut cfg = ResearchConfig::default();
        cfg.fusion.rebalance = 4;
        cfg.fusion.lookback = 10;
        let fx = fixture(24, true, cfg);
        let inputs = FusionInputs {
            standardized: &fx.standardized,
            ic: &fx.ic,
            forward: &fx.forward,
            cfg: &fx.cfg,
        };
        // exercising fuse twice must give identical output (pure function)
        let once = IcWeight.fuse(&inputs).unwrap();
        let twice = IcWeight.fuse(&inputs).unwrap();
        assert_eq!(once.weights, twice.weights);
    }
}
