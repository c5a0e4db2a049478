//! The IC engine: evaluates a set of factor panels against forward
//! returns and assembles the cross-factor report.

use std::collections::BTreeMap;

use ndarray::Array2;
use rayon::prelude::*;
use ronda_config::ResearchConfig;
use ronda_traits::stats::pearson;
use ronda_traits::{absent, Panel, Result};
use tracing::{debug, info};

use crate::forward::forward_returns;
use crate::ic::{ic_series, IcSeries};
use crate::metrics::{rolling_ic, IcSummary};

/// The full evaluation report for a set of factors.
#[derive(Debug, Clone)]
pub struct IcReport {
    /// Per-factor IC series, keyed by factor name.
    pub series: BTreeMap<String, IcSeries>,
    /// Per-factor summaries. All-absent factors keep their (empty)
    /// summary here but are excluded from the correlation matrix.
    pub summaries: BTreeMap<String, IcSummary>,
    /// Rolling IC mean per factor, same window for all.
    pub rolling_mean: BTreeMap<String, Vec<f64>>,
    /// Factor names indexing the correlation matrix, sorted.
    pub correlation_factors: Vec<String>,
    /// Pearson correlation between IC series over their common defined
    /// dates. Fewer than 2 overlapping dates yields an absent entry.
    pub correlation: Array2<f64>,
}

impl IcReport {
    /// The summary for one factor, if it was evaluated.
    #[must_use]
    pub fn summary(&self, factor: &str) -> Option<&IcSummary> {
        self.summaries.get(factor)
    }

    /// Factors whose IC series has at least one defined value.
    #[must_use]
    pub fn usable_factors(&self) -> Vec<String> {
        self.series
            .iter()
            .filter(|(_, s)| !s.is_all_absent())
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// Evaluates every factor panel against forward returns derived from the
/// close panel.
pub fn evaluate_factors(
    cfg: &ResearchConfig,
    factors: &BTreeMap<String, Panel>,
    close: &Panel,
) -> Result<IcReport> {
    let forward = forward_returns(close, cfg.ic.horizon)?;
    info!(
        n_factors = factors.len(),
        horizon = cfg.ic.horizon,
        "evaluating information coefficients"
    );

    let entries: Vec<(&String, &Panel)> = factors.iter().collect();
    let computed: Vec<Result<IcSeries>> = if cfg.engine.parallel {
        entries
            .par_iter()
            .map(|(name, panel)| ic_series(name, panel, &forward, cfg.ic.min_samples))
            .collect()
    } else {
        entries
            .iter()
            .map(|(name, panel)| ic_series(name, panel, &forward, cfg.ic.min_samples))
            .collect()
    };

    let mut series = BTreeMap::new();
    for result in computed {
        let s = result?;
        series.insert(s.factor.clone(), s);
    }

    let mut summaries = BTreeMap::new();
    let mut rolling_means = BTreeMap::new();
    let min_periods = (cfg.ic.rolling_window / 2).max(1);
    for (name, s) in &series {
        if s.is_all_absent() {
            debug!(factor = %name, "IC series is entirely absent");
        }
        summaries.insert(name.clone(), IcSummary::from_series(s));
        let (mean, _) = rolling_ic(s, cfg.ic.rolling_window, min_periods);
        rolling_means.insert(name.clone(), mean);
    }

    let correlation_factors: Vec<String> = series
        .iter()
        .filter(|(_, s)| !s.is_all_absent())
        .map(|(name, _)| name.clone())
        .collect();
    let correlation = correlation_matrix(&series, &correlation_factors);

    Ok(IcReport {
        series,
        summaries,
        rolling_mean: rolling_means,
        correlation_factors,
        correlation,
    })
}

fn correlation_matrix(
    series: &BTreeMap<String, IcSeries>,
    factors: &[String],
) -> Array2<f64> {
    let n = factors.len();
    let mut matrix = Array2::from_elem((n, n), absent());
    for (i, a) in factors.iter().enumerate() {
        for (k, b) in factors.iter().enumerate().skip(i) {
            let v = if i == k {
                1.0
            } else {
                pearson(&series[a].values, &series[b].values)
            };
            matrix[[i, k]] = v;
            matrix[[k, i]] = v;
        }
    }
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use ronda_traits::is_absent;

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

    fn close(n_dates: usize, n_inst: usize) -> Panel {
        // instrument j grows at rate proportional to j, so higher j
        // always has the higher forward return
        panel(n_dates, n_inst, |t, j| {
            100.0 * (1.0 + 0.01 * j as f64).powi(t as i32)
        })
    }

    #[test]
    fn test_predictive_factor_reports_positive_ic() {
        let cfg = ResearchConfig::default();
        let close = close(10, 3);
        let factor = panel(10, 3, |_, j| j as f64);
        let factors = BTreeMap::from([("f".to_string(), factor)]);
        let report = evaluate_factors(&cfg, &factors, &close).unwrap();
        let summary = report.summary("f").unwrap();
        assert_relative_eq!(summary.mean_ic, 1.0, epsilon = 1e-12);
        assert_relative_eq!(summary.win_rate, 1.0);
        assert_eq!(summary.n_observations, 9); // last date has no forward return
    }

    #[test]
    fn test_correlation_matrix_symmetry() {
        let cfg = ResearchConfig::default();
        let close = close(12, 4);
        let f1 = panel(12, 4, |t, j| j as f64 + 0.1 * t as f64);
        let f2 = panel(12, 4, |t, j| -(j as f64) + 0.05 * t as f64);
        let factors =
            BTreeMap::from([("a".to_string(), f1), ("b".to_string(), f2)]);
        let report = evaluate_factors(&cfg, &factors, &close).unwrap();
        assert_eq!(report.correlation_factors, vec!["a", "b"]);
        assert_relative_eq!(report.correlation[[0, 0]], 1.0);
        assert_relative_eq!(report.correlation[[1, 1]], 1.0);
        assert_relative_eq!(
            report.correlation[[0, 1]],
            report.correlation[[1, 0]]
        );
    }

    #[test]
    fn test_all_absent_factor_excluded_from_correlation() {
        let cfg = ResearchConfig::default();
        let close = close(10, 3);
        let good = panel(10, 3, |_, j| j as f64);
        let dead = panel(10, 3, |_, _| ronda_traits::absent());
        let factors =
            BTreeMap::from([("good".to_string(), good), ("dead".to_string(), dead)]);
        let report = evaluate_factors(&cfg, &factors, &close).unwrap();
        assert_eq!(report.correlation_factors, vec!["good"]);
        assert!(report.summaries["dead"].is_empty());
        assert_eq!(report.usable_factors(), vec!["good"]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let close = close(15, 4);
        let f1 = panel(15, 4, |t, j| j as f64 * (1.0 + t as f64));
        let factors = BTreeMap::from([("f".to_string(), f1)]);

        let mut cfg = ResearchConfig::default();
        cfg.engine.parallel = true;
        let par = evaluate_factors(&cfg, &factors, &close).unwrap();
        cfg.engine.parallel = false;
        let seq = evaluate_factors(&cfg, &factors, &close).unwrap();

        for (a, b) in par.series["f"].values.iter().zip(seq.series["f"].values.iter()) {
            assert!((a.is_nan() && b.is_nan()) || a == b);
        }
    }

    #[test]
    fn test_constant_ic_correlation_is_absent() {
        // two perfectly predictive factors have constant IC series, so
        // their IC correlation is undefined rather than 1
        let cfg = ResearchConfig::default();
        let close = close(8, 3);
        let f1 = panel(8, 3, |_, j| j as f64);
        let f2 = panel(8, 3, |_, j| 2.0 * j as f64);
        let factors =
            BTreeMap::from([("a".to_string(), f1), ("b".to_string(), f2)]);
        let report = evaluate_factors(&cfg, &factors, &close).unwrap();
        assert!(is_absent(report.correlation[[0, 1]]));
    }
}
