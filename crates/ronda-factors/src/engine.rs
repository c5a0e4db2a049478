//! The factor engine: runs the enabled factor set over one OHLCV panel
//! collection with per-factor error isolation.
//!
//! A factor that fails records its error and leaves every other factor
//! untouched. Parallel and sequential execution produce identical
//! results; the parallel path only changes wall-clock time.

use std::collections::BTreeMap;

use rayon::prelude::*;
use ronda_config::ResearchConfig;
use ronda_traits::{OhlcvPanels, Panel, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::preprocess::preprocess;
use crate::registry::{all_factors, FactorDef};

/// Outcome of one factor (or, downstream, one fusion strategy).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum UnitOutcome {
    /// Computed and produced at least one present value.
    Succeeded,
    /// Computed but every cell is absent (warm-up longer than the sample,
    /// degenerate inputs). Not an error, but excluded downstream.
    AllAbsent,
    /// The computation itself failed.
    Failed(String),
}

impl UnitOutcome {
    #[must_use]
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// Everything the factor engine hands downstream: raw panels,
/// standardized panels, and the per-factor outcomes.
#[derive(Debug, Clone)]
pub struct FactorEngineReport {
    /// Raw factor panels, keyed by factor name. Only usable factors.
    pub raw: BTreeMap<String, Panel>,
    /// Preprocessed (forward-filled, winsorized, z-scored) panels.
    pub standardized: BTreeMap<String, Panel>,
    /// Outcome for every enabled factor, usable or not.
    pub outcomes: BTreeMap<String, UnitOutcome>,
}

impl FactorEngineReport {
    /// Names of factors that produced usable output, in registry order
    /// intersected with the standardized map's ordering.
    #[must_use]
    pub fn usable_factors(&self) -> Vec<String> {
        self.standardized.keys().cloned().collect()
    }
}

/// Computes every enabled factor over the validated OHLCV panels and
/// applies the preprocessing pipeline to each result.
pub fn compute_factors(cfg: &ResearchConfig, data: &OhlcvPanels) -> Result<FactorEngineReport> {
    data.validate()?;
    cfg.validate()?;

    let enabled: Vec<FactorDef> = all_factors()
        .into_iter()
        .filter(|def| cfg.factor_enabled(def.name))
        .collect();
    info!(n_factors = enabled.len(), parallel = cfg.engine.parallel, "computing factors");

    let results: Vec<(String, std::result::Result<Panel, String>)> = if cfg.engine.parallel {
        enabled
            .par_iter()
            .map(|def| (def.name.to_string(), run_one(def, cfg, data)))
            .collect()
    } else {
        enabled
            .iter()
            .map(|def| (def.name.to_string(), run_one(def, cfg, data)))
            .collect()
    };

    let mut raw = BTreeMap::new();
    let mut standardized = BTreeMap::new();
    let mut outcomes = BTreeMap::new();

    for (name, result) in results {
        match result {
            Ok(panel) => {
                if panel.present_count() == 0 {
                    debug!(factor = %name, "factor produced no observations");
                    outcomes.insert(name, UnitOutcome::AllAbsent);
                    continue;
                }
                let std_panel = preprocess(&panel, &cfg.preprocessing);
                raw.insert(name.clone(), panel);
                standardized.insert(name.clone(), std_panel);
                outcomes.insert(name, UnitOutcome::Succeeded);
            }
            Err(reason) => {
                warn!(factor = %name, %reason, "factor computation failed");
                outcomes.insert(name, UnitOutcome::Failed(reason));
            }
        }
    }

    info!(
        succeeded = raw.len(),
        total = outcomes.len(),
        "factor computation finished"
    );
    Ok(FactorEngineReport { raw, standardized, outcomes })
}

fn run_one(
    def: &FactorDef,
    cfg: &ResearchConfig,
    data: &OhlcvPanels,
) -> std::result::Result<Panel, String> {
    let params = def
        .params(cfg.factor_params(def.name))
        .map_err(|e| e.to_string())?;
    (def.compute)(data, &params).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ndarray::Array2;
    use ronda_config::FactorSettings;

    fn sample_data(n_dates: usize) -> OhlcvPanels {
        let dates: Vec<_> = (0..n_dates)
            .map(|i| {
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(i as u64)
            })
            .collect();
        let instruments = vec!["AAA".to_string(), "BBB".to_string()];
        let mk = |f: &dyn Fn(usize, usize) -> f64| {
            let mut values = Array2::zeros((n_dates, 2));
            for t in 0..n_dates {
                for j in 0..2 {
                    values[[t, j]] = f(t, j);
                }
            }
            Panel::new(dates.clone(), instruments.clone(), values).unwrap()
        };
        OhlcvPanels {
            open: mk(&|t, j| 100.0 + t as f64 + j as f64),
            high: mk(&|t, j| 101.5 + t as f64 + j as f64),
            low: mk(&|t, j| 99.0 + t as f64 + j as f64),
            close: mk(&|t, j| 100.0 + t as f64 * (1.0 + j as f64 * 0.1)),
            volume: mk(&|t, _| 1000.0 + t as f64),
        }
    }

    #[test]
    fn test_engine_runs_all_enabled() {
        let cfg = ResearchConfig::default();
        let data = sample_data(60);
        let report = compute_factors(&cfg, &data).unwrap();
        assert_eq!(report.outcomes.len(), all_factors().len());
        assert!(report.outcomes.values().any(UnitOutcome::is_usable));
        // every usable factor has both a raw and a standardized panel
        for name in report.usable_factors() {
            assert!(report.raw.contains_key(&name));
        }
    }

    #[test]
    fn test_disabled_factor_is_skipped() {
        let mut cfg = ResearchConfig::default();
        cfg.factors.insert(
            "momentum".to_string(),
            FactorSettings { enabled: false, params: Default::default() },
        );
        let data = sample_data(60);
        let report = compute_factors(&cfg, &data).unwrap();
        assert!(!report.outcomes.contains_key("momentum"));
        assert!(report.outcomes.contains_key("rsi"));
    }

    #[test]
    fn test_bad_override_isolates_failure() {
        let mut cfg = ResearchConfig::default();
        cfg.factors.insert(
            "momentum".to_string(),
            FactorSettings {
                enabled: true,
                params: std::collections::BTreeMap::from([("bogus".to_string(), 1.0)]),
            },
        );
        let data = sample_data(60);
        let report = compute_factors(&cfg, &data).unwrap();
        assert!(matches!(
            report.outcomes.get("momentum"),
            Some(UnitOutcome::Failed(_))
        ));
        assert!(matches!(
            report.outcomes.get("rsi"),
            Some(UnitOutcome::Succeeded)
        ));
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let data = sample_data(80);
        let mut cfg = ResearchConfig::default();
        cfg.engine.parallel = true;
        let par = compute_factors(&cfg, &data).unwrap();
        cfg.engine.parallel = false;
        let seq = compute_factors(&cfg, &data).unwrap();

        assert_eq!(par.outcomes, seq.outcomes);
        for (name, p) in &par.standardized {
            let s = &seq.standardized[name];
            for t in 0..p.n_dates() {
                for j in 0..p.n_instruments() {
                    let a = p.get(t, j);
                    let b = s.get(t, j);
                    assert!(
                        (a.is_nan() && b.is_nan()) || a == b,
                        "{name} differs at ({t}, {j})"
                    );
                }
            }
        }
    }

    #[test]
    fn test_short_sample_yields_all_absent() {
        // 5 dates is shorter than every default warm-up except the
        // pattern factors
        let cfg = ResearchConfig::default();
        let data = sample_data(5);
        let report = compute_factors(&cfg, &data).unwrap();
        assert!(matches!(
            report.outcomes.get("momentum"),
            Some(UnitOutcome::AllAbsent)
        ));
    }
}
