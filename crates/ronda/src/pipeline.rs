//! The end-to-end research pipeline: factors, information coefficients,
//! fusion, and composite validation.
//!
//! Every stage is best-effort per unit: a failing factor or fusion
//! strategy records its outcome and leaves the rest of the run intact.
//! Results are deterministic across repeated runs and across sequential
//! versus parallel execution.

use std::collections::BTreeMap;

use ronda_config::{FusionMethod, ResearchConfig};
use ronda_eval::{evaluate_factors, forward_returns, IcReport, IcSummary};
use ronda_factors::{compute_factors, FactorEngineReport, UnitOutcome};
use ronda_fuse::{
    run_strategy, EqualWeight, FusionInputs, FusionOutcome, FusionStrategy, IcWeight, ModelWeight,
};
use ronda_traits::{is_present, OhlcvPanels, Result};
use serde::Serialize;
use tracing::{info, warn};

/// Everything one pipeline run produced.
#[derive(Debug)]
pub struct PipelineReport {
    /// Factor panels and per-factor outcomes.
    pub factors: FactorEngineReport,
    /// The factor-level IC report.
    pub ic: IcReport,
    /// Successful fusion outcomes, in configured strategy order.
    pub fusion: Vec<FusionOutcome>,
    /// Per-strategy outcomes, including failures.
    pub fusion_outcomes: BTreeMap<String, UnitOutcome>,
    /// IC validation of each composite, re-run through the IC engine.
    pub composite_ic: BTreeMap<String, IcSummary>,
    /// Headline numbers for logging and the run report.
    pub summary: RunSummary,
}

/// Headline numbers for one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub n_dates: usize,
    pub n_instruments: usize,
    pub factors_succeeded: usize,
    pub factors_failed: usize,
    pub strategies_succeeded: usize,
    /// The factor with the highest absolute mean IC, if any IC is defined.
    pub best_factor: Option<String>,
    pub best_factor_mean_ic: Option<f64>,
}

/// Runs the full pipeline over validated OHLCV panels.
pub fn run(cfg: &ResearchConfig, data: &OhlcvPanels) -> Result<PipelineReport> {
    cfg.validate()?;
    data.validate()?;
    info!(
        n_dates = data.close.n_dates(),
        n_instruments = data.close.n_instruments(),
        "starting pipeline run"
    );

    let factors = compute_factors(cfg, data)?;
    let ic = evaluate_factors(cfg, &factors.standardized, &data.close)?;
    let forward = forward_returns(&data.close, cfg.ic.horizon)?;

    let inputs = FusionInputs {
        standardized: &factors.standardized,
        ic: &ic,
        forward: &forward,
        cfg,
    };

    let mut fusion = Vec::new();
    let mut fusion_outcomes = BTreeMap::new();
    for method in &cfg.fusion.methods {
        let strategy: Box<dyn FusionStrategy> = match method {
            FusionMethod::EqualWeight => Box::new(EqualWeight),
            FusionMethod::IcWeight => Box::new(IcWeight),
            FusionMethod::ModelWeight => Box::new(ModelWeight),
        };
        let name = strategy.name().to_string();
        match run_strategy(strategy.as_ref(), &inputs) {
            Ok(outcome) => {
                let usable = outcome.composite.present_count() > 0;
                fusion_outcomes.insert(
                    name,
                    if usable { UnitOutcome::Succeeded } else { UnitOutcome::AllAbsent },
                );
                if usable {
                    fusion.push(outcome);
                }
            }
            Err(e) => {
                warn!(strategy = %name, error = %e, "fusion strategy failed");
                fusion_outcomes.insert(name, UnitOutcome::Failed(e.to_string()));
            }
        }
    }

    // composite signals go back through the IC engine on equal footing
    // with the individual factors
    let composites: BTreeMap<String, ronda_traits::Panel> = fusion
        .iter()
        .map(|o| (o.strategy.clone(), o.composite.clone()))
        .collect();
    let composite_ic = if composites.is_empty() {
        BTreeMap::new()
    } else {
        evaluate_factors(cfg, &composites, &data.close)?.summaries
    };

    let summary = summarize(data, &factors, &ic, &fusion_outcomes);
    info!(
        factors_succeeded = summary.factors_succeeded,
        strategies_succeeded = summary.strategies_succeeded,
        best_factor = summary.best_factor.as_deref().unwrap_or("none"),
        "pipeline run finished"
    );

    Ok(PipelineReport { factors, ic, fusion, fusion_outcomes, composite_ic, summary })
}

fn summarize(
    data: &OhlcvPanels,
    factors: &FactorEngineReport,
    ic: &IcReport,
    fusion_outcomes: &BTreeMap<String, UnitOutcome>,
) -> RunSummary {
    let factors_succeeded = factors
        .outcomes
        .values()
        .filter(|o| o.is_usable())
        .count();
    let factors_failed = factors
        .outcomes
        .values()
        .filter(|o| matches!(o, UnitOutcome::Failed(_)))
        .count();
    let strategies_succeeded = fusion_outcomes
        .values()
        .filter(|o| o.is_usable())
        .count();

    let best = ic
        .summaries
        .iter()
        .filter(|(_, s)| is_present(s.mean_ic))
        .max_by(|(_, a), (_, b)| {
            a.mean_ic
                .abs()
                .partial_cmp(&b.mean_ic.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

    RunSummary {
        n_dates: data.close.n_dates(),
        n_instruments: data.close.n_instruments(),
        factors_succeeded,
        factors_failed,
        strategies_succeeded,
        best_factor: best.map(|(name, _)| name.clone()),
        best_factor_mean_ic: best.map(|(_, s)| s.mean_ic),
    }
}
