//! Strongly-typed research configuration.
//!
//! Every field carries a serde default so a partial YAML file (or none at
//! all) yields a runnable configuration. Validation is separate from
//! deserialization: [`ResearchConfig::validate`] checks the cross-field
//! domain rules after loading.

use std::collections::BTreeMap;

use ronda_traits::{Result, RondaError};
use serde::{Deserialize, Serialize};

/// The root configuration for a research run.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ResearchConfig {
    /// Per-factor overrides keyed by registry name. A factor absent from
    /// this map runs with its registry defaults; listing a factor lets you
    /// disable it or override its window parameters.
    #[serde(default)]
    pub factors: BTreeMap<String, FactorSettings>,

    #[serde(default)]
    pub preprocessing: PreprocessingConfig,

    #[serde(default)]
    pub ic: IcConfig,

    #[serde(default)]
    pub fusion: FusionConfig,

    #[serde(default)]
    pub engine: EngineConfig,
}

/// Enable flag plus free-form numeric parameter overrides for one factor.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FactorSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Window-style overrides (`window`, `fast`, `slow`, `signal`, ...).
    /// Unknown keys are rejected at registry time, not here.
    #[serde(default, flatten)]
    pub params: BTreeMap<String, f64>,
}

impl Default for FactorSettings {
    fn default() -> Self {
        Self { enabled: true, params: BTreeMap::new() }
    }
}

/// Cross-sectional preprocessing: forward-fill, winsorize, z-score.
/// The order is fixed; each step can be switched off independently.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PreprocessingConfig {
    #[serde(default)]
    pub forward_fill: ForwardFillConfig,
    #[serde(default)]
    pub winsorize: WinsorizeConfig,
    #[serde(default)]
    pub zscore: ZscoreConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ForwardFillConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Maximum gap, in calendar days, a value may be carried forward.
    #[serde(default = "default_max_gap_days")]
    pub max_gap_days: i64,
}

impl Default for ForwardFillConfig {
    fn default() -> Self {
        Self { enabled: true, max_gap_days: default_max_gap_days() }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WinsorizeConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_winsor_lower")]
    pub lower: f64,
    #[serde(default = "default_winsor_upper")]
    pub upper: f64,
}

impl Default for WinsorizeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            lower: default_winsor_lower(),
            upper: default_winsor_upper(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ZscoreConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for ZscoreConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Information-coefficient engine parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IcConfig {
    /// Forward-return horizon in trading days.
    #[serde(default = "default_horizon")]
    pub horizon: usize,
    /// Minimum usable pairs for a per-date IC to be defined.
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,
    /// Rolling window for the rolling IC mean/std series.
    #[serde(default = "default_rolling_window")]
    pub rolling_window: usize,
}

impl Default for IcConfig {
    fn default() -> Self {
        Self {
            horizon: default_horizon(),
            min_samples: default_min_samples(),
            rolling_window: default_rolling_window(),
        }
    }
}

/// Which fusion strategy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionMethod {
    EqualWeight,
    IcWeight,
    ModelWeight,
}

impl FusionMethod {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EqualWeight => "equal_weight",
            Self::IcWeight => "ic_weight",
            Self::ModelWeight => "model_weight",
        }
    }
}

/// Fusion engine parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FusionConfig {
    /// Strategies to run, in order.
    #[serde(default = "default_methods")]
    pub methods: Vec<FusionMethod>,
    /// Trailing IC observations used when recomputing IC weights.
    #[serde(default = "default_lookback")]
    pub lookback: usize,
    /// IC weights are held constant for this many dates between refits.
    #[serde(default = "default_rebalance")]
    pub rebalance: usize,
    /// Chronological train fraction for the learned model.
    #[serde(default = "default_train_split")]
    pub train_split: f64,
    /// Minimum fully-observed training rows before the model is fit.
    #[serde(default = "default_min_train_rows")]
    pub min_train_rows: usize,
    #[serde(default)]
    pub model: ModelConfig,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            methods: default_methods(),
            lookback: default_lookback(),
            rebalance: default_rebalance(),
            train_split: default_train_split(),
            min_train_rows: default_min_train_rows(),
            model: ModelConfig::default(),
        }
    }
}

/// Random-forest hyperparameters for the learned fusion model.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelConfig {
    #[serde(default = "default_n_trees")]
    pub n_trees: usize,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            n_trees: default_n_trees(),
            max_depth: default_max_depth(),
            seed: default_seed(),
        }
    }
}

/// Execution-level knobs.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Compute factors and per-date statistics in parallel. Results are
    /// identical to sequential execution either way.
    #[serde(default = "default_true")]
    pub parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl ResearchConfig {
    /// Whether a factor should run. Factors not mentioned in the
    /// configuration are enabled with their registry defaults.
    #[must_use]
    pub fn factor_enabled(&self, name: &str) -> bool {
        self.factors.get(name).map_or(true, |s| s.enabled)
    }

    /// Parameter overrides for a factor, if any were configured.
    #[must_use]
    pub fn factor_params(&self, name: &str) -> Option<&BTreeMap<String, f64>> {
        self.factors.get(name).map(|s| &s.params)
    }

    /// Checks cross-field domain rules. Runs after deserialization so a
    /// bad file fails loudly before any computation starts.
    pub fn validate(&self) -> Result<()> {
        let w = &self.preprocessing.winsorize;
        if !(0.0..1.0).contains(&w.lower) || !(0.0..=1.0).contains(&w.upper) || w.lower >= w.upper {
            return Err(RondaError::Config(format!(
                "winsorize quantiles must satisfy 0 <= lower < upper <= 1, got ({}, {})",
                w.lower, w.upper
            )));
        }
        if self.preprocessing.forward_fill.max_gap_days < 0 {
            return Err(RondaError::Config(
                "forward_fill.max_gap_days must be non-negative".to_string(),
            ));
        }
        if self.ic.horizon == 0 {
            return Err(RondaError::Config("ic.horizon must be at least 1".to_string()));
        }
        if self.ic.min_samples < 2 {
            return Err(RondaError::Config("ic.min_samples must be at least 2".to_string()));
        }
        if self.ic.rolling_window < 2 {
            return Err(RondaError::Config("ic.rolling_window must be at least 2".to_string()));
        }
        if self.fusion.lookback == 0 || self.fusion.rebalance == 0 {
            return Err(RondaError::Config(
                "fusion.lookback and fusion.rebalance must be at least 1".to_string(),
            ));
        }
        if !(self.fusion.train_split > 0.0 && self.fusion.train_split < 1.0) {
            return Err(RondaError::Config(format!(
                "fusion.train_split must be in (0, 1), got {}",
                self.fusion.train_split
            )));
        }
        if self.fusion.model.n_trees == 0 || self.fusion.model.max_depth == 0 {
            return Err(RondaError::Config(
                "fusion.model.n_trees and max_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_max_gap_days() -> i64 {
    5
}

fn default_winsor_lower() -> f64 {
    0.01
}

fn default_winsor_upper() -> f64 {
    0.99
}

fn default_horizon() -> usize {
    1
}

fn default_min_samples() -> usize {
    2
}

fn default_rolling_window() -> usize {
    60
}

fn default_methods() -> Vec<FusionMethod> {
    vec![FusionMethod::EqualWeight, FusionMethod::IcWeight, FusionMethod::ModelWeight]
}

fn default_lookback() -> usize {
    252
}

fn default_rebalance() -> usize {
    21
}

fn default_train_split() -> f64 {
    0.7
}

fn default_min_train_rows() -> usize {
    100
}

fn default_n_trees() -> usize {
    100
}

fn default_max_depth() -> usize {
    6
}

fn default_seed() -> u64 {
    42
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = ResearchConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.ic.horizon, 1);
        assert_eq!(cfg.ic.min_samples, 2);
        assert_eq!(cfg.fusion.lookback, 252);
        assert_eq!(cfg.fusion.rebalance, 21);
        assert!(cfg.engine.parallel);
    }

    #[test]
    fn test_unlisted_factor_is_enabled() {
        let cfg = ResearchConfig::default();
        assert!(cfg.factor_enabled("momentum"));
        assert!(cfg.factor_params("momentum").is_none());
    }

    #[test]
    fn test_disabled_factor() {
        let mut cfg = ResearchConfig::default();
        cfg.factors.insert(
            "rsi".to_string(),
            FactorSettings { enabled: false, params: BTreeMap::new() },
        );
        assert!(!cfg.factor_enabled("rsi"));
        assert!(cfg.factor_enabled("momentum"));
    }

    #[test]
    fn test_validate_rejects_bad_quantiles() {
        let mut cfg = ResearchConfig::default();
        cfg.preprocessing.winsorize.lower = 0.6;
        cfg.preprocessing.winsorize.upper = 0.4;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_split() {
        let mut cfg = ResearchConfig::default();
        cfg.fusion.train_split = 1.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_small_min_samples() {
        let mut cfg = ResearchConfig::default();
        cfg.ic.min_samples = 1;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_yaml_round_trip_of_method_names() {
        assert_eq!(FusionMethod::EqualWeight.as_str(), "equal_weight");
        assert_eq!(FusionMethod::IcWeight.as_str(), "ic_weight");
        assert_eq!(FusionMethod::ModelWeight.as_str(), "model_weight");
    }
}
