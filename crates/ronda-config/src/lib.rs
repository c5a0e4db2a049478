//! Research configuration for the ronda pipeline.
//!
//! Configuration is loaded from a YAML file into the immutable
//! [`ResearchConfig`] tree. Missing sections fall back to documented
//! defaults, so `ResearchConfig::default()` is always a runnable setup.

#![forbid(unsafe_code)]

use std::path::Path;

use ronda_traits::{Result, RondaError};

pub mod settings;

pub use settings::{
    EngineConfig, FactorSettings, ForwardFillConfig, FusionConfig, FusionMethod, IcConfig,
    ModelConfig, PreprocessingConfig, ResearchConfig, WinsorizeConfig, ZscoreConfig,
};

/// Loads and validates a research configuration from a YAML file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ResearchConfig> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path.as_ref()))
        .build()
        .map_err(|e| RondaError::Config(e.to_string()))?;

    let cfg = builder
        .try_deserialize::<ResearchConfig>()
        .map_err(|e| RondaError::Config(e.to_string()))?;

    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_file_is_config_error() {
        let err = load_config("/definitely/not/here.yml").unwrap_err();
        assert!(matches!(err, RondaError::Config(_)));
    }
}
