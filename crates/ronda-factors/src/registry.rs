//! Factor registry for discovering and running the factor library.
//!
//! Each factor is a [`FactorDef`]: a static name, a category, a default
//! parameter set, and a pure computation function. The engine iterates
//! this table; adding a factor means adding one entry in its category
//! module, with no dispatch code to touch.

use std::collections::BTreeMap;

use ronda_traits::{OhlcvPanels, Panel, Result, RondaError};
use serde::{Deserialize, Serialize};

use crate::{oscillator, overlap, pattern, price, volume};

/// Factor category classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorCategory {
    /// Price-derived level and dispersion factors
    Price,
    /// Bounded momentum oscillators
    Oscillator,
    /// Moving-average style overlap factors
    Overlap,
    /// Volume and range factors
    Volume,
    /// Discrete candlestick patterns
    Pattern,
}

impl FactorCategory {
    /// Get a human-readable description of the category.
    #[must_use]
    pub const fn description(&self) -> &str {
        match self {
            Self::Price => "Returns, dispersion, and liquidity measured from price levels",
            Self::Oscillator => "Bounded oscillators of recent price action",
            Self::Overlap => "Price displacement from moving-average style baselines",
            Self::Volume => "Volume flow and trading-range factors",
            Self::Pattern => "Discrete candlestick pattern flags (-1, 0, +1)",
        }
    }
}

/// Resolved parameters for one factor run: registry defaults merged with
/// configuration overrides.
#[derive(Debug, Clone)]
pub struct FactorParams {
    values: BTreeMap<&'static str, f64>,
}

impl FactorParams {
    pub(crate) fn from_defaults(defaults: &'static [(&'static str, f64)]) -> Self {
        Self { values: defaults.iter().copied().collect() }
    }

    /// Merges configuration overrides. An override for a key the factor
    /// does not declare is a configuration error.
    pub(crate) fn apply_overrides(
        &mut self,
        factor: &str,
        overrides: &BTreeMap<String, f64>,
    ) -> Result<()> {
        for (key, value) in overrides {
            let Some((known, _)) = self.values.iter().find(|(k, _)| **k == key.as_str()) else {
                return Err(RondaError::Config(format!(
                    "factor `{factor}` has no parameter `{key}`"
                )));
            };
            let known = *known;
            self.values.insert(known, *value);
        }
        Ok(())
    }

    /// A window-style parameter, validated to be a positive integer.
    pub fn window(&self, key: &str) -> Result<usize> {
        let v = self.get(key)?;
        if v.fract() != 0.0 || v < 1.0 {
            return Err(RondaError::Config(format!(
                "parameter `{key}` must be a positive integer, got {v}"
            )));
        }
        Ok(v as usize)
    }

    /// A raw float parameter.
    pub fn get(&self, key: &str) -> Result<f64> {
        self.values
            .get(key)
            .copied()
            .ok_or_else(|| RondaError::Config(format!("missing parameter `{key}`")))
    }
}

/// The signature every factor computation satisfies.
pub type FactorFn = fn(&OhlcvPanels, &FactorParams) -> Result<Panel>;

/// Metadata and computation for one factor.
#[derive(Debug, Clone)]
pub struct FactorDef {
    /// Unique identifier for the factor
    pub name: &'static str,

    /// Category classification
    pub category: FactorCategory,

    /// Human-readable description
    pub description: &'static str,

    /// Parameter names with their default values
    pub defaults: &'static [(&'static str, f64)],

    /// The pure computation function
    pub compute: FactorFn,
}

impl FactorDef {
    /// Resolves this factor's parameters, applying any overrides.
    pub fn params(&self, overrides: Option<&BTreeMap<String, f64>>) -> Result<FactorParams> {
        let mut params = FactorParams::from_defaults(self.defaults);
        if let Some(overrides) = overrides {
            params.apply_overrides(self.name, overrides)?;
        }
        Ok(params)
    }
}

/// All factors in the library, in a stable order (category modules in
/// declaration order, factors in module order).
#[must_use]
pub fn all_factors() -> Vec<FactorDef> {
    let mut defs = Vec::new();
    defs.extend(price::defs());
    defs.extend(oscillator::defs());
    defs.extend(overlap::defs());
    defs.extend(volume::defs());
    defs.extend(pattern::defs());
    defs
}

/// Look up a factor by name.
#[must_use]
pub fn get_factor(name: &str) -> Option<FactorDef> {
    all_factors().into_iter().find(|def| def.name == name)
}

/// All factors in a specific category.
#[must_use]
pub fn factors_by_category(category: FactorCategory) -> Vec<FactorDef> {
    all_factors()
        .into_iter()
        .filter(|def| def.category == category)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_names_are_unique() {
        let defs = all_factors();
        let mut names: Vec<_> = defs.iter().map(|d| d.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), defs.len());
    }

    #[test]
    fn test_every_category_is_populated() {
        for category in [
            FactorCategory::Price,
            FactorCategory::Oscillator,
            FactorCategory::Overlap,
            FactorCategory::Volume,
            FactorCategory::Pattern,
        ] {
            assert!(
                !factors_by_category(category).is_empty(),
                "no factors in {category:?}"
            );
        }
    }

    #[test]
    fn test_get_factor() {
        let def = get_factor("momentum").expect("momentum registered");
        assert_eq!(def.category, FactorCategory::Price);
        assert!(get_factor("nonexistent_factor").is_none());
    }

    #[test]
    fn test_params_defaults_and_overrides() {
        let def = get_factor("momentum").unwrap();
        let params = def.params(None).unwrap();
        assert_eq!(params.window("window").unwrap(), 20);

        let overrides = BTreeMap::from([("window".to_string(), 10.0)]);
        let params = def.params(Some(&overrides)).unwrap();
        assert_eq!(params.window("window").unwrap(), 10);
    }

    #[test]
    fn test_unknown_override_is_rejected() {
        let def = get_factor("momentum").unwrap();
        let overrides = BTreeMap::from([("lookahead".to_string(), 3.0)]);
        assert!(def.params(Some(&overrides)).is_err());
    }

    #[test]
    fn test_fractional_window_is_rejected() {
        let def = get_factor("momentum").unwrap();
        let overrides = BTreeMap::from([("window".to_string(), 2.5)]);
        let params = def.params(Some(&overrides)).unwrap();
        assert!(params.window("window").is_err());
    }
}
