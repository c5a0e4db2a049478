//! Factor weight vectors.

use std::collections::BTreeMap;

use ronda_traits::{Result, RondaError};
use serde::Serialize;

/// Non-negative weights over factor names, normalized so the absolute
/// weights sum to one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightVector {
    weights: BTreeMap<String, f64>,
}

impl WeightVector {
    /// Builds a normalized weight vector from raw non-negative magnitudes.
    /// Fails when the magnitudes sum to zero or any weight is negative or
    /// non-finite.
    pub fn from_magnitudes(raw: BTreeMap<String, f64>) -> Result<Self> {
        if raw.is_empty() {
            return Err(RondaError::Fusion("no factors to weight".to_string()));
        }
        let mut total = 0.0;
        for (name, w) in &raw {
            if !w.is_finite() || *w < 0.0 {
                return Err(RondaError::Fusion(format!(
                    "invalid weight {w} for factor `{name}`"
                )));
            }
            total += w;
        }
        if total <= 0.0 {
            return Err(RondaError::Fusion("weights sum to zero".to_string()));
        }
        let weights = raw.into_iter().map(|(k, w)| (k, w / total)).collect();
        Ok(Self { weights })
    }

    /// Equal weights of `1 / n` over the given factor names.
    pub fn equal(factors: &[String]) -> Result<Self> {
        Self::from_magnitudes(factors.iter().map(|f| (f.clone(), 1.0)).collect())
    }

    /// The weight for a factor, zero if it is not in the vector.
    #[must_use]
    pub fn get(&self, factor: &str) -> f64 {
        self.weights.get(factor).copied().unwrap_or(0.0)
    }

    /// Iterates over `(factor, weight)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(k, w)| (k.as_str(), *w))
    }

    /// Number of weighted factors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Sum of absolute weights. Always 1 up to rounding.
    #[must_use]
    pub fn abs_sum(&self) -> f64 {
        self.weights.values().map(|w| w.abs()).sum()
    }
}
