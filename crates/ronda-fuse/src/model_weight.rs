//! Learned-model fusion.
//!
//! Fits a random-forest regression from the standardized factor
//! cross-sections to forward returns, split chronologically by date (no
//! shuffling). The composite is the model's prediction on every
//! fully-observed cell; the reported weights are normalized
//! mean-substitution importances measured on the test split. Too little
//! training data means the model is skipped and equal weighting is used.

use std::collections::BTreeMap;

use ronda_traits::{absent, is_present, Panel, Result, RondaError};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use tracing::{info, warn};

use crate::equal_weight::EqualWeight;
use crate::strategy::{standardize_rows, FusionInputs, FusionOutcome, FusionStrategy};
use crate::weights::WeightVector;

/// Random-forest fusion with an equal-weight fallback when training data
/// is insufficient.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelWeight;

/// One fully-observed (date, instrument) cell flattened into a sample.
struct Sample {
    date_idx: usize,
    inst_idx: usize,
    features: Vec<f64>,
    target: f64,
}

impl FusionStrategy for ModelWeight {
    fn name(&self) -> &'static str {
        "model_weight"
    }

    fn fuse(&self, inputs: &FusionInputs<'_>) -> Result<FusionOutcome> {
        let factors = inputs.eligible_factors();
        if factors.is_empty() {
            return Err(RondaError::Fusion("no factor panels to fuse".to_string()));
        }
        let template = inputs.template()?;

        let samples = collect_samples(inputs, &factors, template);
        let split_date_idx =
            (inputs.cfg.fusion.train_split * template.n_dates() as f64) as usize;
        let train: Vec<&Sample> = samples
            .iter()
            .filter(|s| s.date_idx < split_date_idx)
            .collect();
        let test: Vec<&Sample> = samples
            .iter()
            .filter(|s| s.date_idx >= split_date_idx)
            .collect();

        let min_rows = inputs.cfg.fusion.min_train_rows;
        if train.len() < min_rows {
            warn!(
                train_rows = train.len(),
                min_rows, "not enough training data, falling back to equal weight"
            );
            let mut outcome = EqualWeight.fuse(inputs)?;
            outcome.strategy = self.name().to_string();
            outcome.fell_back = true;
            return Ok(outcome);
        }

        let model_cfg = &inputs.cfg.fusion.model;
        let x = dense_matrix(&train)?;
        let y: Vec<f64> = train.iter().map(|s| s.target).collect();
        let params = RandomForestRegressorParameters::default()
            .with_n_trees(model_cfg.n_trees)
            .with_max_depth(model_cfg.max_depth as u16)
            .with_seed(model_cfg.seed);
        let model = RandomForestRegressor::fit(&x, &y, params)
            .map_err(|e| RondaError::Fusion(format!("model training failed: {e}")))?;
        info!(
            train_rows = train.len(),
            test_rows = test.len(),
            n_features = factors.len(),
            "fitted fusion model"
        );

        // predictions on every fully-observed cell become the composite
        let all_x = dense_matrix(&samples.iter().collect::<Vec<_>>())?;
        let predictions = model
            .predict(&all_x)
            .map_err(|e| RondaError::Fusion(format!("model prediction failed: {e}")))?;
        let mut composite = Panel::absent_like(template);
        for (s, p) in samples.iter().zip(predictions.iter()) {
            composite.set(s.date_idx, s.inst_idx, *p);
        }

        // importance on the held-out rows; train rows if none are held out
        let importance_rows: &[&Sample] = if test.is_empty() { &train } else { &test };
        let weights = importance_weights(&model, importance_rows, &factors, &train)?;

        Ok(FusionOutcome {
            strategy: self.name().to_string(),
            composite: standardize_rows(&composite),
            weights,
            fell_back: false,
        })
    }
}

fn collect_samples(
    inputs: &FusionInputs<'_>,
    factors: &[String],
    template: &Panel,
) -> Vec<Sample> {
    let mut samples = Vec::new();
    for t in 0..template.n_dates() {
        for j in 0..template.n_instruments() {
            let target = inputs.forward.get(t, j);
            if !is_present(target) {
                continue;
            }
            let mut features = Vec::with_capacity(factors.len());
            for name in factors {
                features.push(inputs.standardized[name].get(t, j));
            }
            if features.iter().all(|v| is_present(*v)) {
                samples.push(Sample { date_idx: t, inst_idx: j, features, target });
            }
        }
    }
    samples
}

fn dense_matrix(rows: &[&Sample]) -> Result<DenseMatrix<f64>> {
    let data: Vec<Vec<f64>> = rows.iter().map(|s| s.features.clone()).collect();
    DenseMatrix::from_2d_vec(&data)
        .map_err(|e| RondaError::Fusion(format!("failed to build feature matrix: {e}")))
}

/// Mean-substitution importance: replacing a feature with its training
/// mean and measuring the increase in squared error on the evaluation
/// rows. Negative increases clip to zero; an all-zero profile degrades
/// to equal weights over the features.
fn importance_weights(
    model: &RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>,
    rows: &[&Sample],
    factors: &[String],
    train: &[&Sample],
) -> Result<WeightVector> {
    let x = dense_matrix(rows)?;
    let y: Vec<f64> = rows.iter().map(|s| s.target).collect();
    let baseline = mse(
        &model
            .predict(&x)
            .map_err(|e| RondaError::Fusion(e.to_string()))?,
        &y,
    );

    let n = train.len() as f64;
    let mut magnitudes = BTreeMap::new();
    for (f_idx, name) in factors.iter().enumerate() {
        let train_mean: f64 =
            train.iter().map(|s| s.features[f_idx]).sum::<f64>() / n;
        let substituted: Vec<Vec<f64>> = rows
            .iter()
            .map(|s| {
                let mut features = s.features.clone();
                features[f_idx] = train_mean;
                features
            })
            .collect();
        let xs = DenseMatrix::from_2d_vec(&substituted)
            .map_err(|e| RondaError::Fusion(e.to_string()))?;
        let degraded = mse(
            &model
                .predict(&xs)
                .map_err(|e| RondaError::Fusion(e.to_string()))?,
            &y,
        );
        magnitudes.insert(name.clone(), (degraded - baseline).max(0.0));
    }

    WeightVector::from_magnitudes(magnitudes)
        .or_else(|_| WeightVector::equal(factors))
}

fn mse(predictions: &[f64], targets: &[f64]) -> f64 {
    if predictions.is_empty() {
        return absent();
    }
    predictions
        .iter()
        .zip(targets.iter())
        .map(|(p, t)| (p - t).powi(2))
        .sum::<f64>()
        / predictions.len() as f64
}
