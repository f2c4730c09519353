use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use tracing::debug;

use crate::config::ClassifierParams;
use crate::error::{ModelError, Result};
use crate::metrics;
use crate::models::gbdt::{fit_booster, predict_classes};

use super::cv::stratified_kfold;
use super::space::{SearchSpace, TunedParams};

/// Knobs for the search loop itself, as opposed to the model parameters
/// being searched.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TuneOptions {
    /// Number of parameter assignments to evaluate.
    pub n_trials: usize,
    /// Fixes the sampling sequence when set.
    pub seed: Option<u64>,
}

impl Default for TuneOptions {
    fn default() -> Self {
        Self {
            n_trials: 10,
            seed: None,
        }
    }
}

/// Result of a completed search.
#[derive(Debug, Clone)]
pub struct TuningOutcome {
    pub best_params: TunedParams,
    pub best_score: f64,
}

/// Random search: sample an assignment, score it with stratified k-fold
/// F1, keep the best. Every sampled assignment is applied on top of
/// `base`, so unsampled parameters keep their configured values.
pub(crate) fn random_search(
    base: &ClassifierParams,
    space: &SearchSpace,
    rows: &[Vec<f32>],
    labels: &[f32],
    n_cv: usize,
    options: &TuneOptions,
) -> Result<TuningOutcome> {
    space.validate()?;
    if options.n_trials == 0 {
        return Err(ModelError::InvalidParameter(
            "n_trials must be at least 1".into(),
        ));
    }
    let folds = stratified_kfold(labels, n_cv)?;
    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut best: Option<TuningOutcome> = None;
    for trial in 0..options.n_trials {
        let sampled = space.sample(&mut rng);
        let mut params = base.clone();
        for (name, value) in &sampled {
            params.apply(name, value)?;
        }
        params.validate()?;

        let mut total = 0.0;
        for (train_indices, test_indices) in &folds {
            let train_rows: Vec<Vec<f32>> =
                train_indices.iter().map(|&i| rows[i].clone()).collect();
            let train_labels: Vec<f32> = train_indices.iter().map(|&i| labels[i]).collect();
            let test_rows: Vec<Vec<f32>> = test_indices.iter().map(|&i| rows[i].clone()).collect();
            let test_labels: Vec<f32> = test_indices.iter().map(|&i| labels[i]).collect();

            let model = fit_booster(&params, &train_rows, &train_labels)?;
            let predicted = predict_classes(&model, &test_rows);
            total += metrics::f1_score(&test_labels, &predicted, metrics::POSITIVE_LABEL)?;
        }
        let mean_f1 = total / folds.len() as f64;
        debug!(trial, mean_f1, params = ?sampled, "search trial scored");

        if best.as_ref().map_or(true, |b| mean_f1 > b.best_score) {
            best = Some(TuningOutcome {
                best_params: sampled,
                best_score: mean_f1,
            });
        }
    }

    best.ok_or_else(|| ModelError::CrossValidation("search produced no scored trials".into()))
}
