use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::time::Instant;

use gbdt::config::Config as GbdtConfig;
use gbdt::gradient_boost::GBDT;
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::traits::Model;
use crate::config::ClassifierParams;
use crate::dataset;
use crate::error::{ModelError, Result};
use crate::metrics;
use crate::tuning::search::random_search;
use crate::tuning::{SearchSpace, TuneOptions, TunedParams};

/// Binary classifier over gradient-boosted decision trees.
///
/// The trained model is held as a present-after-fit value: predict-family
/// calls before the first successful `train`, `tune_and_train`, or `load`
/// fail with [`ModelError::NotFitted`]. Labels are the classes 0 and 1;
/// the booster trains with the `LogLikelyhood` loss and predicts the
/// probability of class 1.
pub struct GbdtClassifier {
    params: ClassifierParams,
    tuned: Option<TunedParams>,
    model: Option<GBDT>,
}

/// On-disk layout: the configuration, the tuned parameters if any, and
/// the booster state. Nothing else is persisted.
#[derive(Deserialize)]
struct SavedModel {
    params: ClassifierParams,
    tuned: Option<TunedParams>,
    model: Option<GBDT>,
}

#[derive(Serialize)]
struct SavedModelRef<'a> {
    params: &'a ClassifierParams,
    tuned: &'a Option<TunedParams>,
    model: &'a Option<GBDT>,
}

impl GbdtClassifier {
    /// Fresh, untrained classifier. Parameters are validated here rather
    /// than at fit time.
    pub fn new(params: ClassifierParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            tuned: None,
            model: None,
        })
    }

    pub fn params(&self) -> &ClassifierParams {
        &self.params
    }

    /// Best parameters found by `tune_and_train`; `None` until then.
    pub fn tuned_params(&self) -> Option<&TunedParams> {
        self.tuned.as_ref()
    }

    pub fn is_fitted(&self) -> bool {
        self.model.is_some()
    }

    /// Searches `space` with stratified `n_cv`-fold cross-validation
    /// maximizing F1 on class 1, stores the best assignment, then re-fits
    /// on the full dataset with it. The re-fit is an explicit second
    /// phase, not a by-product of the search.
    pub fn tune_and_train(
        &mut self,
        features: &DataFrame,
        labels: &Series,
        space: &SearchSpace,
        n_cv: usize,
    ) -> Result<()> {
        self.tune_and_train_with(features, labels, space, n_cv, &TuneOptions::default())
    }

    pub fn tune_and_train_with(
        &mut self,
        features: &DataFrame,
        labels: &Series,
        space: &SearchSpace,
        n_cv: usize,
        options: &TuneOptions,
    ) -> Result<()> {
        let rows = dataset::feature_rows(features)?;
        let label_values = dataset::label_values(labels)?;

        info!(n_cv, trials = options.n_trials, "tuning starts");
        let started = Instant::now();
        let outcome = random_search(&self.params, space, &rows, &label_values, n_cv, options)?;
        info!(
            best_f1 = outcome.best_score,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "tuning ends"
        );

        for (name, value) in &outcome.best_params {
            self.params.apply(name, value)?;
        }
        self.tuned = Some(outcome.best_params);

        info!(rows = rows.len(), "training starts");
        let started = Instant::now();
        self.model = Some(fit_booster(&self.params, &rows, &label_values)?);
        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "training ends"
        );
        Ok(())
    }

    /// F1 of `predict(features)` against `labels`, positive class 1.
    pub fn score(&self, features: &DataFrame, labels: &Series) -> Result<f64> {
        let model = self.model.as_ref().ok_or(ModelError::NotFitted)?;
        let rows = dataset::feature_rows(features)?;
        let truth = dataset::label_values(labels)?;
        let predicted = predict_classes(model, &rows);
        metrics::f1_score(&truth, &predicted, metrics::POSITIVE_LABEL)
    }
}

impl Model for GbdtClassifier {
    fn train(&mut self, features: &DataFrame, labels: &Series) -> Result<()> {
        let rows = dataset::feature_rows(features)?;
        let label_values = dataset::label_values(labels)?;

        info!(rows = rows.len(), "training starts");
        let started = Instant::now();
        self.model = Some(fit_booster(&self.params, &rows, &label_values)?);
        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "training ends"
        );
        Ok(())
    }

    fn predict(&self, features: &DataFrame) -> Result<Series> {
        let model = self.model.as_ref().ok_or(ModelError::NotFitted)?;
        let rows = dataset::feature_rows(features)?;
        let classes = predict_classes(model, &rows);
        Ok(Series::new(PlSmallStr::from("predictions"), classes))
    }

    fn predict_proba(&self, features: &DataFrame) -> Result<Array2<f32>> {
        let model = self.model.as_ref().ok_or(ModelError::NotFitted)?;
        let rows = dataset::feature_rows(features)?;
        let probabilities = predict_probabilities(model, &rows);
        let mut values = Vec::with_capacity(probabilities.len() * 2);
        for p in &probabilities {
            values.push(1.0 - p);
            values.push(*p);
        }
        Array2::from_shape_vec((probabilities.len(), 2), values)
            .map_err(|e| ModelError::Model(e.to_string()))
    }

    fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let state = SavedModelRef {
            params: &self.params,
            tuned: &self.tuned,
            model: &self.model,
        };
        serde_json::to_writer(BufWriter::new(file), &state)?;
        Ok(())
    }

    fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let state: SavedModel = serde_json::from_reader(BufReader::new(file))?;
        state.params.validate()?;
        Ok(Self {
            params: state.params,
            tuned: state.tuned,
            model: state.model,
        })
    }
}

/// Builds a booster from `params` and fits it on the given rows. Used for
/// both the full-dataset fits and the per-fold fits during search.
pub(crate) fn fit_booster(
    params: &ClassifierParams,
    rows: &[Vec<f32>],
    labels: &[f32],
) -> Result<GBDT> {
    if rows.is_empty() {
        return Err(ModelError::Model("cannot fit on an empty dataset".into()));
    }
    let config = booster_config(params, rows[0].len());
    let mut data = dataset::training_data(rows, labels)?;
    let mut model = GBDT::new(&config);
    model.fit(&mut data);
    Ok(model)
}

pub(crate) fn predict_probabilities(model: &GBDT, rows: &[Vec<f32>]) -> Vec<f32> {
    let data = dataset::test_data(rows);
    model.predict(&data)
}

pub(crate) fn predict_classes(model: &GBDT, rows: &[Vec<f32>]) -> Vec<f32> {
    predict_probabilities(model, rows)
        .into_iter()
        .map(|p| if p >= 0.5 { 1.0 } else { 0.0 })
        .collect()
}

fn booster_config(params: &ClassifierParams, feature_size: usize) -> GbdtConfig {
    let mut config = GbdtConfig::new();
    config.set_feature_size(feature_size);
    config.set_max_depth(params.max_depth);
    config.set_iterations(params.iterations);
    config.set_shrinkage(params.learning_rate);
    config.set_min_leaf_size(params.min_leaf_size);
    config.set_data_sample_ratio(params.data_sample_ratio);
    config.set_feature_sample_ratio(params.feature_sample_ratio);
    config.set_loss("LogLikelyhood");
    config.set_debug(false);
    config.set_training_optimization_level(2);
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Distribution;
    use anyhow::Result;

    fn init_logging() {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    }

    // 100 rows x 5 columns, 60/40 binary split, linearly separable.
    fn toy_dataset() -> Result<(DataFrame, Series)> {
        let mut columns = vec![Vec::with_capacity(100); 5];
        let mut labels = Vec::with_capacity(100);
        for i in 0..100usize {
            let class = if i % 5 == 0 || i % 5 == 2 { 1.0f64 } else { 0.0 };
            labels.push(class);
            for (c, column) in columns.iter_mut().enumerate() {
                let jitter = ((i * (c + 3)) % 7) as f64 * 0.03;
                column.push(class * (c as f64 + 1.0) + jitter);
            }
        }
        let df = df!(
            "f0" => &columns[0],
            "f1" => &columns[1],
            "f2" => &columns[2],
            "f3" => &columns[3],
            "f4" => &columns[4],
        )?;
        Ok((df, Series::new(PlSmallStr::from("label"), labels)))
    }

    fn small_params() -> ClassifierParams {
        ClassifierParams {
            iterations: 30,
            max_depth: 3,
            ..Default::default()
        }
    }

    #[test]
    fn train_then_predict_covers_every_row() -> Result<()> {
        init_logging();
        let (features, labels) = toy_dataset()?;
        let mut clf = GbdtClassifier::new(small_params())?;
        assert!(!clf.is_fitted());
        clf.train(&features, &labels)?;
        assert!(clf.is_fitted());

        let predictions = clf.predict(&features)?;
        assert_eq!(predictions.len(), 100);
        let values: Vec<f32> = predictions.f32()?.into_no_null_iter().collect();
        assert!(values.iter().all(|v| *v == 0.0 || *v == 1.0));
        assert!(values.contains(&0.0));
        assert!(values.contains(&1.0));
        Ok(())
    }

    #[test]
    fn score_is_within_unit_interval_and_permutation_invariant() -> Result<()> {
        let (features, labels) = toy_dataset()?;
        let mut clf = GbdtClassifier::new(small_params())?;
        clf.train(&features, &labels)?;

        let forward = clf.score(&features, &labels)?;
        assert!((0.0..=1.0).contains(&forward));

        let backward = clf.score(&features.reverse(), &labels.reverse())?;
        assert!((forward - backward).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn predict_proba_rows_sum_to_one() -> Result<()> {
        let (features, labels) = toy_dataset()?;
        let mut clf = GbdtClassifier::new(small_params())?;
        clf.train(&features, &labels)?;

        let probabilities = clf.predict_proba(&features)?;
        assert_eq!(probabilities.shape(), &[100, 2]);
        for row in probabilities.rows() {
            let total: f32 = row.iter().sum();
            assert!((total - 1.0).abs() < 1e-5);
            assert!(row.iter().all(|p| (0.0..=1.0).contains(p)));
        }
        Ok(())
    }

    #[test]
    fn predict_before_training_reports_unfitted() -> Result<()> {
        let (features, _) = toy_dataset()?;
        let clf = GbdtClassifier::new(ClassifierParams::default())?;
        match clf.predict(&features) {
            Err(ModelError::NotFitted) => Ok(()),
            other => anyhow::bail!("expected NotFitted, got {other:?}"),
        }
    }

    #[test]
    fn save_load_round_trip_preserves_predictions() -> Result<()> {
        let (features, labels) = toy_dataset()?;
        let mut clf = GbdtClassifier::new(small_params())?;
        clf.train(&features, &labels)?;
        let before: Vec<f32> = clf.predict(&features)?.f32()?.into_no_null_iter().collect();

        let dir = tempfile::tempdir()?;
        let path = dir.path().join("classifier.json");
        clf.save(&path)?;

        let restored = GbdtClassifier::load(&path)?;
        let after: Vec<f32> = restored
            .predict(&features)?
            .f32()?
            .into_no_null_iter()
            .collect();
        assert_eq!(before, after);
        assert_eq!(restored.params(), clf.params());
        Ok(())
    }

    #[test]
    fn untrained_wrapper_round_trips_too() -> Result<()> {
        let clf = GbdtClassifier::new(ClassifierParams::default())?;
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("untrained.json");
        clf.save(&path)?;
        let restored = GbdtClassifier::load(&path)?;
        assert!(!restored.is_fitted());
        assert!(restored.tuned_params().is_none());
        Ok(())
    }

    #[test]
    fn tune_and_train_stores_best_params_within_space() -> Result<()> {
        init_logging();
        let (features, labels) = toy_dataset()?;
        let mut clf = GbdtClassifier::new(ClassifierParams {
            iterations: 10,
            max_depth: 3,
            ..Default::default()
        })?;
        let space = SearchSpace::new()
            .with("iterations", Distribution::IntUniform { low: 5, high: 20 })
            .with(
                "learning_rate",
                Distribution::Uniform {
                    low: 0.05,
                    high: 0.3,
                },
            );
        let options = TuneOptions {
            n_trials: 3,
            seed: Some(7),
        };
        clf.tune_and_train_with(&features, &labels, &space, 3, &options)?;

        let tuned = clf.tuned_params().expect("tuning stores best parameters");
        assert_eq!(tuned.len(), 2);
        assert!(tuned.keys().all(|k| space.keys().any(|name| name == k)));
        assert!(clf.is_fitted());

        let score = clf.score(&features, &labels)?;
        assert!((0.0..=1.0).contains(&score));
        Ok(())
    }

    #[test]
    fn tune_rejects_more_folds_than_minority_class() -> Result<()> {
        let df = df!(
            "f0" => &[0.1f64, 0.2, 0.3, 0.4, 0.5, 0.6, 5.0, 6.0],
            "f1" => &[0.2f64, 0.1, 0.4, 0.3, 0.6, 0.5, 5.5, 6.5],
        )?;
        let labels = Series::new(
            PlSmallStr::from("label"),
            vec![0.0f64, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0],
        );
        let mut clf = GbdtClassifier::new(small_params())?;
        let space =
            SearchSpace::new().with("iterations", Distribution::IntUniform { low: 5, high: 10 });
        match clf.tune_and_train(&df, &labels, &space, 3) {
            Err(ModelError::CrossValidation(_)) => Ok(()),
            other => anyhow::bail!("expected CrossValidation error, got {other:?}"),
        }
    }

    #[test]
    fn mismatched_labels_are_rejected_at_fit() -> Result<()> {
        let (features, _) = toy_dataset()?;
        let labels = Series::new(PlSmallStr::from("label"), vec![0.0f64, 1.0]);
        let mut clf = GbdtClassifier::new(small_params())?;
        match clf.train(&features, &labels) {
            Err(ModelError::ShapeMismatch { .. }) => Ok(()),
            other => anyhow::bail!("expected ShapeMismatch, got {other:?}"),
        }
    }
}
