use ndarray::Array2;
use polars::prelude::*;
use std::path::Path;

use crate::error::Result;

/// Contract shared by classifier backends: fit on a feature frame plus a
/// label series, predict on new frames, and persist the trained state.
pub trait Model {
    fn train(&mut self, features: &DataFrame, labels: &Series) -> Result<()>;

    /// One predicted label per input row.
    fn predict(&self, features: &DataFrame) -> Result<Series>;

    /// One row per sample, one column per class.
    fn predict_proba(&self, features: &DataFrame) -> Result<Array2<f32>>;

    fn save(&self, path: &Path) -> Result<()>;

    /// Reconstructs a model from a file written by `save`. Returns the
    /// deserialized value; the caller decides where to bind it.
    fn load(path: &Path) -> Result<Self>
    where
        Self: Sized;
}
