//! Convenience wrapper around a gradient-boosted decision tree classifier:
//! training, cross-validated hyperparameter tuning, prediction,
//! persistence, and F1 scoring over Polars frames.

pub mod config;
pub mod dataset;
pub mod error;
pub mod metrics;
pub mod models;
pub mod tuning;

pub use config::{ClassifierParams, Config};
pub use error::{ModelError, Result};
pub use models::{GbdtClassifier, Model};
pub use tuning::{Distribution, ParamValue, SearchSpace, TuneOptions, TunedParams, TuningOutcome};
