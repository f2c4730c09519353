use polars::error::PolarsError;
use thiserror::Error;

/// Failures surfaced by the classifier wrapper. Nothing is retried or
/// recovered locally; collaborator errors pass through unchanged.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("data error: {0}")]
    Data(#[from] PolarsError),

    #[error("model is not fitted, call train or tune_and_train first")]
    NotFitted,

    #[error("model error: {0}")]
    Model(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("invalid distribution: {0}")]
    InvalidDistribution(String),

    #[error("cross-validation error: {0}")]
    CrossValidation(String),

    #[error("shape mismatch: {rows} feature rows against {labels} labels")]
    ShapeMismatch { rows: usize, labels: usize },

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ModelError>;
