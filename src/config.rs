use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{ModelError, Result};
use crate::tuning::{ParamValue, TuneOptions};

/// Top-level configuration, loadable from a TOML file.
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub model: ClassifierParams,
    #[serde(default)]
    pub tuning: TuneOptions,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.model.validate()?;
        Ok(config)
    }
}

/// Booster parameters recognized by the classifier. Every knob is
/// enumerated here; there is no dynamic key/value passthrough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierParams {
    pub iterations: usize,
    pub max_depth: u32,
    pub learning_rate: f32,
    pub min_leaf_size: usize,
    pub data_sample_ratio: f64,
    pub feature_sample_ratio: f64,
}

impl Default for ClassifierParams {
    fn default() -> Self {
        Self {
            iterations: 100,
            max_depth: 6,
            learning_rate: 0.1,
            min_leaf_size: 1,
            data_sample_ratio: 1.0,
            feature_sample_ratio: 1.0,
        }
    }
}

impl ClassifierParams {
    /// Rejects values the booster would choke on. Called at construction
    /// and again after tuned values are applied.
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(ModelError::InvalidParameter(
                "iterations must be at least 1".into(),
            ));
        }
        if self.max_depth == 0 {
            return Err(ModelError::InvalidParameter(
                "max_depth must be at least 1".into(),
            ));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(ModelError::InvalidParameter(format!(
                "learning_rate must be a positive finite number, got {}",
                self.learning_rate
            )));
        }
        if self.min_leaf_size == 0 {
            return Err(ModelError::InvalidParameter(
                "min_leaf_size must be at least 1".into(),
            ));
        }
        for (name, ratio) in [
            ("data_sample_ratio", self.data_sample_ratio),
            ("feature_sample_ratio", self.feature_sample_ratio),
        ] {
            if !ratio.is_finite() || ratio <= 0.0 || ratio > 1.0 {
                return Err(ModelError::InvalidParameter(format!(
                    "{name} must be in (0, 1], got {ratio}"
                )));
            }
        }
        Ok(())
    }

    /// Sets a single parameter by name. Unknown names are rejected, which
    /// bounds the tunable surface to the fields above.
    pub fn apply(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        match name {
            "iterations" => self.iterations = value.as_usize(name)?,
            "max_depth" => self.max_depth = value.as_u32(name)?,
            "learning_rate" => self.learning_rate = value.as_f32(),
            "min_leaf_size" => self.min_leaf_size = value.as_usize(name)?,
            "data_sample_ratio" => self.data_sample_ratio = value.as_f64(),
            "feature_sample_ratio" => self.feature_sample_ratio = value.as_f64(),
            _ => {
                return Err(ModelError::InvalidParameter(format!(
                    "unknown parameter name: {name}"
                )))
            }
        }
        Ok(())
    }
}
