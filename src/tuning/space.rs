use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// A sampled parameter value. Integer-valued knobs (tree depth, iteration
/// counts) stay integers so they can be applied losslessly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
}

impl ParamValue {
    pub(crate) fn as_usize(&self, name: &str) -> Result<usize> {
        match self {
            ParamValue::Int(value) if *value >= 0 => Ok(*value as usize),
            other => Err(ModelError::InvalidParameter(format!(
                "{name} expects a non-negative integer, got {other:?}"
            ))),
        }
    }

    pub(crate) fn as_u32(&self, name: &str) -> Result<u32> {
        match self {
            ParamValue::Int(value) if *value >= 0 && *value <= i64::from(u32::MAX) => {
                Ok(*value as u32)
            }
            other => Err(ModelError::InvalidParameter(format!(
                "{name} expects a non-negative integer, got {other:?}"
            ))),
        }
    }

    pub(crate) fn as_f32(&self) -> f32 {
        match self {
            ParamValue::Int(value) => *value as f32,
            ParamValue::Float(value) => *value as f32,
        }
    }

    pub(crate) fn as_f64(&self) -> f64 {
        match self {
            ParamValue::Int(value) => *value as f64,
            ParamValue::Float(value) => *value,
        }
    }
}

/// Distribution a parameter is drawn from during search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Distribution {
    /// Uniform over the inclusive integer range `[low, high]`.
    IntUniform { low: i64, high: i64 },
    /// Uniform over `[low, high)`.
    Uniform { low: f64, high: f64 },
    /// Uniform in log space over `[low, high)`; bounds must be positive.
    LogUniform { low: f64, high: f64 },
    /// Uniform over an explicit set of values.
    Categorical(Vec<ParamValue>),
}

impl Distribution {
    fn validate(&self, name: &str) -> Result<()> {
        match self {
            Distribution::IntUniform { low, high } if low > high => {
                Err(ModelError::InvalidDistribution(format!(
                    "{name}: integer range [{low}, {high}] is empty"
                )))
            }
            Distribution::Uniform { low, high }
                if !(low.is_finite() && high.is_finite()) || low >= high =>
            {
                Err(ModelError::InvalidDistribution(format!(
                    "{name}: range [{low}, {high}) is empty or not finite"
                )))
            }
            Distribution::LogUniform { low, high }
                if !(low.is_finite() && high.is_finite()) || *low <= 0.0 || low >= high =>
            {
                Err(ModelError::InvalidDistribution(format!(
                    "{name}: log range requires 0 < low < high, got [{low}, {high})"
                )))
            }
            Distribution::Categorical(choices) if choices.is_empty() => Err(
                ModelError::InvalidDistribution(format!("{name}: no choices supplied")),
            ),
            _ => Ok(()),
        }
    }

    fn sample<R: Rng>(&self, rng: &mut R) -> ParamValue {
        match self {
            Distribution::IntUniform { low, high } => ParamValue::Int(rng.gen_range(*low..=*high)),
            Distribution::Uniform { low, high } => ParamValue::Float(rng.gen_range(*low..*high)),
            Distribution::LogUniform { low, high } => {
                let exponent = rng.gen_range(low.ln()..high.ln());
                ParamValue::Float(exponent.exp())
            }
            Distribution::Categorical(choices) => choices[rng.gen_range(0..choices.len())],
        }
    }
}

/// Named parameter distributions to search over. Iteration order is the
/// parameter name order, so sampling is reproducible under a fixed seed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchSpace {
    params: BTreeMap<String, Distribution>,
}

/// Best-found parameter assignment, keyed by parameter name.
pub type TunedParams = BTreeMap<String, ParamValue>;

impl SearchSpace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, distribution: Distribution) -> Self {
        self.params.insert(name.into(), distribution);
        self
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.params.is_empty() {
            return Err(ModelError::InvalidDistribution(
                "search space is empty".into(),
            ));
        }
        for (name, distribution) in &self.params {
            distribution.validate(name)?;
        }
        Ok(())
    }

    pub(crate) fn sample<R: Rng>(&self, rng: &mut R) -> TunedParams {
        self.params
            .iter()
            .map(|(name, distribution)| (name.clone(), distribution.sample(rng)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn samples_stay_within_bounds() {
        let space = SearchSpace::new()
            .with("depth", Distribution::IntUniform { low: 2, high: 8 })
            .with("rate", Distribution::Uniform { low: 0.01, high: 0.5 })
            .with("l2", Distribution::LogUniform { low: 1e-4, high: 1.0 })
            .with(
                "leaves",
                Distribution::Categorical(vec![ParamValue::Int(15), ParamValue::Int(31)]),
            );
        space.validate().unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let sampled = space.sample(&mut rng);
            match sampled["depth"] {
                ParamValue::Int(v) => assert!((2..=8).contains(&v)),
                other => panic!("depth sampled as {other:?}"),
            }
            match sampled["rate"] {
                ParamValue::Float(v) => assert!((0.01..0.5).contains(&v)),
                other => panic!("rate sampled as {other:?}"),
            }
            match sampled["l2"] {
                ParamValue::Float(v) => assert!((1e-4..1.0).contains(&v)),
                other => panic!("l2 sampled as {other:?}"),
            }
            assert!(matches!(
                sampled["leaves"],
                ParamValue::Int(15) | ParamValue::Int(31)
            ));
        }
    }

    #[test]
    fn seeded_sampling_is_reproducible() {
        let space = SearchSpace::new().with("rate", Distribution::Uniform { low: 0.0, high: 1.0 });
        let first = space.sample(&mut StdRng::seed_from_u64(9));
        let second = space.sample(&mut StdRng::seed_from_u64(9));
        assert_eq!(first, second);
    }

    #[test]
    fn invalid_distributions_are_rejected() {
        let cases = [
            ("a", Distribution::IntUniform { low: 5, high: 2 }),
            ("b", Distribution::Uniform { low: 1.0, high: 1.0 }),
            ("c", Distribution::LogUniform { low: 0.0, high: 1.0 }),
            ("d", Distribution::Categorical(vec![])),
        ];
        for (name, distribution) in cases {
            let space = SearchSpace::new().with(name, distribution);
            assert!(space.validate().is_err(), "{name} should be invalid");
        }
    }

    #[test]
    fn empty_space_is_rejected() {
        assert!(SearchSpace::new().validate().is_err());
    }
}
