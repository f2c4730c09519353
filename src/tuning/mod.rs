//! Cross-validated hyperparameter search.
//!
//! - `space` — parameter distributions and sampling
//! - `cv` — stratified k-fold index splitting
//! - `search` — the random search loop

pub mod cv;
pub mod search;
pub mod space;

pub use search::{TuneOptions, TuningOutcome};
pub use space::{Distribution, ParamValue, SearchSpace, TunedParams};
