pub mod gbdt;
pub mod traits;

pub use gbdt::GbdtClassifier;
pub use traits::Model;
