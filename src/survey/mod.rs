//! Survey input: loading question files and classifying questions.

pub mod classifier;
pub mod loader;

pub use classifier::Classifier;
pub use loader::{load_survey, ResponseTable, Survey};
