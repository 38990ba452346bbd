//! Report generation for both analyses.

pub mod generator;
pub mod prototypes;

pub use generator::*;
pub use prototypes::*;
