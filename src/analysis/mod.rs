//! Analysis modules.
//!
//! Aggregation of answers, significance tests and the prototype
//! comparison built on top of them.

pub mod aggregator;
pub mod comparison;
pub mod hypothesis;

pub use aggregator::*;
pub use comparison::LikertData;
