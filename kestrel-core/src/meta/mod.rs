//! The Meta Analyzer: complexity, dependency resolution,
//! dependents, and file classification.

pub mod analyzer;
pub mod classification;
pub mod complexity;
pub mod dependencies;

pub use analyzer::{analyze_batch, analyze_one, FileInput};
