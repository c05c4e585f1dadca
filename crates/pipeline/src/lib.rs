//! Validate → load stages of the regulation pipeline.
//!
//! Extraction hands over a CSV staging file; this crate reads it, applies
//! source defaults, validates against the rule catalog, and loads the valid
//! subset, producing a count summary per stage.

pub mod config;
pub mod error;
pub mod stages;
pub mod staging;
pub mod summary;

pub use config::PipelineConfig;
pub use error::PipelineError;
