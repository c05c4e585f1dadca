//! Configuration-driven record validation.
//!
//! [`catalog`] parses the YAML rule file into typed [`catalog::Rule`]s,
//! [`evaluator`] applies them to a batch, and [`record`] holds the raw and
//! validated record shapes shared by both.

pub mod catalog;
pub mod evaluator;
pub mod record;
