//! Domain logic for the regulation listing pipeline.
//!
//! Everything in this crate is pure: rule parsing, record validation,
//! deduplication keys, and the typed regulation record handed to the
//! persistence layer. No database or network access.

pub mod classification;
pub mod dedup;
pub mod error;
pub mod regulation;
pub mod types;
pub mod validation;
