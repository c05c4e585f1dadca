//! Record shapes flowing through the validator.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A record as delivered by the extraction stage: field name to raw text,
/// `None` where the source had no value.
pub type RawRecord = BTreeMap<String, Option<String>>;

/// A field value after successful type coercion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Integer(i64),
    Boolean(bool),
}

impl FieldValue {
    /// Canonical text form, used for pattern and length checks.
    ///
    /// Dates render as `YYYY-MM-DD`, datetimes as `YYYY-MM-DD HH:MM:SS`.
    pub fn canonical(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            FieldValue::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            FieldValue::Integer(i) => i.to_string(),
            FieldValue::Boolean(b) => b.to_string(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

/// Why a single field failed its rule.
///
/// Serialized with the operator-facing codes (`MISSING_REQUIRED`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    MissingRequired,
    TypeMismatch,
    PatternMismatch,
    LengthExceeded,
}

impl RejectionReason {
    pub fn code(self) -> &'static str {
        match self {
            RejectionReason::MissingRequired => "MISSING_REQUIRED",
            RejectionReason::TypeMismatch => "TYPE_MISMATCH",
            RejectionReason::PatternMismatch => "PATTERN_MISMATCH",
            RejectionReason::LengthExceeded => "LENGTH_EXCEEDED",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A single field-level rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub reason: RejectionReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.reason)
    }
}

/// A record that passed every error-severity rule.
///
/// `fields` holds the normalized values; a `None` entry means the field was
/// absent, or was cleared by a failing warning-severity rule (listed in
/// `warnings`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidRecord {
    /// Position of the record in the input batch.
    pub index: usize,
    pub fields: BTreeMap<String, Option<FieldValue>>,
    pub warnings: Vec<FieldViolation>,
}

impl ValidRecord {
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field).and_then(Option::as_ref)
    }
}

/// A record that failed at least one error-severity rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRecord {
    /// Position of the record in the input batch.
    pub index: usize,
    pub record: RawRecord,
    pub violations: Vec<FieldViolation>,
}

impl RejectedRecord {
    pub fn reasons(&self) -> Vec<RejectionReason> {
        self.violations.iter().map(|v| v.reason).collect()
    }

    /// `field:REASON` pairs joined with `; `, for triage exports and logs.
    pub fn summary(&self) -> String {
        self.violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Partition of a batch into valid and rejected records, both in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchValidation {
    pub valid: Vec<ValidRecord>,
    pub rejected: Vec<RejectedRecord>,
}

impl BatchValidation {
    pub fn total(&self) -> usize {
        self.valid.len() + self.rejected.len()
    }

    /// Percentage of records that passed, `0.0` for an empty batch.
    pub fn success_rate(&self) -> f64 {
        if self.total() == 0 {
            return 0.0;
        }
        self.valid.len() as f64 / self.total() as f64 * 100.0
    }

    pub fn warning_count(&self) -> usize {
        self.valid.iter().map(|r| r.warnings.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_forms() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        assert_eq!(FieldValue::Date(date).canonical(), "2024-01-10");
        assert_eq!(FieldValue::Integer(-3).canonical(), "-3");
        assert_eq!(FieldValue::Boolean(true).canonical(), "true");
    }

    #[test]
    fn reason_serializes_as_code() {
        let json = serde_json::to_string(&RejectionReason::MissingRequired).unwrap();
        assert_eq!(json, "\"MISSING_REQUIRED\"");
        assert_eq!(RejectionReason::PatternMismatch.to_string(), "PATTERN_MISMATCH");
    }

    #[test]
    fn success_rate_of_empty_batch_is_zero() {
        assert_eq!(BatchValidation::default().success_rate(), 0.0);
    }
}
