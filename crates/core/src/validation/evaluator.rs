//! Batch validator. Pure logic, no database access.

use std::collections::BTreeMap;

use super::catalog::{FieldCheck, RuleCatalog, RuleSeverity};
use super::record::{BatchValidation, FieldValue, FieldViolation, RawRecord, RejectedRecord, ValidRecord};

/// Validate every record of a batch, partitioning it into valid and rejected
/// records. Input order is preserved in both outputs.
pub fn validate_batch(batch: &[RawRecord], catalog: &RuleCatalog) -> BatchValidation {
    let mut result = BatchValidation::default();
    for (index, record) in batch.iter().enumerate() {
        match validate_record(index, record, catalog) {
            Ok(valid) => result.valid.push(valid),
            Err(rejected) => result.rejected.push(rejected),
        }
    }
    result
}

/// Validate a single record.
///
/// Every configured field is checked; the record collects a violation from
/// each failing field instead of stopping at the first. Error-severity
/// violations reject the record, warning-severity ones clear the field.
/// Fields without a rule pass through as trimmed text.
pub fn validate_record(
    index: usize,
    record: &RawRecord,
    catalog: &RuleCatalog,
) -> Result<ValidRecord, RejectedRecord> {
    let mut fields = BTreeMap::new();
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for (field, rule) in catalog.iter() {
        let raw = record.get(field).and_then(|v| v.as_deref());
        match rule.check(raw) {
            FieldCheck::Valid(value) => {
                fields.insert(field.to_string(), Some(value));
            }
            FieldCheck::Absent => {
                fields.insert(field.to_string(), None);
            }
            FieldCheck::Invalid(reason) => {
                let violation = FieldViolation {
                    field: field.to_string(),
                    reason,
                    value: raw.map(str::to_string),
                };
                match rule.severity {
                    RuleSeverity::Error => errors.push(violation),
                    RuleSeverity::Warning => {
                        fields.insert(field.to_string(), None);
                        warnings.push(violation);
                    }
                }
            }
        }
    }

    if !errors.is_empty() {
        return Err(RejectedRecord {
            index,
            record: record.clone(),
            violations: errors,
        });
    }

    for (field, raw) in record {
        if catalog.contains(field) {
            continue;
        }
        let value = raw
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| FieldValue::Text(v.to_string()));
        fields.insert(field.clone(), value);
    }

    Ok(ValidRecord {
        index,
        fields,
        warnings,
    })
}
