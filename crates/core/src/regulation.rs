//! Typed regulation record handed to the persistence layer.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::CoreError;
use crate::validation::catalog::FieldType;
use crate::validation::record::{FieldValue, ValidRecord};

pub const FIELD_TITLE: &str = "title";
pub const FIELD_CREATED_AT: &str = "created_at";
pub const FIELD_ENTITY: &str = "entity";
pub const FIELD_EXTERNAL_LINK: &str = "external_link";
pub const FIELD_SUMMARY: &str = "summary";
pub const FIELD_RTYPE_ID: &str = "rtype_id";
pub const FIELD_CLASSIFICATION_ID: &str = "classification_id";
pub const FIELD_GTYPE: &str = "gtype";

/// Column widths of the `regulations` table, in characters.
pub const MAX_TITLE_LEN: usize = 100;
pub const MAX_ENTITY_LEN: usize = 150;
pub const MAX_EXTERNAL_LINK_LEN: usize = 500;
pub const MAX_GTYPE_LEN: usize = 50;

/// A validated regulation, ready to be inserted.
///
/// `update_at` and `is_active` are not carried here; they are set by the
/// store at write time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRegulation {
    pub title: String,
    pub created_at: NaiveDate,
    pub entity: String,
    pub external_link: Option<String>,
    pub summary: Option<String>,
    pub rtype_id: Option<i32>,
    pub classification_id: Option<i32>,
    pub gtype: Option<String>,
}

impl TryFrom<&ValidRecord> for NewRegulation {
    type Error = CoreError;

    fn try_from(record: &ValidRecord) -> Result<Self, Self::Error> {
        let title = required_text(record, FIELD_TITLE)?;
        let entity = required_text(record, FIELD_ENTITY)?;
        let created_at = date(record, FIELD_CREATED_AT)?
            .ok_or_else(|| missing(FIELD_CREATED_AT))?;

        let regulation = Self {
            title,
            created_at,
            entity,
            external_link: text(record, FIELD_EXTERNAL_LINK),
            summary: text(record, FIELD_SUMMARY),
            rtype_id: integer(record, FIELD_RTYPE_ID)?,
            classification_id: integer(record, FIELD_CLASSIFICATION_ID)?,
            gtype: text(record, FIELD_GTYPE),
        };
        regulation.check_widths()?;
        Ok(regulation)
    }
}

impl NewRegulation {
    /// Reject values that would overflow the `regulations` varchar columns.
    pub fn check_widths(&self) -> Result<(), CoreError> {
        let widths = [
            (FIELD_TITLE, Some(self.title.as_str()), MAX_TITLE_LEN),
            (FIELD_ENTITY, Some(self.entity.as_str()), MAX_ENTITY_LEN),
            (
                FIELD_EXTERNAL_LINK,
                self.external_link.as_deref(),
                MAX_EXTERNAL_LINK_LEN,
            ),
            (FIELD_GTYPE, self.gtype.as_deref(), MAX_GTYPE_LEN),
        ];
        for (field, value, max) in widths {
            if let Some(value) = value {
                let len = value.chars().count();
                if len > max {
                    return Err(CoreError::Validation(format!(
                        "{field} is {len} characters, column allows {max}"
                    )));
                }
            }
        }
        Ok(())
    }
}

fn missing(field: &str) -> CoreError {
    CoreError::Validation(format!("{field} is required"))
}

fn text(record: &ValidRecord, field: &str) -> Option<String> {
    record.get(field).map(FieldValue::canonical)
}

fn required_text(record: &ValidRecord, field: &str) -> Result<String, CoreError> {
    text(record, field).ok_or_else(|| missing(field))
}

/// Dates typed by the catalog are used as-is; untyped pass-through text must
/// still be strict ISO-8601.
fn date(record: &ValidRecord, field: &str) -> Result<Option<NaiveDate>, CoreError> {
    match record.get(field) {
        None => Ok(None),
        Some(FieldValue::Date(d)) => Ok(Some(*d)),
        Some(FieldValue::DateTime(dt)) => Ok(Some(dt.date())),
        Some(FieldValue::Text(s)) => match FieldType::Date.coerce(s) {
            Some(FieldValue::Date(d)) => Ok(Some(d)),
            _ => Err(CoreError::Validation(format!(
                "{field} '{s}' is not an ISO-8601 date"
            ))),
        },
        Some(other) => Err(CoreError::Validation(format!(
            "{field} '{other}' is not a date"
        ))),
    }
}

fn integer(record: &ValidRecord, field: &str) -> Result<Option<i32>, CoreError> {
    let wide = match record.get(field) {
        None => return Ok(None),
        Some(FieldValue::Integer(i)) => *i,
        Some(FieldValue::Text(s)) => match FieldType::Integer.coerce(s) {
            Some(FieldValue::Integer(i)) => i,
            _ => {
                return Err(CoreError::Validation(format!(
                    "{field} '{s}' is not an integer"
                )))
            }
        },
        Some(other) => {
            return Err(CoreError::Validation(format!(
                "{field} '{other}' is not an integer"
            )))
        }
    };
    i32::try_from(wide)
        .map(Some)
        .map_err(|_| CoreError::Validation(format!("{field} {wide} is out of range")))
}
