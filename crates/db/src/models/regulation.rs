//! Regulation row model.

use chrono::NaiveDate;
use normativa_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `regulations` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Regulation {
    pub id: DbId,
    pub title: String,
    pub created_at: NaiveDate,
    pub entity: String,
    pub external_link: Option<String>,
    pub summary: Option<String>,
    pub rtype_id: Option<i32>,
    pub classification_id: Option<i32>,
    pub gtype: Option<String>,
    pub update_at: Timestamp,
    pub is_active: bool,
}
