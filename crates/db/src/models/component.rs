//! Component catalog model.

use normativa_core::types::DbId;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `components` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Component {
    pub id: DbId,
    pub name: String,
}

/// DTO for adding a component. Ids are assigned by the caller, not a sequence.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateComponent {
    pub id: DbId,
    pub name: String,
}
