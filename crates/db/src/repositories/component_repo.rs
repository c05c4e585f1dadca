//! Repository for the `components` catalog.

use normativa_core::types::DbId;
use sqlx::PgPool;

use crate::models::component::{Component, CreateComponent};

const COLUMNS: &str = "id, name";

/// Provides read and insert operations for components.
pub struct ComponentRepo;

impl ComponentRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Component>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM components WHERE id = $1");
        sqlx::query_as::<_, Component>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all components, ordered by id.
    pub async fn list(pool: &PgPool) -> Result<Vec<Component>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM components ORDER BY id");
        sqlx::query_as::<_, Component>(&query).fetch_all(pool).await
    }

    /// Insert a component. Fails with a unique violation if the id is taken.
    pub async fn create(pool: &PgPool, input: &CreateComponent) -> Result<Component, sqlx::Error> {
        let query = format!(
            "INSERT INTO components (id, name) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Component>(&query)
            .bind(input.id)
            .bind(&input.name)
            .fetch_one(pool)
            .await
    }

    /// Insert a component unless one with the same id exists (idempotent).
    ///
    /// Returns `true` if a row was inserted.
    pub async fn ensure(pool: &PgPool, input: &CreateComponent) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO components (id, name) VALUES ($1, $2) \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(input.id)
        .bind(&input.name)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a component. Fails with a foreign key violation while any
    /// regulation is still associated with it.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM components WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
