//! Repository for the `regulations` and `regulations_component` tables.

use normativa_core::dedup::DedupKey;
use normativa_core::regulation::NewRegulation;
use normativa_core::types::DbId;
use sqlx::PgPool;

use crate::models::component::Component;
use crate::models::regulation::Regulation;

/// Column list for the `regulations` table.
const COLUMNS: &str = "id, title, created_at, entity, external_link, summary, \
    rtype_id, classification_id, gtype, update_at, is_active";

/// Column list for the `components` table (used in JOIN queries).
const COMPONENT_COLUMNS: &str = "c.id, c.name";

/// Provides insert, lookup, and association operations for regulations.
pub struct RegulationRepo;

impl RegulationRepo {
    /// Insert a regulation and its component associations in one transaction.
    ///
    /// Returns `None` without writing anything if a row with the same natural
    /// key already exists (including one committed concurrently). On error
    /// the transaction is dropped uncommitted, so no regulation is left
    /// without its associations.
    pub async fn create(
        pool: &PgPool,
        input: &NewRegulation,
        component_ids: &[DbId],
    ) -> Result<Option<Regulation>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let insert_query = format!(
            "INSERT INTO regulations \
                (title, created_at, entity, external_link, summary, \
                 rtype_id, classification_id, gtype, update_at, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, (now() AT TIME ZONE 'utc'), true) \
             ON CONFLICT DO NOTHING \
             RETURNING {COLUMNS}"
        );
        let regulation = sqlx::query_as::<_, Regulation>(&insert_query)
            .bind(&input.title)
            .bind(input.created_at)
            .bind(&input.entity)
            .bind(&input.external_link)
            .bind(&input.summary)
            .bind(input.rtype_id)
            .bind(input.classification_id)
            .bind(&input.gtype)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(regulation) = regulation else {
            tx.rollback().await?;
            return Ok(None);
        };

        for &component_id in component_ids {
            sqlx::query(
                "INSERT INTO regulations_component (regulations_id, components_id) \
                 VALUES ($1, $2)",
            )
            .bind(regulation.id)
            .bind(component_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(Some(regulation))
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Regulation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM regulations WHERE id = $1");
        sqlx::query_as::<_, Regulation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the regulation with the given natural key.
    ///
    /// `external_link` is compared with `IS NOT DISTINCT FROM`, so a `None`
    /// key matches a NULL column.
    pub async fn find_by_key(
        pool: &PgPool,
        key: &DedupKey,
    ) -> Result<Option<Regulation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM regulations \
             WHERE title = $1 AND created_at = $2 \
               AND external_link IS NOT DISTINCT FROM $3"
        );
        sqlx::query_as::<_, Regulation>(&query)
            .bind(&key.title)
            .bind(key.created_at)
            .bind(&key.external_link)
            .fetch_optional(pool)
            .await
    }

    /// Id of the regulation with the given natural key, if any.
    pub async fn find_id_by_key(pool: &PgPool, key: &DedupKey) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT id FROM regulations \
             WHERE title = $1 AND created_at = $2 \
               AND external_link IS NOT DISTINCT FROM $3",
        )
        .bind(&key.title)
        .bind(key.created_at)
        .bind(&key.external_link)
        .fetch_optional(pool)
        .await
    }

    /// List regulations issued by an entity, newest first.
    pub async fn list_by_entity(
        pool: &PgPool,
        entity: &str,
        include_inactive: bool,
    ) -> Result<Vec<Regulation>, sqlx::Error> {
        let active_clause = if include_inactive {
            ""
        } else {
            "AND is_active = true "
        };
        let query = format!(
            "SELECT {COLUMNS} FROM regulations \
             WHERE entity = $1 \
               {active_clause}\
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Regulation>(&query)
            .bind(entity)
            .fetch_all(pool)
            .await
    }

    /// Count regulations, optionally only active ones.
    pub async fn count(pool: &PgPool, active_only: bool) -> Result<i64, sqlx::Error> {
        let query = if active_only {
            "SELECT COUNT(*) FROM regulations WHERE is_active = true"
        } else {
            "SELECT COUNT(*) FROM regulations"
        };
        sqlx::query_scalar::<_, i64>(query).fetch_one(pool).await
    }

    /// Soft-delete a regulation (set `is_active = false`, refresh `update_at`).
    ///
    /// Returns `false` if the row does not exist or is already inactive.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE regulations \
             SET is_active = false, update_at = (now() AT TIME ZONE 'utc') \
             WHERE id = $1 AND is_active = true",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Hard-delete a regulation. Associations are removed by cascade.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM regulations WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Component association helpers
    // -----------------------------------------------------------------------

    /// Get all components associated with a regulation.
    pub async fn get_components(
        pool: &PgPool,
        regulation_id: DbId,
    ) -> Result<Vec<Component>, sqlx::Error> {
        let query = format!(
            "SELECT {COMPONENT_COLUMNS} \
             FROM components c \
             JOIN regulations_component rc ON rc.components_id = c.id \
             WHERE rc.regulations_id = $1 \
             ORDER BY c.id"
        );
        sqlx::query_as::<_, Component>(&query)
            .bind(regulation_id)
            .fetch_all(pool)
            .await
    }

    /// Associate a component with a regulation (idempotent).
    pub async fn add_component(
        pool: &PgPool,
        regulation_id: DbId,
        component_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO regulations_component (regulations_id, components_id) \
             VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(regulation_id)
        .bind(component_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Remove a component association.
    ///
    /// Returns `true` if the association was removed.
    pub async fn remove_component(
        pool: &PgPool,
        regulation_id: DbId,
        component_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM regulations_component \
             WHERE regulations_id = $1 AND components_id = $2",
        )
        .bind(regulation_id)
        .bind(component_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
