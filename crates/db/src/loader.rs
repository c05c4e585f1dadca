//! Deduplicating batch loader.
//!
//! Each record moves through `PENDING -> EXISTS -> SKIPPED` or
//! `PENDING -> NOT_EXISTS -> INSERTING -> INSERTED | FAILED`. The insert of a
//! regulation and its association row share one transaction, so a failed or
//! aborted record leaves nothing behind.
//!
//! Concurrent runs are kept consistent by the unique index on the natural
//! key: an insert that loses the race hits `ON CONFLICT DO NOTHING` and is
//! counted as a skipped duplicate, not a failure.

use normativa_core::dedup::DedupKey;
use normativa_core::regulation::NewRegulation;
use normativa_core::types::DbId;
use serde::Serialize;

use crate::error::{is_connection_error, is_unique_violation, StoreError};
use crate::repositories::RegulationRepo;
use crate::DbPool;

/// Terminal state of one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RecordOutcome {
    Inserted {
        id: DbId,
    },
    /// `existing_id` is `None` when the duplicate was detected by the insert
    /// conflict rather than the existence check.
    SkippedDuplicate {
        existing_id: Option<DbId>,
    },
    Failed {
        error: String,
    },
}

/// A record that could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordFailure {
    /// Position of the record in the batch handed to the load step.
    pub index: usize,
    /// Rendered natural key, when the record got far enough to have one.
    pub key: Option<String>,
    pub error: String,
}

/// Aggregated result of loading a batch. `outcomes` is in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub inserted: usize,
    pub skipped_duplicate: usize,
    pub failed: usize,
    pub outcomes: Vec<RecordOutcome>,
    pub failures: Vec<RecordFailure>,
}

impl LoadReport {
    /// Record the outcome of the next record.
    pub fn push(&mut self, index: usize, key: Option<&DedupKey>, outcome: RecordOutcome) {
        match &outcome {
            RecordOutcome::Inserted { .. } => self.inserted += 1,
            RecordOutcome::SkippedDuplicate { .. } => self.skipped_duplicate += 1,
            RecordOutcome::Failed { error } => {
                self.failed += 1;
                self.failures.push(RecordFailure {
                    index,
                    key: key.map(ToString::to_string),
                    error: error.clone(),
                });
            }
        }
        self.outcomes.push(outcome);
    }

    pub fn total(&self) -> usize {
        self.inserted + self.skipped_duplicate + self.failed
    }

    /// Ids of regulations inserted by this load, in input order.
    pub fn inserted_ids(&self) -> Vec<DbId> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                RecordOutcome::Inserted { id } => Some(*id),
                _ => None,
            })
            .collect()
    }
}

/// Load one regulation: skip it if its natural key exists, otherwise insert
/// it together with its association to `component_id`.
///
/// Any failure of the duplicate check or the insert comes back as
/// [`RecordOutcome::Failed`]; only connection-level failures are returned as
/// errors.
pub async fn upsert_one(
    pool: &DbPool,
    regulation: &NewRegulation,
    component_id: DbId,
) -> Result<RecordOutcome, StoreError> {
    let key = DedupKey::of(regulation);

    let existing = match RegulationRepo::find_id_by_key(pool, &key).await {
        Ok(existing) => existing,
        Err(err) if is_connection_error(&err) => return Err(StoreError::Connection(err)),
        Err(err) => {
            tracing::warn!(%key, error = %err, "Duplicate check failed");
            return Ok(RecordOutcome::Failed {
                error: err.to_string(),
            });
        }
    };
    if let Some(existing_id) = existing {
        tracing::debug!(%key, existing_id, "Duplicate regulation skipped");
        return Ok(RecordOutcome::SkippedDuplicate {
            existing_id: Some(existing_id),
        });
    }

    match RegulationRepo::create(pool, regulation, &[component_id]).await {
        Ok(Some(inserted)) => {
            tracing::debug!(%key, id = inserted.id, "Regulation inserted");
            Ok(RecordOutcome::Inserted { id: inserted.id })
        }
        Ok(None) => {
            tracing::debug!(%key, "Regulation inserted concurrently, skipped");
            Ok(RecordOutcome::SkippedDuplicate { existing_id: None })
        }
        Err(err) if is_connection_error(&err) => Err(StoreError::Connection(err)),
        Err(err) if is_unique_violation(&err) => {
            Ok(RecordOutcome::SkippedDuplicate { existing_id: None })
        }
        Err(err) => {
            tracing::warn!(%key, error = %err, "Regulation load failed, record rolled back");
            Ok(RecordOutcome::Failed {
                error: err.to_string(),
            })
        }
    }
}

/// Reconcile a batch of validated regulations against the store.
///
/// Records are processed in input order, each in its own transaction.
/// Returns `Err` only when the connection fails; records committed before
/// that point stay committed.
pub async fn upsert_batch(
    pool: &DbPool,
    regulations: &[NewRegulation],
    component_id: DbId,
) -> Result<LoadReport, StoreError> {
    let mut report = LoadReport::default();
    for (index, regulation) in regulations.iter().enumerate() {
        let outcome = upsert_one(pool, regulation, component_id).await?;
        report.push(index, Some(&DedupKey::of(regulation)), outcome);
    }

    tracing::info!(
        total = report.total(),
        inserted = report.inserted,
        skipped_duplicate = report.skipped_duplicate,
        failed = report.failed,
        "Batch loaded",
    );
    Ok(report)
}
