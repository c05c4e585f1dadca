//! Operator-facing count summaries.

use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Extract,
    Validate,
    Load,
}

/// Record counts for one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageSummary {
    pub stage: Stage,
    pub records_in: usize,
    pub records_out: usize,
    pub rejected: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl StageSummary {
    pub fn new(stage: Stage, records_in: usize) -> Self {
        Self {
            stage,
            records_in,
            records_out: 0,
            rejected: 0,
            skipped: 0,
            failed: 0,
        }
    }

    pub fn log(&self) {
        tracing::info!(
            stage = ?self.stage,
            records_in = self.records_in,
            records_out = self.records_out,
            rejected = self.rejected,
            skipped = self.skipped,
            failed = self.failed,
            "Stage completed",
        );
    }
}

/// Summary of a whole run, written as JSON for the orchestrator.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub stages: Vec<StageSummary>,
    /// Valid records as a percentage of validated ones.
    pub validation_success_rate: f64,
    /// Fields cleared by warning-severity rules.
    pub validation_warnings: usize,
    /// Valid records repeating a natural key seen earlier in the same batch.
    pub in_batch_duplicates: usize,
}

impl RunSummary {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::now_v7(),
            stages: Vec::new(),
            validation_success_rate: 0.0,
            validation_warnings: 0,
            in_batch_duplicates: 0,
        }
    }

    pub fn stage(&self, stage: Stage) -> Option<&StageSummary> {
        self.stages.iter().find(|s| s.stage == stage)
    }
}

impl Default for RunSummary {
    fn default() -> Self {
        Self::new()
    }
}
