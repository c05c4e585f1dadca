//! Stage functions and the run that chains them.

use normativa_core::classification::{rtype_for_title, ENTITY_NAME, FIXED_CLASSIFICATION_ID};
use normativa_core::dedup;
use normativa_core::regulation::{
    NewRegulation, FIELD_CLASSIFICATION_ID, FIELD_ENTITY, FIELD_RTYPE_ID, FIELD_TITLE,
};
use normativa_core::types::DbId;
use normativa_core::validation::catalog::RuleCatalog;
use normativa_core::validation::evaluator::validate_batch;
use normativa_core::validation::record::{BatchValidation, RawRecord, ValidRecord};
use normativa_db::loader::{upsert_batch, LoadReport, RecordOutcome};
use normativa_db::DbPool;
use tracing::Instrument;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::staging;
use crate::summary::{RunSummary, Stage, StageSummary};

/// Fill source-level defaults into records that lack them: the issuing
/// entity, the fixed classification, and a regulation type inferred from
/// the title.
pub fn apply_source_defaults(batch: &mut [RawRecord]) {
    for record in batch.iter_mut() {
        fill_if_blank(record, FIELD_ENTITY, || ENTITY_NAME.to_string());
        fill_if_blank(record, FIELD_CLASSIFICATION_ID, || {
            FIXED_CLASSIFICATION_ID.to_string()
        });

        let title = record
            .get(FIELD_TITLE)
            .and_then(Option::as_deref)
            .map(str::to_string);
        if let Some(title) = title {
            fill_if_blank(record, FIELD_RTYPE_ID, || rtype_for_title(&title).to_string());
        }
    }
}

fn fill_if_blank(record: &mut RawRecord, field: &str, value: impl FnOnce() -> String) {
    let blank = record
        .get(field)
        .and_then(Option::as_deref)
        .map_or(true, |v| v.trim().is_empty());
    if blank {
        record.insert(field.to_string(), Some(value()));
    }
}

/// Validate a batch and summarize the partition.
pub fn run_validation(batch: &[RawRecord], catalog: &RuleCatalog) -> (BatchValidation, StageSummary) {
    let validation = validate_batch(batch, catalog);

    let mut summary = StageSummary::new(Stage::Validate, batch.len());
    summary.records_out = validation.valid.len();
    summary.rejected = validation.rejected.len();

    for rejected in &validation.rejected {
        tracing::debug!(
            index = rejected.index,
            reasons = %rejected.summary(),
            "Record rejected",
        );
    }
    tracing::info!(
        valid = validation.valid.len(),
        rejected = validation.rejected.len(),
        success_rate = %format!("{:.2}%", validation.success_rate()),
        "Validation completed",
    );

    (validation, summary)
}

/// Convert validated records and load them with [`upsert_batch`].
///
/// Records that cannot be converted into a [`NewRegulation`] never reach the
/// store; they are appended to the report as failed after the loaded ones.
/// Failure indexes are the records' positions in the source batch.
pub async fn run_load(
    pool: &DbPool,
    valid: &[ValidRecord],
    component_id: DbId,
) -> Result<(LoadReport, StageSummary), PipelineError> {
    let mut loadable = Vec::with_capacity(valid.len());
    let mut source_indexes = Vec::with_capacity(valid.len());
    let mut unloadable = Vec::new();

    for record in valid {
        match NewRegulation::try_from(record) {
            Ok(regulation) => {
                loadable.push(regulation);
                source_indexes.push(record.index);
            }
            Err(err) => {
                tracing::warn!(index = record.index, error = %err, "Record not loadable");
                unloadable.push((record.index, err.to_string()));
            }
        }
    }

    let mut report = upsert_batch(pool, &loadable, component_id).await?;
    for failure in &mut report.failures {
        failure.index = source_indexes[failure.index];
    }
    for (index, error) in unloadable {
        report.push(index, None, RecordOutcome::Failed { error });
    }

    let mut summary = StageSummary::new(Stage::Load, valid.len());
    summary.records_out = report.inserted;
    summary.skipped = report.skipped_duplicate;
    summary.failed = report.failed;
    Ok((report, summary))
}

/// Count valid records whose natural key repeats within the batch.
fn in_batch_duplicates(valid: &[ValidRecord]) -> usize {
    let regulations: Vec<NewRegulation> = valid
        .iter()
        .filter_map(|r| NewRegulation::try_from(r).ok())
        .collect();
    dedup::repeated_in_batch(&regulations).len()
}

/// Run validate → load over the staged batch named in `config`.
///
/// The rule catalog is loaded before any record is read, so a bad rule file
/// aborts the run without side effects.
pub async fn run(pool: &DbPool, config: &PipelineConfig) -> Result<RunSummary, PipelineError> {
    let run = RunSummary::new();
    let span = tracing::info_span!("pipeline_run", run_id = %run.run_id);
    run_stages(pool, config, run).instrument(span).await
}

async fn run_stages(
    pool: &DbPool,
    config: &PipelineConfig,
    mut run: RunSummary,
) -> Result<RunSummary, PipelineError> {
    let catalog = RuleCatalog::load(&config.rules_path)?;
    tracing::info!(
        rules = catalog.len(),
        path = %config.rules_path.display(),
        "Rule catalog loaded",
    );

    let mut batch = staging::read_batch(&config.input_path)?;
    let mut extract = StageSummary::new(Stage::Extract, batch.len());
    extract.records_out = batch.len();
    extract.log();
    run.stages.push(extract);

    if config.apply_source_defaults {
        apply_source_defaults(&mut batch);
    }

    let (validation, summary) = run_validation(&batch, &catalog);
    summary.log();
    run.stages.push(summary);
    run.validation_success_rate = validation.success_rate();
    run.validation_warnings = validation.warning_count();
    run.in_batch_duplicates = in_batch_duplicates(&validation.valid);

    if let Some(path) = &config.rejected_path {
        staging::write_rejected(path, &validation.rejected)?;
        tracing::info!(path = %path.display(), "Rejected records written");
    }

    let (_, summary) = run_load(pool, &validation.valid, config.component_id).await?;
    summary.log();
    run.stages.push(summary);

    if let Some(path) = &config.summary_path {
        std::fs::write(path, serde_json::to_vec_pretty(&run)?)?;
    }

    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &str = r#"
fields:
  title:
    type: string
    required: true
  created_at:
    type: date
    required: true
  entity:
    type: string
    required: true
  rtype_id:
    type: integer
  classification_id:
    type: integer
"#;

    fn record(pairs: &[(&str, Option<&str>)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
            .collect()
    }

    #[test]
    fn defaults_fill_only_blank_fields() {
        let mut batch = vec![
            record(&[("title", Some("Resolución 20 de 2024")), ("entity", Some(""))]),
            record(&[
                ("title", Some("Decreto 1")),
                ("entity", Some("Ministerio")),
                ("rtype_id", Some("99")),
            ]),
            record(&[("title", None)]),
        ];
        apply_source_defaults(&mut batch);

        assert_eq!(batch[0]["entity"].as_deref(), Some(ENTITY_NAME));
        assert_eq!(batch[0]["classification_id"].as_deref(), Some("13"));
        assert_eq!(batch[0]["rtype_id"].as_deref(), Some("15"));

        assert_eq!(batch[1]["entity"].as_deref(), Some("Ministerio"));
        assert_eq!(batch[1]["rtype_id"].as_deref(), Some("99"));

        assert!(!batch[2].contains_key("rtype_id"));
    }

    #[test]
    fn validation_summary_counts_partition() {
        let catalog = RuleCatalog::from_yaml_str(RULES).unwrap();
        let mut batch = vec![
            record(&[
                ("title", Some("Resolución 123")),
                ("created_at", Some("2024-01-10")),
            ]),
            record(&[
                ("title", Some("Resolución 124")),
                ("created_at", Some("12/01/2024")),
            ]),
            record(&[("created_at", Some("2024-01-11"))]),
        ];
        apply_source_defaults(&mut batch);

        let (validation, summary) = run_validation(&batch, &catalog);
        assert_eq!(summary.stage, Stage::Validate);
        assert_eq!(summary.records_in, 3);
        assert_eq!(summary.records_out, 1);
        assert_eq!(summary.rejected, 2);
        assert_eq!(validation.valid[0].index, 0);
        assert_eq!(
            NewRegulation::try_from(&validation.valid[0]).unwrap().rtype_id,
            Some(15)
        );
    }

    #[test]
    fn counts_repeated_keys_among_valid_records() {
        let catalog = RuleCatalog::from_yaml_str(RULES).unwrap();
        let row = record(&[
            ("title", Some("Resolución 123")),
            ("created_at", Some("2024-01-10")),
            ("entity", Some("ANI")),
        ]);
        let (validation, _) = run_validation(&[row.clone(), row], &catalog);
        assert_eq!(in_batch_duplicates(&validation.valid), 1);
    }
}
