//! End-to-end run: staged CSV → validation → load, against PostgreSQL.

use std::path::Path;

use normativa_core::validation::catalog::RuleCatalog;
use normativa_core::validation::record::RawRecord;
use normativa_db::loader::RecordOutcome;
use normativa_db::repositories::RegulationRepo;
use normativa_pipeline::summary::Stage;
use normativa_pipeline::{stages, PipelineConfig};
use sqlx::PgPool;

const RULES: &str = r#"
fields:
  title:
    type: string
    required: true
    max_length: 100
  created_at:
    type: date
    required: true
  entity:
    type: string
    required: true
  external_link:
    type: string
  rtype_id:
    type: integer
  classification_id:
    type: integer
"#;

const BATCH: &str = "title,created_at,entity,external_link\n\
    Resolución 123,2024-01-10,ANI,http://x/1\n\
    Resolución 123,2024-01-10,ANI,http://x/1\n\
    Resolución 124,12/01/2024,ANI,http://x/2\n\
    ,2024-01-11,ANI,http://x/3\n";

fn stage_files(dir: &Path) -> PipelineConfig {
    let rules = dir.join("rules.yaml");
    let input = dir.join("batch.csv");
    std::fs::write(&rules, RULES).unwrap();
    std::fs::write(&input, BATCH).unwrap();

    let mut config = PipelineConfig::new(rules, input);
    config.rejected_path = Some(dir.join("rejected.csv"));
    config.summary_path = Some(dir.join("summary.json"));
    config
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_run_loads_valid_records_once(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let config = stage_files(dir.path());

    let summary = stages::run(&pool, &config).await.unwrap();

    let validate = summary.stage(Stage::Validate).unwrap();
    assert_eq!(validate.records_in, 4);
    assert_eq!(validate.records_out, 2);
    assert_eq!(validate.rejected, 2);
    assert_eq!(summary.in_batch_duplicates, 1);

    let load = summary.stage(Stage::Load).unwrap();
    assert_eq!(load.records_out, 1);
    assert_eq!(load.skipped, 1);
    assert_eq!(load.failed, 0);

    let regulations = RegulationRepo::list_by_entity(&pool, "ANI", false)
        .await
        .unwrap();
    assert_eq!(regulations.len(), 1);
    assert_eq!(regulations[0].rtype_id, Some(15));
    assert_eq!(regulations[0].classification_id, Some(13));
    let components = RegulationRepo::get_components(&pool, regulations[0].id)
        .await
        .unwrap();
    assert_eq!(components.len(), 1);
    assert_eq!(components[0].id, 7);

    let rejected = std::fs::read_to_string(dir.path().join("rejected.csv")).unwrap();
    assert!(rejected.contains("created_at:TYPE_MISMATCH"));
    assert!(rejected.contains("title:MISSING_REQUIRED"));
    assert!(dir.path().join("summary.json").exists());

    // A second run over the same file inserts nothing.
    let again = stages::run(&pool, &config).await.unwrap();
    let load = again.stage(Stage::Load).unwrap();
    assert_eq!(load.records_out, 0);
    assert_eq!(load.skipped, 2);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_bad_rule_file_aborts_before_loading(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let config = stage_files(dir.path());
    std::fs::write(&config.rules_path, "fields:\n  title:\n    type: money\n").unwrap();

    let err = stages::run(&pool, &config).await.unwrap_err();
    assert!(err.to_string().contains("Configuration error"));
    assert_eq!(RegulationRepo::count(&pool, false).await.unwrap(), 0);
}

fn raw(title: &str, created_at: &str, entity: &str) -> RawRecord {
    [
        ("title", title),
        ("created_at", created_at),
        ("entity", entity),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), Some(v.to_string())))
    .collect()
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_load_failures_keep_source_positions(pool: PgPool) {
    let catalog = RuleCatalog::from_yaml_str(RULES).unwrap();
    let long_entity = "x".repeat(151);
    let batch = vec![
        raw("Resolución 1", "10/01/2024", "ANI"),
        raw("Resolución 2", "2024-01-10", "ANI"),
        raw("Resolución 3", "2024-01-10", &long_entity),
        raw("Resolución \0 4", "2024-01-10", "ANI"),
    ];

    let (validation, _) = stages::run_validation(&batch, &catalog);
    assert_eq!(validation.valid.len(), 3);

    let (report, summary) = stages::run_load(&pool, &validation.valid, 7)
        .await
        .unwrap();
    assert_eq!(summary.records_in, 3);
    assert_eq!(summary.records_out, 1);
    assert_eq!(summary.failed, 2);

    let mut failed: Vec<usize> = report.failures.iter().map(|f| f.index).collect();
    failed.sort_unstable();
    assert_eq!(failed, vec![2, 3]);
    assert!(report
        .failures
        .iter()
        .any(|f| f.index == 2 && f.key.is_none() && f.error.contains("column allows 150")));
    assert_eq!(report.outcomes.len(), 3);
    assert!(matches!(report.outcomes[0], RecordOutcome::Inserted { .. }));
    assert_eq!(RegulationRepo::count(&pool, false).await.unwrap(), 1);
}
