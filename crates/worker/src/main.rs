//! `normativa-worker` -- one validate + load run over a staged batch.
//!
//! Reads the CSV written by the extraction stage, validates it against the
//! YAML rule catalog, and loads the valid records into PostgreSQL. Exits
//! non-zero only on configuration or connectivity failures; per-record
//! problems are reported as counts.
//!
//! # Environment variables
//!
//! See [`normativa_pipeline::PipelineConfig::from_env`] and
//! [`normativa_db::DbConfig::from_env`]. Logging honours `RUST_LOG`, and
//! `LOG_FORMAT=json` switches to JSON lines.

use anyhow::Context;
use normativa_db::DbConfig;
use normativa_pipeline::summary::Stage;
use normativa_pipeline::{stages, PipelineConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "normativa_worker=info,normativa_pipeline=info,normativa_db=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = PipelineConfig::from_env().context("Invalid pipeline configuration")?;
    let db_config = DbConfig::from_env().context("Invalid database configuration")?;
    tracing::info!(
        input = %config.input_path.display(),
        rules = %config.rules_path.display(),
        component_id = config.component_id,
        "Starting normativa-worker",
    );

    let pool = normativa_db::connect(&db_config)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    let result = run(&pool, &config).await;
    pool.close().await;
    tracing::info!("Database connection pool closed");

    result
}

async fn run(pool: &normativa_db::DbPool, config: &PipelineConfig) -> anyhow::Result<()> {
    normativa_db::health_check(pool)
        .await
        .context("Database health check failed")?;
    normativa_db::ensure_schema(pool)
        .await
        .context("Failed to ensure database schema")?;
    tracing::info!("Database schema ready");

    let summary = stages::run(pool, config).await.context("Pipeline run failed")?;

    let loaded = summary.stage(Stage::Load).map_or(0, |s| s.records_out);
    tracing::info!(
        run_id = %summary.run_id,
        inserted = loaded,
        success_rate = %format!("{:.2}%", summary.validation_success_rate),
        in_batch_duplicates = summary.in_batch_duplicates,
        "Pipeline run finished",
    );
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
