use std::path::PathBuf;

use normativa_core::classification::DEFAULT_COMPONENT_ID;
use normativa_core::error::CoreError;
use normativa_core::types::DbId;
use normativa_db::config::parse_env;

/// Pipeline run configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// YAML rule file.
    pub rules_path: PathBuf,
    /// CSV staging file produced by extraction.
    pub input_path: PathBuf,
    /// Where to write rejected records for triage, if anywhere.
    pub rejected_path: Option<PathBuf>,
    /// Where to write the JSON run summary, if anywhere.
    pub summary_path: Option<PathBuf>,
    /// Component every loaded regulation is associated with.
    pub component_id: DbId,
    /// Fill entity / classification / regulation type when the source omits them.
    pub apply_source_defaults: bool,
}

impl PipelineConfig {
    pub fn new(rules_path: impl Into<PathBuf>, input_path: impl Into<PathBuf>) -> Self {
        Self {
            rules_path: rules_path.into(),
            input_path: input_path.into(),
            rejected_path: None,
            summary_path: None,
            component_id: DEFAULT_COMPONENT_ID,
            apply_source_defaults: true,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// | Env Var                 | Default                          |
    /// |-------------------------|----------------------------------|
    /// | `RULES_PATH`            | `configs/validation_rules.yaml`  |
    /// | `INPUT_PATH`            | required                         |
    /// | `REJECTED_PATH`         | (unset, no export)               |
    /// | `SUMMARY_PATH`          | (unset, no export)               |
    /// | `COMPONENT_ID`          | `7`                              |
    /// | `APPLY_SOURCE_DEFAULTS` | `true`                           |
    pub fn from_env() -> Result<Self, CoreError> {
        let rules_path =
            std::env::var("RULES_PATH").unwrap_or_else(|_| "configs/validation_rules.yaml".into());
        let input_path = std::env::var("INPUT_PATH")
            .map_err(|_| CoreError::Config("INPUT_PATH must be set".into()))?;

        let mut config = Self::new(rules_path, input_path);
        config.rejected_path = std::env::var("REJECTED_PATH").ok().map(PathBuf::from);
        config.summary_path = std::env::var("SUMMARY_PATH").ok().map(PathBuf::from);
        config.component_id = parse_env("COMPONENT_ID", DEFAULT_COMPONENT_ID)?;
        config.apply_source_defaults = parse_env("APPLY_SOURCE_DEFAULTS", true)?;
        Ok(config)
    }
}
