#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Rule file missing, malformed, or referencing unknown types / bad regexes.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}
