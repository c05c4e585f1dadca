use std::str::FromStr;
use std::time::Duration;

use normativa_core::error::CoreError;
use sqlx::postgres::PgConnectOptions;

/// Database credentials and pool sizing.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub options: PgConnectOptions,
    /// Pool size (default: `5`). Loads are sequential, so a handful suffices.
    pub max_connections: u32,
    /// How long to wait for a free connection (default: `30` seconds).
    pub acquire_timeout: Duration,
}

impl DbConfig {
    const DEFAULT_MAX_CONNECTIONS: u32 = 5;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

    /// Build from a `postgres://` URL.
    pub fn from_url(url: &str) -> Result<Self, CoreError> {
        let options = PgConnectOptions::from_str(url)
            .map_err(|e| CoreError::Config(format!("invalid DATABASE_URL: {e}")))?;
        Ok(Self::with_options(options))
    }

    /// Build from discrete credentials.
    pub fn from_parts(host: &str, port: u16, user: &str, password: &str, database: &str) -> Self {
        let options = PgConnectOptions::new()
            .host(host)
            .port(port)
            .username(user)
            .password(password)
            .database(database);
        Self::with_options(options)
    }

    fn with_options(options: PgConnectOptions) -> Self {
        Self {
            options,
            max_connections: Self::DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: Duration::from_secs(Self::DEFAULT_ACQUIRE_TIMEOUT_SECS),
        }
    }

    /// Load from environment variables.
    ///
    /// `DATABASE_URL` wins when set; otherwise the discrete `POSTGRES_*`
    /// variables are used.
    ///
    /// | Env Var                  | Default     |
    /// |--------------------------|-------------|
    /// | `DATABASE_URL`           | (unset)     |
    /// | `POSTGRES_HOST`          | `localhost` |
    /// | `POSTGRES_PORT`          | `5432`      |
    /// | `POSTGRES_USER`          | required    |
    /// | `POSTGRES_PASSWORD`      | empty       |
    /// | `POSTGRES_DB`            | required    |
    /// | `DB_MAX_CONNECTIONS`     | `5`         |
    /// | `DB_ACQUIRE_TIMEOUT_SECS`| `30`        |
    pub fn from_env() -> Result<Self, CoreError> {
        let mut config = match std::env::var("DATABASE_URL") {
            Ok(url) => Self::from_url(&url)?,
            Err(_) => {
                let host = std::env::var("POSTGRES_HOST").unwrap_or_else(|_| "localhost".into());
                let port = parse_env("POSTGRES_PORT", 5432u16)?;
                let user = required_env("POSTGRES_USER")?;
                let password = std::env::var("POSTGRES_PASSWORD").unwrap_or_default();
                let database = required_env("POSTGRES_DB")?;
                Self::from_parts(&host, port, &user, &password, &database)
            }
        };
        config.max_connections = parse_env("DB_MAX_CONNECTIONS", Self::DEFAULT_MAX_CONNECTIONS)?;
        config.acquire_timeout = Duration::from_secs(parse_env(
            "DB_ACQUIRE_TIMEOUT_SECS",
            Self::DEFAULT_ACQUIRE_TIMEOUT_SECS,
        )?);
        Ok(config)
    }
}

fn required_env(name: &str) -> Result<String, CoreError> {
    std::env::var(name).map_err(|_| {
        CoreError::Config(format!("{name} must be set when DATABASE_URL is not"))
    })
}

/// Parse an optional env var, falling back to `default` when unset.
pub fn parse_env<T: FromStr>(name: &str, default: T) -> Result<T, CoreError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| CoreError::Config(format!("{name} has invalid value '{raw}'"))),
        Err(_) => Ok(default),
    }
}
