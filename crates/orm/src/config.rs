//! Database configuration
//!
//! The connection string comes from `DATABASE_URL`; the remaining options
//! have defaults and optional `POSTBOARD_*` overrides.

use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::error::{MigrationError, MigrationResult};
use crate::migrations::MigrationConfig;

pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub const MIGRATIONS_DIR_ENV: &str = "POSTBOARD_MIGRATIONS_DIR";
pub const CONNECT_TIMEOUT_ENV: &str = "POSTBOARD_CONNECT_TIMEOUT";

/// Default connect timeout in seconds
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 10;

/// Everything the runner needs to reach the database and find migrations
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string
    pub url: String,
    /// Upper bound on establishing the connection
    pub connect_timeout: Duration,
    /// Migration file store and history table
    pub migrations: MigrationConfig,
}

impl DatabaseConfig {
    /// Build and validate a configuration from a connection string
    pub fn new(url: &str) -> MigrationResult<Self> {
        validate_database_url(url)?;
        Ok(Self {
            url: url.to_string(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT),
            migrations: MigrationConfig::default(),
        })
    }

    /// Load configuration from the process environment
    pub fn from_env() -> MigrationResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any variable source, e.g. a map in tests
    pub fn from_lookup<F>(lookup: F) -> MigrationResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup(DATABASE_URL_ENV).ok_or_else(|| {
            MigrationError::configuration(format!("{} environment variable is not set", DATABASE_URL_ENV))
        })?;

        let mut config = Self::new(&url)?;

        if let Some(dir) = lookup(MIGRATIONS_DIR_ENV) {
            config = config.with_migrations_dir(dir);
        }

        if let Some(raw) = lookup(CONNECT_TIMEOUT_ENV) {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                MigrationError::configuration(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    CONNECT_TIMEOUT_ENV, raw
                ))
            })?;
            config = config.with_connect_timeout(Duration::from_secs(secs));
        }

        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_migrations_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.migrations.migrations_dir = dir.into();
        self
    }

    #[must_use]
    pub fn with_history_table(mut self, table: &str) -> Self {
        self.migrations.history_table = table.to_string();
        self
    }

    /// Check option values that cannot be caught by the type system
    pub fn validate(&self) -> MigrationResult<()> {
        validate_database_url(&self.url)?;

        if self.connect_timeout.is_zero() {
            return Err(MigrationError::configuration("Connect timeout must be greater than zero"));
        }

        let table = &self.migrations.history_table;
        if table.is_empty() || !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(MigrationError::configuration(format!(
                "History table name '{}' must be a plain SQL identifier",
                table
            )));
        }

        Ok(())
    }

    /// The connection string with its password masked, for logs
    pub fn redacted_url(&self) -> String {
        redact_database_url(&self.url)
    }
}

/// Check that `url` is a usable PostgreSQL connection string
pub fn validate_database_url(url: &str) -> MigrationResult<()> {
    if url.trim().is_empty() {
        return Err(MigrationError::configuration("Database URL is empty"));
    }

    let parsed = Url::parse(url)
        .map_err(|e| MigrationError::configuration(format!("Invalid database URL: {}", e)))?;

    if !matches!(parsed.scheme(), "postgres" | "postgresql") {
        return Err(MigrationError::configuration(format!(
            "Unsupported database URL scheme '{}', expected postgres:// or postgresql://",
            parsed.scheme()
        )));
    }

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(MigrationError::configuration("Database URL has no host"));
    }

    if parsed.path().trim_start_matches('/').is_empty() {
        return Err(MigrationError::configuration("Database URL has no database name"));
    }

    Ok(())
}

/// Mask the password of a connection string
pub fn redact_database_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("***"));
            }
            parsed.to_string()
        }
        Err(_) => "<invalid url>".to_string(),
    }
}
