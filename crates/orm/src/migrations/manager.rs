//! Migration Manager - File system operations for migrations
//!
//! Handles creating, loading, and parsing migration files from the filesystem.

use sha2::{Digest, Sha256};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
use std::fs;
use std::path::Path;

use super::definitions::{Migration, MigrationConfig};
use super::statements::statement_spans;
use crate::error::{MigrationError, MigrationResult};

/// Width used for version prefixes when the directory has no migrations yet
const DEFAULT_VERSION_WIDTH: usize = 4;

/// Longest version prefix that still fits the numeric ordering key
const MAX_VERSION_DIGITS: usize = 38;

/// Migration manager for creating and loading migrations
pub struct MigrationManager {
    config: MigrationConfig,
}

impl MigrationManager {
    /// Create a new migration manager with default configuration
    pub fn new() -> Self {
        Self::with_config(MigrationConfig::default())
    }

    /// Create a new migration manager with custom configuration
    pub fn with_config(config: MigrationConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Load all migration files from the migrations directory.
    ///
    /// Migrations come back sorted by version. Two files sharing a version
    /// are rejected, as is any file that cannot be parsed.
    pub fn load_migrations(&self) -> MigrationResult<Vec<Migration>> {
        let dir = &self.config.migrations_dir;
        if !dir.is_dir() {
            return Err(MigrationError::integrity(format!(
                "Migrations directory '{}' does not exist",
                dir.display()
            )));
        }

        let entries = fs::read_dir(dir).map_err(|e| {
            MigrationError::integrity(format!(
                "Failed to read migrations directory '{}': {}",
                dir.display(),
                e
            ))
        })?;

        let mut migrations = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                MigrationError::integrity(format!("Failed to read directory entry: {}", e))
            })?;

            let path = entry.path();
            if path.is_file() && path.extension().map_or(false, |ext| ext == "sql") {
                migrations.push(self.parse_migration_file(&path)?);
            }
        }

        migrations.sort_by(|a, b| {
            a.version_number()
                .cmp(&b.version_number())
                .then_with(|| a.id.cmp(&b.id))
        });

        for pair in migrations.windows(2) {
            if pair[0].version_number() == pair[1].version_number() {
                return Err(MigrationError::integrity(format!(
                    "Duplicate migration version {}: '{}' and '{}'",
                    pair[1].version, pair[0].id, pair[1].id
                )));
            }
        }

        tracing::debug!(count = migrations.len(), dir = %dir.display(), "Loaded migration files");
        Ok(migrations)
    }

    /// Parse a migration file into a Migration struct
    fn parse_migration_file(&self, path: &Path) -> MigrationResult<Migration> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                MigrationError::integrity(format!("Invalid migration filename: {}", path.display()))
            })?;

        let (version, name) = parse_migration_id(stem)?;

        let bytes = fs::read(path).map_err(|e| {
            MigrationError::integrity(format!("Failed to read migration file '{}': {}", path.display(), e))
        })?;
        let checksum = hex::encode(Sha256::digest(&bytes));
        let sql = String::from_utf8(bytes).map_err(|_| {
            MigrationError::integrity(format!("Migration file '{}' is not valid UTF-8", path.display()))
        })?;

        if statement_spans(&sql).is_empty() {
            return Err(MigrationError::integrity(format!(
                "Migration file '{}' contains no SQL statements",
                path.display()
            )));
        }

        Ok(Migration {
            id: stem.to_string(),
            version,
            name,
            sql,
            checksum,
        })
    }

    /// Create a new migration file holding `sql`.
    ///
    /// The version is one greater than the highest existing version and is
    /// zero-padded to the width already in use. Returns the file name.
    pub fn create_migration(&self, name: &str, sql: &str) -> MigrationResult<String> {
        let slug = slugify(name);
        if slug.is_empty() {
            return Err(MigrationError::configuration(format!(
                "Migration name '{}' has no usable characters",
                name
            )));
        }

        fs::create_dir_all(&self.config.migrations_dir)?;

        let existing = self.load_migrations()?;
        let (next, width) = match existing.last() {
            Some(last) => (last.version_number() + 1, last.version.len()),
            None => (1, DEFAULT_VERSION_WIDTH),
        };

        let filename = format!("{:0width$}_{}.sql", next, slug, width = width);
        let filepath = self.config.migrations_dir.join(&filename);
        if filepath.exists() {
            return Err(MigrationError::integrity(format!(
                "Migration file '{}' already exists",
                filepath.display()
            )));
        }

        fs::write(&filepath, sql)?;
        tracing::info!(file = %filepath.display(), "Created migration");
        Ok(filename)
    }

    /// Split a migration into its statements, keeping the original text.
    ///
    /// Migrations are executed as one script; the split only serves
    /// reporting and offline checks.
    pub fn split_sql_statements(&self, sql: &str) -> Vec<String> {
        statement_spans(sql)
            .into_iter()
            .map(|span| sql[span].to_string())
            .collect()
    }

    /// Run the file through the PostgreSQL dialect parser.
    ///
    /// Returns the parser's complaint, if any. The server is the authority on
    /// syntax, so this is advisory: plenty of valid PostgreSQL (procedural
    /// bodies, extension DDL) is outside what the parser understands.
    pub fn parser_warning(&self, sql: &str) -> Option<String> {
        match Parser::parse_sql(&PostgreSqlDialect {}, sql) {
            Ok(_) => None,
            Err(e) => Some(e.to_string()),
        }
    }

    /// SQL to create the migrations tracking table
    pub fn create_history_table_sql(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    \
                id VARCHAR(255) PRIMARY KEY,\n    \
                checksum VARCHAR(64) NOT NULL,\n    \
                applied_at TIMESTAMPTZ NOT NULL DEFAULT now()\n\
            );",
            self.config.history_table
        )
    }

    /// SQL to record a migration as applied
    pub fn record_migration_sql(&self) -> String {
        format!(
            "INSERT INTO {} (id, checksum) VALUES ($1, $2)",
            self.config.history_table
        )
    }

    /// SQL to get applied migrations
    pub fn applied_migrations_sql(&self) -> String {
        format!(
            "SELECT id, checksum, applied_at FROM {} ORDER BY applied_at, id",
            self.config.history_table
        )
    }
}

impl Default for MigrationManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a file stem like `0002_create_profiles` into version and readable name
pub fn parse_migration_id(stem: &str) -> MigrationResult<(String, String)> {
    let (version, name) = stem.split_once('_').ok_or_else(|| {
        MigrationError::integrity(format!(
            "Migration filename '{}' must follow the format <version>_<name>.sql",
            stem
        ))
    })?;

    if version.is_empty()
        || version.len() > MAX_VERSION_DIGITS
        || !version.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(MigrationError::integrity(format!(
            "Migration filename '{}' must start with a numeric version",
            stem
        )));
    }

    let name = name.trim_matches('_').replace('_', " ");
    if name.is_empty() {
        return Err(MigrationError::integrity(format!(
            "Migration filename '{}' is missing a name after the version",
            stem
        )));
    }

    Ok((version.to_string(), name))
}

fn slugify(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}
