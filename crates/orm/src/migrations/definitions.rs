//! Migration Definitions - Core types and structures for migrations
//!
//! Defines the fundamental types used throughout the migration system including
//! Migration, MigrationRecord, and MigrationConfig structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A forward-only migration loaded from the file store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Migration {
    /// Unique identifier, the file stem (e.g. `0002_create_profiles`)
    pub id: String,
    /// Sortable version prefix (e.g. `0002`)
    pub version: String,
    /// Human-readable name for the migration
    pub name: String,
    /// SQL statements to apply the migration
    pub sql: String,
    /// Hex-encoded SHA-256 of the file contents
    pub checksum: String,
}

impl Migration {
    /// Numeric value of the version prefix, used for ordering
    pub fn version_number(&self) -> u128 {
        self.version.parse().unwrap_or(u128::MAX)
    }
}

/// Row of the migration history table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    /// Migration ID
    pub id: String,
    /// Checksum of the file at the time it was applied
    pub checksum: String,
    /// When the migration was applied
    pub applied_at: DateTime<Utc>,
}

/// Configuration for the migration system
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Directory where migration files are stored
    pub migrations_dir: PathBuf,
    /// Table name for tracking migrations
    pub history_table: String,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            migrations_dir: PathBuf::from("migrations"),
            history_table: "__postboard_migrations".to_string(),
        }
    }
}

/// Result of running migrations
#[derive(Debug, Default)]
pub struct MigrationRunResult {
    /// IDs of migrations that were applied, in order
    pub applied_migrations: Vec<String>,
    /// Number of migrations that were skipped (already applied)
    pub skipped_count: usize,
    /// Total execution time in milliseconds
    pub execution_time_ms: u128,
}

impl MigrationRunResult {
    /// Number of migrations that were applied
    pub fn applied_count(&self) -> usize {
        self.applied_migrations.len()
    }
}

/// Migration status in the system
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationStatus {
    /// Migration is pending (not yet applied)
    Pending,
    /// Migration has been applied
    Applied {
        /// When it was applied
        applied_at: DateTime<Utc>,
    },
}

impl MigrationStatus {
    pub fn is_applied(&self) -> bool {
        matches!(self, MigrationStatus::Applied { .. })
    }
}
