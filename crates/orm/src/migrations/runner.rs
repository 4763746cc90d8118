//! Migration Runner - Executes migrations against the database
//!
//! Holds a single-connection pool for the lifetime of the run. Every pending
//! migration is applied in its own transaction together with its history row,
//! so a failing migration leaves earlier ones in place and is itself never
//! recorded.

use sqlx::postgres::{PgDatabaseError, PgErrorPosition, PgPoolOptions};
use sqlx::{Executor, PgPool, Row};
use std::time::Instant;

use super::definitions::{Migration, MigrationRecord, MigrationRunResult, MigrationStatus};
use super::manager::MigrationManager;
use super::planner::{self, MigrationPlan};
use super::statements;
use crate::config::DatabaseConfig;
use crate::error::{MigrationError, MigrationResult};

/// Migration runner that executes migrations against a database
pub struct MigrationRunner {
    manager: MigrationManager,
    pool: PgPool,
}

impl MigrationRunner {
    /// Create a new migration runner over an existing pool
    pub fn new(manager: MigrationManager, pool: PgPool) -> Self {
        Self { manager, pool }
    }

    /// Connect to the configured database.
    ///
    /// The configuration is validated first. The connect attempt is bounded
    /// by `config.connect_timeout`; an unreachable or unresponsive server
    /// becomes a connection error and no SQL is sent.
    pub async fn connect(config: &DatabaseConfig) -> MigrationResult<Self> {
        config.validate()?;

        let timeout = config.connect_timeout;
        tracing::info!(database = %config.redacted_url(), timeout_secs = timeout.as_secs(), "Connecting to database");

        let connect = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(timeout)
            .connect(&config.url);

        let pool = match tokio::time::timeout(timeout, connect).await {
            Ok(Ok(pool)) => pool,
            Ok(Err(sqlx::Error::PoolTimedOut)) | Err(_) => {
                return Err(MigrationError::Connection {
                    message: format!(
                        "Could not connect to {} within {}s",
                        config.redacted_url(),
                        timeout.as_secs()
                    ),
                    source: None,
                })
            }
            Ok(Err(e)) => {
                return Err(MigrationError::connection(
                    format!("Failed to connect to {}", config.redacted_url()),
                    e,
                ))
            }
        };

        let manager = MigrationManager::with_config(config.migrations.clone());
        Ok(Self::new(manager, pool))
    }

    /// Create the history table if it is absent. Safe to call repeatedly.
    pub async fn ensure_history_table(&self) -> MigrationResult<()> {
        let sql = self.manager.create_history_table_sql();
        sqlx::query(&sql).execute(&self.pool).await.map_err(|e| {
            MigrationError::history(
                format!(
                    "Failed to create history table '{}'",
                    self.manager.config().history_table
                ),
                e,
            )
        })?;
        Ok(())
    }

    /// Read every history row
    pub async fn applied_migrations(&self) -> MigrationResult<Vec<MigrationRecord>> {
        let sql = self.manager.applied_migrations_sql();
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await.map_err(|e| {
            MigrationError::history("Failed to query applied migrations", e)
        })?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let record = MigrationRecord {
                id: row.try_get("id").map_err(corrupt_history)?,
                checksum: row.try_get("checksum").map_err(corrupt_history)?,
                applied_at: row.try_get("applied_at").map_err(corrupt_history)?,
            };
            records.push(record);
        }

        Ok(records)
    }

    /// Load the migration files, ensure the history table and validate the
    /// files against the history. Nothing is applied.
    ///
    /// The file store is checked before the first query so a malformed or
    /// duplicated file stops the run without touching the database.
    pub async fn plan(&self) -> MigrationResult<MigrationPlan> {
        let available = self.manager.load_migrations()?;
        self.ensure_history_table().await?;
        let applied = self.applied_migrations().await?;
        planner::plan(&available, &applied)
    }

    /// Run all pending migrations
    pub async fn run_pending(&self) -> MigrationResult<MigrationRunResult> {
        let start_time = Instant::now();
        let plan = self.plan().await?;

        if plan.is_empty() {
            tracing::info!(applied = plan.applied_count, "Database is up to date");
            return Ok(MigrationRunResult {
                applied_migrations: Vec::new(),
                skipped_count: plan.applied_count,
                execution_time_ms: start_time.elapsed().as_millis(),
            });
        }

        tracing::info!(
            pending = plan.pending.len(),
            applied = plan.applied_count,
            "Applying pending migrations"
        );

        let mut applied_migration_ids = Vec::with_capacity(plan.pending.len());
        for migration in &plan.pending {
            self.apply_migration(migration).await?;
            applied_migration_ids.push(migration.id.clone());
        }

        Ok(MigrationRunResult {
            applied_migrations: applied_migration_ids,
            skipped_count: plan.applied_count,
            execution_time_ms: start_time.elapsed().as_millis(),
        })
    }

    /// Apply a single migration and record it, in one transaction.
    ///
    /// The file goes to the server as one script over the simple query
    /// protocol, so dollar-quoted bodies and literals reach it untouched.
    async fn apply_migration(&self, migration: &Migration) -> MigrationResult<()> {
        let started = Instant::now();
        tracing::info!(migration = %migration.id, name = %migration.name, "Applying migration");

        let mut transaction = self.pool.begin().await.map_err(|e| {
            MigrationError::connection(
                format!("Failed to start transaction for migration {}", migration.id),
                e,
            )
        })?;

        tracing::debug!(migration = %migration.id, "{}", migration.sql);
        (&mut *transaction)
            .execute(migration.sql.as_str())
            .await
            .map_err(|e| execution_error(migration, e))?;

        let record_sql = self.manager.record_migration_sql();
        sqlx::query(&record_sql)
            .bind(&migration.id)
            .bind(&migration.checksum)
            .execute(&mut *transaction)
            .await
            .map_err(|e| MigrationError::history(format!("Failed to record migration {}", migration.id), e))?;

        transaction.commit().await.map_err(|e| MigrationError::Execution {
            migration: migration.id.clone(),
            statement_index: None,
            statement: Some("COMMIT".to_string()),
            source: e,
        })?;

        tracing::info!(
            migration = %migration.id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Applied migration"
        );
        Ok(())
    }

    /// Get migration status for all migrations (applied and pending)
    pub async fn status(&self) -> MigrationResult<Vec<(Migration, MigrationStatus)>> {
        let available = self.manager.load_migrations()?;
        self.ensure_history_table().await?;
        let applied = self.applied_migrations().await?;
        Ok(planner::statuses(&available, &applied))
    }

    /// Release the connection
    pub async fn close(self) {
        self.pool.close().await;
        tracing::debug!("Database connection closed");
    }
}

fn corrupt_history(e: sqlx::Error) -> MigrationError {
    MigrationError::history("History table contains an unreadable row", e)
}

/// Attach the failing statement when the server reports where it stopped
fn execution_error(migration: &Migration, source: sqlx::Error) -> MigrationError {
    let located = source
        .as_database_error()
        .and_then(|e| e.try_downcast_ref::<PgDatabaseError>())
        .and_then(|e| match e.position() {
            Some(PgErrorPosition::Original(position)) => Some(position),
            _ => None,
        })
        .and_then(|position| statements::locate_statement(&migration.sql, position));

    let (statement_index, statement) = match located {
        Some((index, statement)) => (Some(index), Some(statement)),
        None => (None, None),
    };

    MigrationError::Execution {
        migration: migration.id.clone(),
        statement_index,
        statement,
        source,
    }
}
