use postboard_orm::{DatabaseConfig, MigrationResult, MigrationRunner, MigrationStatus};

/// Apply every pending migration.
///
/// The connection is closed whether or not the run succeeds.
pub async fn run(config: &DatabaseConfig) -> MigrationResult<()> {
    tracing::info!(dir = %config.migrations.migrations_dir.display(), "Running migrations...");

    let runner = MigrationRunner::connect(config).await?;
    let outcome = runner.run_pending().await;
    runner.close().await;
    let result = outcome?;

    tracing::info!(
        applied = result.applied_count(),
        skipped = result.skipped_count,
        elapsed_ms = result.execution_time_ms as u64,
        "Migrations complete."
    );
    Ok(())
}

/// Print every migration with its applied/pending state
pub async fn status(config: &DatabaseConfig) -> MigrationResult<()> {
    let runner = MigrationRunner::connect(config).await?;
    let outcome = runner.status().await;
    runner.close().await;
    let statuses = outcome?;

    println!("Migration Status:");
    println!("================");

    if statuses.is_empty() {
        println!("No migrations found");
        return Ok(());
    }

    let mut pending = 0;
    for (migration, status) in &statuses {
        match status {
            MigrationStatus::Applied { applied_at } => {
                println!("  [applied] {}  ({})", migration.id, applied_at.format("%Y-%m-%d %H:%M:%S UTC"));
            }
            MigrationStatus::Pending => {
                pending += 1;
                println!("  [pending] {}", migration.id);
            }
        }
    }

    println!("\n{} applied, {} pending", statuses.len() - pending, pending);
    Ok(())
}
