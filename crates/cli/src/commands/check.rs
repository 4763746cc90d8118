use postboard_orm::migrations::{MigrationConfig, MigrationManager};
use postboard_orm::schema::blog;
use postboard_orm::MigrationResult;

/// Validate the declared schema and the migration directory. No database
/// connection is made.
pub fn run(config: &MigrationConfig) -> MigrationResult<()> {
    let schema = blog::schema();
    schema.validate()?;
    let order = schema.creation_order()?;
    println!(
        "Schema OK: {} tables, {} relationships",
        order.len(),
        schema.relationships.len()
    );

    let manager = MigrationManager::with_config(config.clone());
    let migrations = manager.load_migrations()?;
    println!(
        "Migrations OK: {} file(s) in {}",
        migrations.len(),
        config.migrations_dir.display()
    );
    for migration in &migrations {
        let statements = manager.split_sql_statements(&migration.sql).len();
        println!("  {}  {} ({} statement(s))", migration.version, migration.name, statements);

        if let Some(warning) = manager.parser_warning(&migration.sql) {
            tracing::warn!(migration = %migration.id, "SQL parser could not read the file, the server will be the judge: {}", warning);
        }
    }

    Ok(())
}
