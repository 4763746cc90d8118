use postboard_orm::migrations::statements::created_tables;
use postboard_orm::migrations::{MigrationConfig, MigrationManager};
use postboard_orm::schema::{blog, SchemaBuilder, TableDef};
use postboard_orm::{MigrationError, MigrationResult, Schema};
use std::collections::HashSet;

/// Render the declared tables that no existing migration creates and store
/// them as the next migration.
///
/// Changes to tables that already exist are not diffed; they need a
/// hand-written migration.
pub fn run(config: &MigrationConfig, name: &str) -> MigrationResult<()> {
    let schema = blog::schema();
    schema.validate()?;

    let manager = MigrationManager::with_config(config.clone());
    let existing: HashSet<String> = if config.migrations_dir.is_dir() {
        manager
            .load_migrations()?
            .iter()
            .flat_map(|migration| created_tables(&migration.sql))
            .collect()
    } else {
        HashSet::new()
    };

    let (covered, missing): (Vec<&TableDef>, Vec<&TableDef>) = schema
        .creation_order()?
        .into_iter()
        .partition(|table| existing.contains(&table.name.to_lowercase()));

    if !covered.is_empty() {
        tracing::info!(
            tables = %table_names(&covered),
            "Skipping tables created by existing migrations"
        );
    }
    if missing.is_empty() {
        return Err(MigrationError::integrity(format!(
            "Every declared table is already created by a migration in '{}'; write a migration by hand to change existing tables",
            config.migrations_dir.display()
        )));
    }

    let sql = render(&schema, &missing);
    let filename = manager.create_migration(name, &sql)?;

    println!("Created migration: {}", config.migrations_dir.join(filename).display());
    Ok(())
}

fn render(schema: &Schema, tables: &[&TableDef]) -> String {
    let mut builder = SchemaBuilder::new();
    for table in tables {
        builder.create_table(table);
    }

    format!(
        "-- Generated from the declared schema ({} of {} tables)\n-- Tables: {}\n\n{}\n",
        tables.len(),
        schema.tables.len(),
        table_names(tables),
        builder.build()
    )
}

fn table_names(tables: &[&TableDef]) -> String {
    tables.iter().map(|t| t.name.as_str()).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use postboard_orm::schema::TableBuilder;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn config_for(dir: &Path) -> MigrationConfig {
        MigrationConfig {
            migrations_dir: dir.to_path_buf(),
            ..MigrationConfig::default()
        }
    }

    fn sql_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_generate_writes_schema_migration() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_for(&temp_dir.path().join("migrations"));

        run(&config, "initial schema").unwrap();

        let path = config.migrations_dir.join("0001_initial_schema.sql");
        let content = fs::read_to_string(path).unwrap();
        assert!(content.starts_with("-- Generated from the declared schema (5 of 5 tables)"));
        assert!(content.contains("-- Tables: users, profiles, posts, categories, post_categories"));
        assert!(content.contains("CREATE TABLE IF NOT EXISTS post_categories ("));

        // the generated file is itself a loadable migration
        let migrations = MigrationManager::with_config(config).load_migrations().unwrap();
        assert_eq!(migrations.len(), 1);
        assert_eq!(migrations[0].name, "initial schema");
    }

    #[test]
    fn test_generate_skips_tables_existing_migrations_create() {
        let temp_dir = TempDir::new().unwrap();
        let users = blog::users();
        fs::write(
            temp_dir.path().join("0001_create_users.sql"),
            TableBuilder::from_table(&users).to_sql(),
        )
        .unwrap();

        run(&config_for(temp_dir.path()), "rest").unwrap();

        let content = fs::read_to_string(temp_dir.path().join("0002_rest.sql")).unwrap();
        assert!(content.contains("(4 of 5 tables)"));
        assert!(!content.contains("CREATE TABLE IF NOT EXISTS users ("));
        assert!(content.contains("CREATE TABLE IF NOT EXISTS profiles ("));
        assert!(content.contains("CREATE TABLE IF NOT EXISTS post_categories ("));
    }

    #[test]
    fn test_generate_refuses_when_every_table_exists() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("0001_schema.sql"),
            blog::schema().to_sql().unwrap(),
        )
        .unwrap();

        let err = run(&config_for(temp_dir.path()), "again").unwrap_err();
        assert_eq!(err.kind(), "integrity");
        assert_eq!(sql_files(temp_dir.path()), vec!["0001_schema.sql"]);
    }
}
