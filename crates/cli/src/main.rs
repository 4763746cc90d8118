mod commands;

use clap::{Parser, Subcommand};
use postboard_orm::logging::{init_logging, LogFormat, LoggingConfig};
use postboard_orm::migrations::MigrationConfig;
use postboard_orm::{DatabaseConfig, MigrationError};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use commands::*;

#[derive(Parser)]
#[command(name = "postboard")]
#[command(about = "Apply and generate postboard database migrations")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", global = true, hide_env_values = true)]
    database_url: Option<String>,

    /// Directory holding the migration files
    #[arg(long, env = "POSTBOARD_MIGRATIONS_DIR", default_value = "migrations", global = true)]
    migrations_dir: PathBuf,

    /// Seconds to wait for the database connection
    #[arg(long, env = "POSTBOARD_CONNECT_TIMEOUT", default_value_t = postboard_orm::config::DEFAULT_CONNECT_TIMEOUT, global = true)]
    connect_timeout: u64,

    /// Log output format (text or json)
    #[arg(long, env = "POSTBOARD_LOG_FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Log every executed statement
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Apply pending migrations (the default)
    Migrate,

    /// Show applied and pending migrations
    Status,

    /// Write a migration file with DDL rendered from the declared schema
    Generate {
        /// Migration name, used in the file name
        #[arg(default_value = "schema")]
        name: String,
    },

    /// Validate the declared schema and the migration files without connecting
    Check,
}

impl Cli {
    fn logging_config(&self) -> LoggingConfig {
        let base = if self.verbose {
            LoggingConfig::verbose()
        } else {
            LoggingConfig::default()
        };
        base.with_format(self.log_format)
    }

    fn migration_config(&self) -> MigrationConfig {
        MigrationConfig {
            migrations_dir: self.migrations_dir.clone(),
            ..MigrationConfig::default()
        }
    }

    fn database_config(&self) -> Result<DatabaseConfig, MigrationError> {
        let url = self.database_url.as_deref().ok_or_else(|| {
            MigrationError::configuration(format!(
                "No database URL given; set {} or pass --database-url",
                postboard_orm::config::DATABASE_URL_ENV
            ))
        })?;

        let config = DatabaseConfig::new(url)?
            .with_migrations_dir(self.migrations_dir.clone())
            .with_connect_timeout(Duration::from_secs(self.connect_timeout));
        config.validate()?;
        Ok(config)
    }
}

async fn run(cli: Cli) -> Result<(), MigrationError> {
    match cli.command.as_ref().unwrap_or(&Commands::Migrate) {
        Commands::Migrate => migrate::run(&cli.database_config()?).await,
        Commands::Status => migrate::status(&cli.database_config()?).await,
        Commands::Generate { name } => generate::run(&cli.migration_config(), name),
        Commands::Check => check::run(&cli.migration_config()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli.logging_config()) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let report = anyhow::Error::from(err);
            let kind = report
                .downcast_ref::<MigrationError>()
                .map_or("unknown", MigrationError::kind);
            tracing::error!(kind, "{:#}", report);
            tracing::debug!("{:?}", report);
            ExitCode::FAILURE
        }
    }
}
