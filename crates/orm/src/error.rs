//! Error types for schema validation and migrations
//!
//! Every failure the migrator can hit maps to one `MigrationError` variant so
//! operators (and deployment tooling reading the logs) can tell a bad
//! connection string apart from a broken migration file or a failing
//! statement.

use thiserror::Error;

/// Result type alias for migration operations
pub type MigrationResult<T> = Result<T, MigrationError>;

/// Result type alias for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Error types for the migration runner
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Missing or invalid connection string or runner option
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Database unreachable, authentication rejected or connect timeout
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<sqlx::Error>,
    },

    /// Migration files are malformed or disagree with the history table
    #[error("Migration integrity error: {message}")]
    Integrity { message: String },

    /// The history table could not be created or read
    #[error("Migration history error: {message}")]
    History {
        message: String,
        #[source]
        source: Option<sqlx::Error>,
    },

    /// A migration failed on the server. The statement is known when the
    /// server reports an error position.
    #[error("Failed to execute migration {migration}{}", statement_suffix(.statement_index))]
    Execution {
        migration: String,
        statement_index: Option<usize>,
        statement: Option<String>,
        #[source]
        source: sqlx::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl MigrationError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>, source: sqlx::Error) -> Self {
        Self::Connection {
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity {
            message: message.into(),
        }
    }

    pub fn history(message: impl Into<String>, source: sqlx::Error) -> Self {
        Self::History {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Short machine-friendly name of the error kind, used as a log field
    pub fn kind(&self) -> &'static str {
        match self {
            MigrationError::Configuration { .. } => "configuration",
            MigrationError::Connection { .. } => "connection",
            MigrationError::Integrity { .. } => "integrity",
            MigrationError::History { .. } => "history",
            MigrationError::Execution { .. } => "execution",
            MigrationError::Io(_) => "io",
            MigrationError::Schema(_) => "schema",
        }
    }
}

/// A single structural problem found in a schema declaration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    #[error("table '{table}' is declared more than once")]
    DuplicateTable { table: String },

    #[error("column '{column}' is declared more than once in table '{table}'")]
    DuplicateColumn { table: String, column: String },

    #[error("table '{table}' has no primary key")]
    MissingPrimaryKey { table: String },

    #[error("table '{table}' declares both column-level and composite primary keys")]
    ConflictingPrimaryKey { table: String },

    #[error("key of table '{table}' names unknown column '{column}'")]
    UnknownKeyColumn { table: String, column: String },

    #[error("key of table '{table}' repeats column '{column}'")]
    RepeatedKeyColumn { table: String, column: String },

    #[error("{table}.{column} references unknown table '{target_table}'")]
    UnknownReferencedTable {
        table: String,
        column: String,
        target_table: String,
    },

    #[error("{table}.{column} references {target_table}.{target_column}, which is not its primary key")]
    ForeignKeyNotPrimary {
        table: String,
        column: String,
        target_table: String,
        target_column: String,
    },

    #[error("{table}.{column} has a type incompatible with {target_table}.{target_column}")]
    IncompatibleForeignKeyType {
        table: String,
        column: String,
        target_table: String,
        target_column: String,
    },

    #[error("relationship '{relationship}' on table '{table}' is invalid: {reason}")]
    InvalidRelationship {
        table: String,
        relationship: String,
        reason: String,
    },
}

/// Error types for schema operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Schema has {} violation(s): {}", .0.len(), join_violations(.0))]
    Invalid(Vec<SchemaViolation>),

    #[error("Circular foreign key dependency between tables: {}", .tables.join(", "))]
    CircularDependency { tables: Vec<String> },
}

fn statement_suffix(index: &Option<usize>) -> String {
    index.map_or_else(String::new, |index| format!(" (statement {})", index))
}

fn join_violations(violations: &[SchemaViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
