//! # postboard-orm
//!
//! Schema definition and migration runner for the postboard database.
//!
//! The [`schema`] module declares the users, profiles, posts, categories and
//! post/category tables together with their relationships. The
//! [`migrations`] module applies ordered SQL change-sets to PostgreSQL,
//! recording each one in a history table so a second run applies nothing.

pub mod config;
pub mod entities;
pub mod error;
pub mod logging;
pub mod migrations;
pub mod schema;

pub use config::DatabaseConfig;
pub use entities::{Category, Entity, Post, PostCategory, Profile, User};
pub use error::{MigrationError, MigrationResult, SchemaError, SchemaResult, SchemaViolation};
pub use migrations::{
    Migration, MigrationConfig, MigrationManager, MigrationPlan, MigrationRecord, MigrationRunResult,
    MigrationRunner, MigrationStatus,
};
pub use schema::Schema;
