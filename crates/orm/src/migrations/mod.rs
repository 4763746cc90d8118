//! Migration System
//!
//! Forward-only SQL migrations loaded from a directory, validated against
//! the history table and applied in version order.

pub mod definitions;
pub mod manager;
pub mod planner;
pub mod runner;
pub mod statements;

pub use definitions::{Migration, MigrationConfig, MigrationRecord, MigrationRunResult, MigrationStatus};
pub use manager::MigrationManager;
pub use planner::{plan, MigrationPlan};
pub use runner::MigrationRunner;
