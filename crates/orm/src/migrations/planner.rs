//! Migration Planner - decides which migrations are pending
//!
//! Planning is pure: it compares the file store with the history table and
//! either returns the ordered pending list or rejects the run before any
//! migration SQL executes.

use std::collections::HashMap;

use super::definitions::{Migration, MigrationRecord, MigrationStatus};
use crate::error::{MigrationError, MigrationResult};

/// The validated outcome of comparing files with history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPlan {
    /// Migrations to apply, in strictly increasing version order
    pub pending: Vec<Migration>,
    /// Number of migrations already recorded as applied
    pub applied_count: usize,
}

impl MigrationPlan {
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Compute the pending migrations.
///
/// `available` must be sorted by version, as returned by
/// [`MigrationManager::load_migrations`](super::manager::MigrationManager::load_migrations).
///
/// Rejects the run when an applied migration is missing from the file store,
/// when an applied file was edited afterwards, or when a pending migration
/// sorts before the newest applied one.
pub fn plan(available: &[Migration], applied: &[MigrationRecord]) -> MigrationResult<MigrationPlan> {
    let by_id: HashMap<&str, &Migration> = available.iter().map(|m| (m.id.as_str(), m)).collect();

    let mut newest_applied: Option<&Migration> = None;
    for record in applied {
        let migration = by_id.get(record.id.as_str()).copied().ok_or_else(|| {
            MigrationError::integrity(format!(
                "Migration '{}' is recorded as applied but has no file in the migrations directory",
                record.id
            ))
        })?;

        if migration.checksum != record.checksum {
            return Err(MigrationError::integrity(format!(
                "Migration '{}' was modified after it was applied (checksum {} != {})",
                record.id, migration.checksum, record.checksum
            )));
        }

        if newest_applied.map_or(true, |newest| migration.version_number() > newest.version_number()) {
            newest_applied = Some(migration);
        }
    }

    let applied_ids: Vec<&str> = applied.iter().map(|r| r.id.as_str()).collect();
    let pending: Vec<Migration> = available
        .iter()
        .filter(|m| !applied_ids.contains(&m.id.as_str()))
        .cloned()
        .collect();

    if let (Some(newest), Some(first_pending)) = (newest_applied, pending.first()) {
        if first_pending.version_number() < newest.version_number() {
            return Err(MigrationError::integrity(format!(
                "Migration '{}' is older than already applied migration '{}'; \
                 new migrations must use a higher version",
                first_pending.id, newest.id
            )));
        }
    }

    for pair in pending.windows(2) {
        if pair[0].version_number() >= pair[1].version_number() {
            return Err(MigrationError::integrity(format!(
                "Migrations '{}' and '{}' are not in strictly increasing version order",
                pair[0].id, pair[1].id
            )));
        }
    }

    Ok(MigrationPlan {
        pending,
        applied_count: applied.len(),
    })
}

/// Pair every migration file with its status
pub fn statuses(available: &[Migration], applied: &[MigrationRecord]) -> Vec<(Migration, MigrationStatus)> {
    available
        .iter()
        .map(|migration| {
            let status = applied
                .iter()
                .find(|r| r.id == migration.id)
                .map_or(MigrationStatus::Pending, |r| MigrationStatus::Applied {
                    applied_at: r.applied_at,
                });
            (migration.clone(), status)
        })
        .collect()
}
