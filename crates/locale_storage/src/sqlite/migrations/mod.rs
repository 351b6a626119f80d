//! SQLite schema migrations.
//!
//! # Invariants
//! - `version` values are strictly increasing.
//! - The applied version is mirrored to `PRAGMA user_version`.
//! - Pending migrations are applied in one transaction.

use locale_core::storage::{StorageError, StorageResult};
use log::info;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("0001_init.sql"),
}];

/// Latest schema version known by this build.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies every migration newer than the database's current version.
///
/// # Errors
/// Returns [`StorageError::UnsupportedSchemaVersion`] when the database is
/// ahead of this build, or the SQLite failure of a migration step.
pub fn apply_migrations(conn: &mut Connection) -> StorageResult<()> {
    let current = ensure_supported_version_inner(conn)?;
    let latest = latest_version();
    if current == latest {
        return Ok(());
    }

    let tx = conn.transaction().map_err(StorageError::backend)?;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        tx.execute_batch(migration.sql)
            .map_err(StorageError::backend)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))
            .map_err(StorageError::backend)?;
    }
    tx.commit().map_err(StorageError::backend)?;

    info!("event=schema_migrate module=storage status=ok backend=sqlite from={current} to={latest}");
    Ok(())
}

/// Fails when the database schema is newer than this build supports.
///
/// # Errors
/// Returns [`StorageError::UnsupportedSchemaVersion`] or the SQLite failure.
pub fn ensure_supported_version(conn: &Connection) -> StorageResult<()> {
    ensure_supported_version_inner(conn).map(|_| ())
}

fn ensure_supported_version_inner(conn: &Connection) -> StorageResult<u32> {
    let current = current_user_version(conn)?;
    let latest = latest_version();
    if current > latest {
        return Err(StorageError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: latest,
        });
    }
    Ok(current)
}

fn current_user_version(conn: &Connection) -> StorageResult<u32> {
    conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))
        .map_err(StorageError::backend)
}
