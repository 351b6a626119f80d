//! SQLite connection bootstrap.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure the pragmas storage relies on.
//! - Bring the schema up to date before the connection is handed out.
//!
//! # Invariants
//! - Returned connections have a busy timeout and `foreign_keys = ON`.
//! - When schema creation is requested, migrations are fully applied.
//! - Otherwise an existing schema newer than this build is rejected.

use super::migrations::{apply_migrations, ensure_supported_version};
use super::SqliteSettings;
use locale_core::storage::{StorageError, StorageResult};
use log::{error, info};
use rusqlite::Connection;
use std::time::Instant;

/// Opens the database described by `settings`.
///
/// A missing or blank path opens a private in-memory database.
///
/// # Errors
/// Returns the SQLite failure, or
/// [`StorageError::UnsupportedSchemaVersion`] for a newer schema.
pub fn open_database(settings: &SqliteSettings) -> StorageResult<Connection> {
    let path = (settings.path)().filter(|path| !path.as_os_str().is_empty());
    let mode = if path.is_some() { "file" } else { "memory" };
    let started_at = Instant::now();
    info!("event=sqlite_open module=storage status=start mode={mode}");

    let opened = match path.as_deref() {
        Some(path) => Connection::open(path),
        None => Connection::open_in_memory(),
    };
    let mut conn = match opened {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=sqlite_open module=storage status=error mode={} duration_ms={} error_code=open_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(StorageError::backend(err));
        }
    };

    match bootstrap_connection(&mut conn, settings) {
        Ok(()) => {
            info!(
                "event=sqlite_open module=storage status=ok mode={} duration_ms={}",
                mode,
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=sqlite_open module=storage status=error mode={} duration_ms={} error_code=bootstrap_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &mut Connection, settings: &SqliteSettings) -> StorageResult<()> {
    conn.busy_timeout(settings.busy_timeout)
        .map_err(StorageError::backend)?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(StorageError::backend)?;
    if settings.create_schema {
        apply_migrations(conn)
    } else {
        ensure_supported_version(conn)
    }
}
