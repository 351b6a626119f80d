//! SQL storage backends for `locale_core`.
//!
//! # Responsibility
//! - Implement the repository and provider contracts over SQLite (`sqlite`
//!   feature) and PostgreSQL (`postgresql` feature).
//! - Build providers from deferred connection parameters or a
//!   [`StorageConfig`].
//!
//! # Invariants
//! - Every operation blocks the calling thread; async callers should run it
//!   on their blocking pool.
//! - A provider owns exactly one connection, opened on first use.

pub mod config;
pub mod handle;
#[cfg(feature = "postgresql")]
pub mod postgresql;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod supplier;
pub mod timestamp;

pub use config::{ConfigError, StorageConfig};
pub use supplier::Supplier;
pub use timestamp::RowTimestamps;

use mockable::{Clock, DefaultClock};
use std::sync::Arc;

/// Clock used to stamp `created`/`updated`.
pub type SharedClock = Arc<dyn Clock + Send + Sync>;

/// Wall clock.
pub fn system_clock() -> SharedClock {
    Arc::new(DefaultClock)
}

/// SQLite provider reading its database path from `path` at connection time.
///
/// A `None` or blank path opens a private in-memory database.
#[cfg(feature = "sqlite")]
pub fn sqlite(
    path: Supplier<Option<std::path::PathBuf>>,
    clock: SharedClock,
) -> sqlite::SqliteStorageProvider {
    sqlite::SqliteStorageProvider::new(sqlite::SqliteSettings::with_path(path), clock)
}

/// PostgreSQL provider whose URL and credentials are fetched at connection
/// time.
#[cfg(feature = "postgresql")]
pub fn postgresql(
    url: Supplier<String>,
    username: Supplier<String>,
    passphrase: Supplier<String>,
    clock: SharedClock,
) -> postgresql::PostgresStorageProvider {
    postgresql::PostgresStorageProvider::new(
        postgresql::PostgresSettings::new(url, username, passphrase),
        clock,
    )
}
