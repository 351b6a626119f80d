//! Embedded SQLite backend.
//!
//! # Responsibility
//! - Open one SQLite connection per provider, lazily, from deferred settings.
//! - Serve memoized country/region repositories over that connection.
//!
//! # Invariants
//! - Codes are stored upper-case; timestamps as UTC epoch milliseconds.
//! - After `close()` every repository call fails with `ProviderClosed`.

mod country_source;
pub mod migrations;
mod open;
mod region_source;

pub use country_source::SqliteCountrySource;
pub use open::open_database;
pub use region_source::SqliteRegionSource;

use crate::handle::{ConnectionFactory, DatabaseHandle};
use crate::supplier::{self, Supplier};
use crate::{system_clock, SharedClock};
use locale_core::storage::{
    MutableCountryRepository, MutableRegionRepository, StorageError, StorageProvider,
    StorageResult,
};
use log::info;
use once_cell::sync::OnceCell;
use rusqlite::Connection;
use std::fmt::{Debug, Formatter};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection parameters for the embedded engine.
#[derive(Clone)]
pub struct SqliteSettings {
    /// Database file, read at connection time. `None` means in-memory.
    pub path: Supplier<Option<PathBuf>>,
    /// Apply migrations when connecting.
    pub create_schema: bool,
    pub busy_timeout: Duration,
}

impl SqliteSettings {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::with_path(supplier::fixed(Some(path.into())))
    }

    pub fn in_memory() -> Self {
        Self::with_path(supplier::fixed(None))
    }

    pub fn with_path(path: Supplier<Option<PathBuf>>) -> Self {
        Self {
            path,
            create_schema: true,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn create_schema(mut self, create_schema: bool) -> Self {
        self.create_schema = create_schema;
        self
    }

    pub fn busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }
}

impl Debug for SqliteSettings {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteSettings")
            .field("path", &"<deferred>")
            .field("create_schema", &self.create_schema)
            .field("busy_timeout", &self.busy_timeout)
            .finish()
    }
}

/// Opens SQLite connections from [`SqliteSettings`].
#[derive(Debug, Clone)]
pub struct SqliteConnectionFactory {
    settings: SqliteSettings,
}

impl SqliteConnectionFactory {
    pub fn new(settings: SqliteSettings) -> Self {
        Self { settings }
    }
}

impl ConnectionFactory for SqliteConnectionFactory {
    type Connection = Connection;

    fn backend(&self) -> &'static str {
        "sqlite"
    }

    fn connect(&self) -> StorageResult<Connection> {
        open_database(&self.settings)
    }

    fn disconnect(&self, connection: Connection) -> StorageResult<()> {
        connection
            .close()
            .map_err(|(_, err)| StorageError::backend(err))
    }
}

pub(crate) type SqliteDatabase = DatabaseHandle<SqliteConnectionFactory>;

/// Matches `code` against a JSON array bound as `?1`.
///
/// One bound value keeps batch lookups clear of `SQLITE_MAX_VARIABLE_NUMBER`.
const CODE_IN_JSON_SQL: &str = "code IN (SELECT value FROM json_each(?1))";

/// JSON array of `codes`, bound against [`CODE_IN_JSON_SQL`].
fn code_array<'a>(codes: impl Iterator<Item = &'a str>) -> StorageResult<String> {
    serde_json::to_string(&codes.collect::<Vec<_>>()).map_err(StorageError::backend)
}

/// Storage provider over one embedded SQLite database.
pub struct SqliteStorageProvider {
    database: Arc<SqliteDatabase>,
    clock: SharedClock,
    countries: OnceCell<Arc<SqliteCountrySource>>,
    regions: OnceCell<Arc<SqliteRegionSource>>,
}

impl SqliteStorageProvider {
    /// Creates a provider; nothing is opened until the first repository call.
    pub fn new(settings: SqliteSettings, clock: SharedClock) -> Self {
        Self {
            database: Arc::new(DatabaseHandle::new(SqliteConnectionFactory::new(settings))),
            clock,
            countries: OnceCell::new(),
            regions: OnceCell::new(),
        }
    }

    /// File-backed provider using the system clock.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(SqliteSettings::file(path), system_clock())
    }

    /// Private in-memory provider using the system clock.
    pub fn in_memory() -> Self {
        Self::new(SqliteSettings::in_memory(), system_clock())
    }

    /// Memoized country repository with backend-specific extras.
    pub fn countries(&self) -> Arc<SqliteCountrySource> {
        Arc::clone(self.countries.get_or_init(|| {
            Arc::new(SqliteCountrySource::new(
                Arc::clone(&self.database),
                Arc::clone(&self.clock),
            ))
        }))
    }

    /// Memoized region repository with backend-specific extras.
    pub fn regions(&self) -> Arc<SqliteRegionSource> {
        Arc::clone(self.regions.get_or_init(|| {
            Arc::new(SqliteRegionSource::new(
                Arc::clone(&self.database),
                Arc::clone(&self.clock),
            ))
        }))
    }
}

impl Debug for SqliteStorageProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStorageProvider")
            .field("closed", &self.database.is_closed())
            .finish_non_exhaustive()
    }
}

impl StorageProvider for SqliteStorageProvider {
    fn mutable_country_repository(&self) -> Arc<dyn MutableCountryRepository> {
        self.countries()
    }

    fn mutable_region_repository(&self) -> Arc<dyn MutableRegionRepository> {
        self.regions()
    }

    fn close(&self) -> StorageResult<()> {
        info!("event=provider_close module=storage status=start backend=sqlite");
        self.database.close()
    }

    fn is_closed(&self) -> bool {
        self.database.is_closed()
    }
}
