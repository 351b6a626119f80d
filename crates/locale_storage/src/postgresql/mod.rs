//! PostgreSQL backend over the blocking `postgres` client.
//!
//! # Responsibility
//! - Connect with credentials fetched at connection time, not construction.
//! - Create the idempotent schema when asked to.
//! - Serve memoized country/region repositories over one client.
//!
//! # Invariants
//! - Passphrases are never logged or printed by `Debug`.
//! - Timestamps are written as `TIMESTAMPTZ` at UTC.

mod country_source;
mod region_source;

pub use country_source::PostgresCountrySource;
pub use region_source::PostgresRegionSource;

use crate::handle::{ConnectionFactory, DatabaseHandle};
use crate::supplier::{self, Supplier};
use crate::{system_clock, SharedClock};
use locale_core::storage::{
    MutableCountryRepository, MutableRegionRepository, StorageError, StorageProvider,
    StorageResult,
};
use log::{error, info};
use once_cell::sync::OnceCell;
use postgres::{Client, Config, NoTls};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::{Duration, Instant};

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Connection parameters for a PostgreSQL server.
#[derive(Clone)]
pub struct PostgresSettings {
    /// `postgres://host:port/db` or key/value connection string.
    pub url: Supplier<String>,
    /// Overrides the URL's user when non-empty.
    pub username: Supplier<String>,
    /// Overrides the URL's password when non-empty.
    pub passphrase: Supplier<String>,
    pub create_schema: bool,
    pub connect_timeout: Option<Duration>,
    pub application_name: Option<String>,
}

impl PostgresSettings {
    pub fn new(
        url: Supplier<String>,
        username: Supplier<String>,
        passphrase: Supplier<String>,
    ) -> Self {
        Self {
            url,
            username,
            passphrase,
            create_schema: true,
            connect_timeout: None,
            application_name: None,
        }
    }

    /// Settings taking everything, credentials included, from `url`.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self::new(
            supplier::fixed(url.into()),
            supplier::fixed(String::new()),
            supplier::fixed(String::new()),
        )
    }

    pub fn create_schema(mut self, create_schema: bool) -> Self {
        self.create_schema = create_schema;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = Some(name.into());
        self
    }

    fn client_config(&self) -> StorageResult<Config> {
        let mut config: Config = (self.url)().parse().map_err(StorageError::backend)?;
        let username = (self.username)();
        if !username.is_empty() {
            config.user(&username);
        }
        let passphrase = (self.passphrase)();
        if !passphrase.is_empty() {
            config.password(passphrase.as_bytes());
        }
        if let Some(timeout) = self.connect_timeout {
            config.connect_timeout(timeout);
        }
        if let Some(name) = self.application_name.as_deref() {
            config.application_name(name);
        }
        Ok(config)
    }
}

impl Debug for PostgresSettings {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresSettings")
            .field("url", &"<deferred>")
            .field("username", &"<deferred>")
            .field("passphrase", &"<redacted>")
            .field("create_schema", &self.create_schema)
            .field("connect_timeout", &self.connect_timeout)
            .field("application_name", &self.application_name)
            .finish()
    }
}

/// Connects to the server described by `settings`.
///
/// # Errors
/// Returns the client failure for a bad URL, refused connection, rejected
/// credentials or failed schema creation.
pub fn connect_client(settings: &PostgresSettings) -> StorageResult<Client> {
    let started_at = Instant::now();
    let result = settings.client_config().and_then(|config| {
        let mut client = config.connect(NoTls).map_err(StorageError::backend)?;
        if settings.create_schema {
            client
                .batch_execute(SCHEMA_SQL)
                .map_err(StorageError::backend)?;
            info!("event=schema_migrate module=storage status=ok backend=postgresql");
        }
        Ok(client)
    });
    match &result {
        Ok(_) => info!(
            "event=postgres_connect module=storage status=ok duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=postgres_connect module=storage status=error duration_ms={} error={}",
            started_at.elapsed().as_millis(),
            err
        ),
    }
    result
}

/// Opens PostgreSQL clients from [`PostgresSettings`].
#[derive(Debug, Clone)]
pub struct PostgresConnectionFactory {
    settings: PostgresSettings,
}

impl PostgresConnectionFactory {
    pub fn new(settings: PostgresSettings) -> Self {
        Self { settings }
    }
}

impl ConnectionFactory for PostgresConnectionFactory {
    type Connection = Client;

    fn backend(&self) -> &'static str {
        "postgresql"
    }

    fn connect(&self) -> StorageResult<Client> {
        connect_client(&self.settings)
    }

    fn disconnect(&self, connection: Client) -> StorageResult<()> {
        connection.close().map_err(StorageError::backend)
    }
}

pub(crate) type PostgresDatabase = DatabaseHandle<PostgresConnectionFactory>;

/// Storage provider over one PostgreSQL client.
pub struct PostgresStorageProvider {
    database: Arc<PostgresDatabase>,
    clock: SharedClock,
    countries: OnceCell<Arc<PostgresCountrySource>>,
    regions: OnceCell<Arc<PostgresRegionSource>>,
}

impl PostgresStorageProvider {
    /// Creates a provider; the server is not contacted until first use.
    pub fn new(settings: PostgresSettings, clock: SharedClock) -> Self {
        Self {
            database: Arc::new(DatabaseHandle::new(PostgresConnectionFactory::new(
                settings,
            ))),
            clock,
            countries: OnceCell::new(),
            regions: OnceCell::new(),
        }
    }

    /// Provider for `url` using the system clock.
    pub fn connect(url: impl Into<String>) -> Self {
        Self::new(PostgresSettings::from_url(url), system_clock())
    }

    pub fn countries(&self) -> Arc<PostgresCountrySource> {
        Arc::clone(self.countries.get_or_init(|| {
            Arc::new(PostgresCountrySource::new(
                Arc::clone(&self.database),
                Arc::clone(&self.clock),
            ))
        }))
    }

    pub fn regions(&self) -> Arc<PostgresRegionSource> {
        Arc::clone(self.regions.get_or_init(|| {
            Arc::new(PostgresRegionSource::new(
                Arc::clone(&self.database),
                Arc::clone(&self.clock),
            ))
        }))
    }
}

impl Debug for PostgresStorageProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresStorageProvider")
            .field("closed", &self.database.is_closed())
            .finish_non_exhaustive()
    }
}

impl StorageProvider for PostgresStorageProvider {
    fn mutable_country_repository(&self) -> Arc<dyn MutableCountryRepository> {
        self.countries()
    }

    fn mutable_region_repository(&self) -> Arc<dyn MutableRegionRepository> {
        self.regions()
    }

    fn close(&self) -> StorageResult<()> {
        info!("event=provider_close module=storage status=start backend=postgresql");
        self.database.close()
    }

    fn is_closed(&self) -> bool {
        self.database.is_closed()
    }
}
