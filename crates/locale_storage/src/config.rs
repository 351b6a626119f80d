//! Storage configuration from TOML or environment variables.
//!
//! # Responsibility
//! - Describe which backend to use and how to reach it.
//! - Build a ready (not yet connected) [`StorageProvider`] from that description.
//!
//! # Invariants
//! - Secrets are never stored in the config value; the PostgreSQL passphrase
//!   is read from its environment variable at connection time.

use crate::supplier;
use crate::SharedClock;
use locale_core::storage::StorageProvider;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const BACKEND_VAR: &str = "LOCALE_STORAGE_BACKEND";
pub const SQLITE_PATH_VAR: &str = "LOCALE_SQLITE_PATH";
pub const PG_URL_VAR: &str = "LOCALE_PG_URL";
pub const PG_USER_VAR: &str = "LOCALE_PG_USER";
pub const PG_PASSWORD_VAR: &str = "LOCALE_PG_PASSWORD";

/// Configuration failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid storage config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("environment variable `{0}` is required")]
    MissingVar(&'static str),
    #[error("unknown storage backend `{0}`; expected sqlite|postgresql")]
    UnknownBackend(String),
    #[error("backend `{0}` is not compiled into this build")]
    FeatureDisabled(&'static str),
}

/// Backend selection and connection parameters.
///
/// ```toml
/// backend = "postgresql"
/// url = "postgres://db.internal/geo"
/// username = "geo_reader"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    Sqlite {
        /// Database file; absent means in-memory.
        #[serde(default)]
        path: Option<PathBuf>,
        #[serde(default = "default_create_schema")]
        create_schema: bool,
    },
    Postgresql {
        url: String,
        #[serde(default)]
        username: Option<String>,
        /// Name of the environment variable holding the passphrase.
        #[serde(default = "default_passphrase_env")]
        passphrase_env: String,
        #[serde(default = "default_create_schema")]
        create_schema: bool,
        #[serde(default)]
        connect_timeout_secs: Option<u64>,
        #[serde(default)]
        application_name: Option<String>,
    },
}

fn default_create_schema() -> bool {
    true
}

fn default_passphrase_env() -> String {
    PG_PASSWORD_VAR.to_owned()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: None,
            create_schema: true,
        }
    }
}

impl StorageConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown backends.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Reads the process environment. See [`StorageConfig::from_lookup`].
    ///
    /// # Errors
    /// Same as [`StorageConfig::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from `LOCALE_*` variables resolved through `lookup`.
    ///
    /// The backend defaults to `sqlite`. Blank values count as unset.
    ///
    /// # Errors
    /// - [`ConfigError::UnknownBackend`] for an unrecognized backend name.
    /// - [`ConfigError::MissingVar`] when PostgreSQL is selected without a URL.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let backend = get(BACKEND_VAR).unwrap_or_else(|| "sqlite".to_owned());
        match backend.to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite {
                path: get(SQLITE_PATH_VAR).map(PathBuf::from),
                create_schema: true,
            }),
            "postgresql" | "postgres" => Ok(Self::Postgresql {
                url: get(PG_URL_VAR).ok_or(ConfigError::MissingVar(PG_URL_VAR))?,
                username: get(PG_USER_VAR),
                passphrase_env: default_passphrase_env(),
                create_schema: true,
                connect_timeout_secs: None,
                application_name: None,
            }),
            _ => Err(ConfigError::UnknownBackend(backend)),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Sqlite { .. } => "sqlite",
            Self::Postgresql { .. } => "postgresql",
        }
    }

    /// Builds the configured provider. No connection is opened yet.
    ///
    /// # Errors
    /// Returns [`ConfigError::FeatureDisabled`] when the backend was compiled
    /// out.
    pub fn into_provider(self, clock: SharedClock) -> Result<Box<dyn StorageProvider>, ConfigError> {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite {
                path,
                create_schema,
            } => {
                use crate::sqlite::{SqliteSettings, SqliteStorageProvider};
                let settings =
                    SqliteSettings::with_path(supplier::fixed(path)).create_schema(create_schema);
                Ok(Box::new(SqliteStorageProvider::new(settings, clock)))
            }
            #[cfg(not(feature = "sqlite"))]
            Self::Sqlite { .. } => Err(ConfigError::FeatureDisabled("sqlite")),
            #[cfg(feature = "postgresql")]
            Self::Postgresql {
                url,
                username,
                passphrase_env,
                create_schema,
                connect_timeout_secs,
                application_name,
            } => {
                use crate::postgresql::{PostgresSettings, PostgresStorageProvider};
                let mut settings = PostgresSettings::new(
                    supplier::fixed(url),
                    supplier::fixed(username.unwrap_or_default()),
                    supplier::env_var(passphrase_env),
                )
                .create_schema(create_schema);
                if let Some(secs) = connect_timeout_secs {
                    settings = settings.connect_timeout(std::time::Duration::from_secs(secs));
                }
                if let Some(name) = application_name {
                    settings = settings.application_name(name);
                }
                Ok(Box::new(PostgresStorageProvider::new(settings, clock)))
            }
            #[cfg(not(feature = "postgresql"))]
            Self::Postgresql { .. } => Err(ConfigError::FeatureDisabled("postgresql")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, StorageConfig, PG_PASSWORD_VAR};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn toml_selects_postgresql_with_defaults() {
        let config = StorageConfig::from_toml_str(
            r#"
            backend = "postgresql"
            url = "postgres://localhost/geo"
            username = "reader"
            "#,
        )
        .unwrap();

        assert_eq!(
            config,
            StorageConfig::Postgresql {
                url: "postgres://localhost/geo".to_owned(),
                username: Some("reader".to_owned()),
                passphrase_env: PG_PASSWORD_VAR.to_owned(),
                create_schema: true,
                connect_timeout_secs: None,
                application_name: None,
            }
        );
    }

    #[test]
    fn toml_rejects_unknown_backend() {
        let err = StorageConfig::from_toml_str(r#"backend = "oracle""#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn environment_defaults_to_in_memory_sqlite() {
        let config = StorageConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, StorageConfig::default());
    }

    #[test]
    fn environment_reads_sqlite_path() {
        let config = StorageConfig::from_lookup(lookup(&[
            ("LOCALE_STORAGE_BACKEND", "SQLite"),
            ("LOCALE_SQLITE_PATH", "/var/lib/locale/geo.db"),
        ]))
        .unwrap();
        assert_eq!(
            config,
            StorageConfig::Sqlite {
                path: Some(PathBuf::from("/var/lib/locale/geo.db")),
                create_schema: true,
            }
        );
    }

    #[test]
    fn postgresql_requires_a_url() {
        let err = StorageConfig::from_lookup(lookup(&[
            ("LOCALE_STORAGE_BACKEND", "postgresql"),
            ("LOCALE_PG_URL", "  "),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("LOCALE_PG_URL")));
    }

    #[test]
    fn unknown_environment_backend_is_rejected() {
        let err =
            StorageConfig::from_lookup(lookup(&[("LOCALE_STORAGE_BACKEND", "mysql")])).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownBackend(name) if name == "mysql"));
    }
}
