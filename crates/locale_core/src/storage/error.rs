//! Storage error taxonomy shared by every backend.

use crate::code::InvalidLocationCode;
use std::error::Error;
use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

/// Entity kinds managed by repositories; used in error reports and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Country,
    Region,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Country => "country",
            Self::Region => "region",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures raised by repositories and storage providers.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Point lookup or update found no row for the code.
    #[error("no {entity} found with code `{code}`")]
    NotFound { entity: EntityKind, code: String },
    /// Insert targeted a code that is already stored.
    #[error("{entity} with code `{code}` already exists")]
    AlreadyExists { entity: EntityKind, code: String },
    /// The provider was closed; its repositories are unusable.
    #[error("storage provider is closed")]
    ProviderClosed,
    /// Database schema is newer than this build understands.
    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion { db_version: u32, latest_supported: u32 },
    /// A persisted row could not be mapped back to a domain value.
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
    /// Untouched driver/engine failure (connectivity, constraint, I/O).
    #[error("storage backend failure: {0}")]
    Backend(#[source] Box<dyn Error + Send + Sync>),
}

impl StorageError {
    pub fn not_found(entity: EntityKind, code: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            code: code.into(),
        }
    }

    pub fn already_exists(entity: EntityKind, code: impl Into<String>) -> Self {
        Self::AlreadyExists {
            entity,
            code: code.into(),
        }
    }

    pub fn backend(err: impl Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(err))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<InvalidLocationCode> for StorageError {
    fn from(value: InvalidLocationCode) -> Self {
        Self::InvalidData(value.to_string())
    }
}
