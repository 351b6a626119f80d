//! Row timestamps and their per-backend encodings.
//!
//! `created`/`updated` live only in storage rows. All encodings are UTC.

use chrono::{DateTime, Utc};

/// Storage-only bookkeeping for one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowTimestamps {
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// Epoch-millisecond integers, as used by the embedded engine.
#[cfg(feature = "sqlite")]
pub(crate) mod millis {
    use chrono::{DateTime, Utc};
    use locale_core::storage::{StorageError, StorageResult};

    pub(crate) fn encode(value: DateTime<Utc>) -> i64 {
        value.timestamp_millis()
    }

    pub(crate) fn decode(value: i64) -> StorageResult<DateTime<Utc>> {
        DateTime::from_timestamp_millis(value).ok_or_else(|| {
            StorageError::InvalidData(format!("timestamp {value}ms is out of range"))
        })
    }
}

/// Offset date-times pinned to UTC, as used by the client/server engine.
#[cfg(feature = "postgresql")]
pub(crate) mod offset {
    use chrono::{DateTime, FixedOffset, Utc};

    pub(crate) fn encode(value: DateTime<Utc>) -> DateTime<FixedOffset> {
        value.fixed_offset()
    }

    pub(crate) fn decode(value: DateTime<FixedOffset>) -> DateTime<Utc> {
        value.with_timezone(&Utc)
    }
}
