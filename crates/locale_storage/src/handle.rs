//! Lazily opened, provider-owned database handle.
//!
//! # Responsibility
//! - Open the backend connection on first use and cache it.
//! - Hand the cached connection to one operation at a time.
//! - Close it exactly once and refuse further use afterwards.
//!
//! # Invariants
//! - State moves `Idle -> Open -> Closed` or `Idle -> Closed`; never back.
//! - The guard is released on every exit path, including unwinding.

use locale_core::storage::{StorageError, StorageResult};
use log::{error, info};
use parking_lot::Mutex;
use std::time::Instant;

/// Opens and closes connections for one backend.
pub trait ConnectionFactory: Send + Sync {
    type Connection: Send;

    /// Backend name used in log events.
    fn backend(&self) -> &'static str;

    /// Opens a ready-to-use connection (schema applied when configured).
    ///
    /// # Errors
    /// Returns the backend failure unchanged inside [`StorageError::Backend`].
    fn connect(&self) -> StorageResult<Self::Connection>;

    /// Closes a connection previously returned by `connect`.
    ///
    /// # Errors
    /// Returns a backend failure raised while closing.
    fn disconnect(&self, connection: Self::Connection) -> StorageResult<()> {
        drop(connection);
        Ok(())
    }
}

enum HandleState<C> {
    Idle,
    Open(C),
    Closed,
}

/// Single cached connection shared by every repository of one provider.
pub struct DatabaseHandle<F: ConnectionFactory> {
    factory: F,
    state: Mutex<HandleState<F::Connection>>,
}

impl<F: ConnectionFactory> DatabaseHandle<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            state: Mutex::new(HandleState::Idle),
        }
    }

    pub fn backend(&self) -> &'static str {
        self.factory.backend()
    }

    /// Runs `op` against the cached connection, opening it first if needed.
    ///
    /// # Errors
    /// - [`StorageError::ProviderClosed`] after [`DatabaseHandle::close`].
    /// - Connection failures from the factory.
    /// - Whatever `op` returns.
    pub fn with_connection<T>(
        &self,
        op: impl FnOnce(&mut F::Connection) -> StorageResult<T>,
    ) -> StorageResult<T> {
        let mut state = self.state.lock();
        if matches!(*state, HandleState::Idle) {
            *state = HandleState::Open(self.open()?);
        }
        match &mut *state {
            HandleState::Open(connection) => op(connection),
            HandleState::Idle | HandleState::Closed => Err(StorageError::ProviderClosed),
        }
    }

    /// Closes the connection if it was opened. Idempotent.
    ///
    /// # Errors
    /// Returns a backend failure raised while closing; the handle is closed
    /// regardless.
    pub fn close(&self) -> StorageResult<()> {
        let previous = std::mem::replace(&mut *self.state.lock(), HandleState::Closed);
        match previous {
            HandleState::Open(connection) => {
                let result = self.factory.disconnect(connection);
                match &result {
                    Ok(()) => info!(
                        "event=db_close module=storage status=ok backend={}",
                        self.backend()
                    ),
                    Err(err) => error!(
                        "event=db_close module=storage status=error backend={} error={}",
                        self.backend(),
                        err
                    ),
                }
                result
            }
            HandleState::Idle | HandleState::Closed => Ok(()),
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(*self.state.lock(), HandleState::Closed)
    }

    pub fn is_open(&self) -> bool {
        matches!(*self.state.lock(), HandleState::Open(_))
    }

    fn open(&self) -> StorageResult<F::Connection> {
        let started_at = Instant::now();
        match self.factory.connect() {
            Ok(connection) => {
                info!(
                    "event=db_open module=storage status=ok backend={} duration_ms={}",
                    self.backend(),
                    started_at.elapsed().as_millis()
                );
                Ok(connection)
            }
            Err(err) => {
                error!(
                    "event=db_open module=storage status=error backend={} duration_ms={} error={}",
                    self.backend(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }
}
