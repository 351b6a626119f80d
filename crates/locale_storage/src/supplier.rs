//! Deferred connection parameters.
//!
//! Suppliers are evaluated when a connection is opened, not when a provider
//! is built, so credentials can rotate between construction and first use.

use std::sync::Arc;

/// A value produced on demand.
pub type Supplier<T> = Arc<dyn Fn() -> T + Send + Sync>;

/// Supplier that always yields a clone of `value`.
pub fn fixed<T>(value: T) -> Supplier<T>
where
    T: Clone + Send + Sync + 'static,
{
    Arc::new(move || value.clone())
}

/// Supplier reading environment variable `name` at call time.
///
/// An unset or non-UTF-8 variable yields an empty string.
pub fn env_var(name: impl Into<String>) -> Supplier<String> {
    let name = name.into();
    Arc::new(move || std::env::var(&name).unwrap_or_default())
}
