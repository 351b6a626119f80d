//! Backend-agnostic storage contracts.
//!
//! # Responsibility
//! - Define the read/write repository capabilities for countries and regions.
//! - Define the provider that owns a backend connection and hands out
//!   memoized repositories.
//!
//! # Invariants
//! - Point lookups fail with `NotFound` on a miss; they never fabricate a
//!   default value.
//! - Listings are ordered by code so pagination is stable.
//! - After `close()`, repository operations fail with `ProviderClosed`.

pub mod country_repository;
pub mod error;
pub mod region_repository;

pub use country_repository::{CountryRepository, MutableCountryRepository};
pub use error::{EntityKind, StorageError, StorageResult};
pub use region_repository::{MutableRegionRepository, RegionRepository};

use crate::code::{CountryCode, RegionCode};
use crate::model::composite::{CountryAndRegions, CountryWithRegion};
use std::sync::Arc;

/// Page size used when callers do not pick one.
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// Window over a code-ordered listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub count: u32,
    pub offset: u32,
}

impl Page {
    pub const fn new(count: u32, offset: u32) -> Self {
        Self { count, offset }
    }

    /// The page following this one, same size.
    pub const fn next(self) -> Self {
        Self {
            count: self.count,
            offset: self.offset.saturating_add(self.count),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, 0)
    }
}

/// Owner of one backend connection and factory for its repositories.
///
/// Repositories are created lazily and memoized: repeated calls return the
/// same instance for the life of the provider.
pub trait StorageProvider: Send + Sync {
    fn mutable_country_repository(&self) -> Arc<dyn MutableCountryRepository>;

    fn mutable_region_repository(&self) -> Arc<dyn MutableRegionRepository>;

    /// Releases the backend connection. Calling it again is a no-op.
    ///
    /// # Errors
    /// Surfaces a backend failure raised while closing the connection.
    fn close(&self) -> StorageResult<()>;

    fn is_closed(&self) -> bool;

    /// Loads a country and every region stored under it.
    ///
    /// # Errors
    /// Returns [`StorageError::NotFound`] when the country is not stored.
    fn load_country_and_regions(&self, code: &CountryCode) -> StorageResult<CountryAndRegions> {
        let country = self.mutable_country_repository().get(code)?;
        let regions = self.mutable_region_repository().get_all(Some(code))?;
        Ok(CountryAndRegions { country, regions })
    }

    /// Loads the region's country together with the region, if stored.
    ///
    /// # Errors
    /// Returns [`StorageError::NotFound`] when the parent country is not
    /// stored.
    fn load_country_with_region(&self, code: &RegionCode) -> StorageResult<CountryWithRegion> {
        let country = self
            .mutable_country_repository()
            .get(&code.to_country_code())?;
        let region = self.mutable_region_repository().get_or_none(code)?;
        Ok(CountryWithRegion { country, region })
    }
}
