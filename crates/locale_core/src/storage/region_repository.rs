//! Region repository contracts.
//!
//! Every listing and counting operation takes an optional parent country;
//! when present only regions whose code prefix matches are considered.

use super::error::{StorageError, StorageResult};
use super::Page;
use crate::code::{CountryCode, RegionCode};
use crate::model::region::Region;

/// Read access to stored regions.
pub trait RegionRepository: Send + Sync {
    fn count(&self, country: Option<&CountryCode>) -> StorageResult<u64>;

    /// Point lookup by code.
    ///
    /// # Errors
    /// Returns [`StorageError::NotFound`] when no region has `code`.
    fn get(&self, code: &RegionCode) -> StorageResult<Region>;

    fn get_or_none(&self, code: &RegionCode) -> StorageResult<Option<Region>> {
        match self.get(code) {
            Ok(region) => Ok(Some(region)),
            Err(StorageError::NotFound { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Every stored region (of `country`, when given), ordered by code.
    fn get_all(&self, country: Option<&CountryCode>) -> StorageResult<Vec<Region>>;

    /// Regions whose code is in `codes`. Backends override the full scan.
    fn get_in(&self, codes: &[RegionCode]) -> StorageResult<Vec<Region>> {
        Ok(self
            .get_all(None)?
            .into_iter()
            .filter(|region| codes.contains(&region.code))
            .collect())
    }

    fn get_page(&self, country: Option<&CountryCode>, page: Page) -> StorageResult<Vec<Region>>;
}

/// Write access to stored regions.
pub trait MutableRegionRepository: RegionRepository {
    /// # Errors
    /// Returns [`StorageError::AlreadyExists`] when the code is stored.
    fn add(&self, region: &Region) -> StorageResult<Region>;

    fn add_all(&self, regions: &[Region]) -> StorageResult<()>;

    /// # Errors
    /// Returns [`StorageError::NotFound`] when the code is not stored.
    fn update(&self, region: &Region) -> StorageResult<Region>;

    fn upsert(&self, region: &Region) -> StorageResult<Region> {
        match self.get_or_none(&region.code)? {
            Some(_) => self.update(region),
            None => self.add(region),
        }
    }

    fn remove(&self, code: &RegionCode) -> StorageResult<()>;

    fn remove_in(&self, codes: &[RegionCode]) -> StorageResult<()>;

    fn clear(&self) -> StorageResult<()>;
}
