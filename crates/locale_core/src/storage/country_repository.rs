//! Country repository contracts.

use super::error::{StorageError, StorageResult};
use super::Page;
use crate::code::CountryCode;
use crate::model::country::Country;

/// Read access to stored countries.
pub trait CountryRepository: Send + Sync {
    fn count(&self) -> StorageResult<u64>;

    /// Point lookup by code.
    ///
    /// # Errors
    /// Returns [`StorageError::NotFound`] when no country has `code`.
    fn get(&self, code: &CountryCode) -> StorageResult<Country>;

    /// Like [`CountryRepository::get`], with a miss absorbed into `None`.
    fn get_or_none(&self, code: &CountryCode) -> StorageResult<Option<Country>> {
        match self.get(code) {
            Ok(country) => Ok(Some(country)),
            Err(StorageError::NotFound { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Every stored country, ordered by code.
    fn get_all(&self) -> StorageResult<Vec<Country>>;

    /// Countries whose code is in `codes`.
    ///
    /// The default filters [`CountryRepository::get_all`]; backends override
    /// it with a targeted query.
    fn get_in(&self, codes: &[CountryCode]) -> StorageResult<Vec<Country>> {
        Ok(self
            .get_all()?
            .into_iter()
            .filter(|country| codes.contains(&country.code))
            .collect())
    }

    /// One page of countries, ordered by code.
    fn get_page(&self, page: Page) -> StorageResult<Vec<Country>>;
}

/// Write access to stored countries.
///
/// Writes on one repository instance never interleave.
pub trait MutableCountryRepository: CountryRepository {
    /// Inserts a new country.
    ///
    /// # Errors
    /// Returns [`StorageError::AlreadyExists`] when the code is stored.
    fn add(&self, country: &Country) -> StorageResult<Country>;

    /// Inserts all countries in one transaction; nothing is stored on error.
    fn add_all(&self, countries: &[Country]) -> StorageResult<()>;

    /// Replaces the stored row for `country.code`.
    ///
    /// # Errors
    /// Returns [`StorageError::NotFound`] when the code is not stored.
    fn update(&self, country: &Country) -> StorageResult<Country>;

    /// Adds when absent, otherwise updates.
    fn upsert(&self, country: &Country) -> StorageResult<Country> {
        match self.get_or_none(&country.code)? {
            Some(_) => self.update(country),
            None => self.add(country),
        }
    }

    /// Deletes by code; removing an absent code succeeds.
    fn remove(&self, code: &CountryCode) -> StorageResult<()>;

    fn remove_in(&self, codes: &[CountryCode]) -> StorageResult<()>;

    fn clear(&self) -> StorageResult<()>;
}
