//! Default methods of the storage contracts, exercised over a map-backed
//! provider.

use locale_core::storage::{
    CountryRepository, EntityKind, MutableCountryRepository, MutableRegionRepository, Page,
    RegionRepository, StorageError, StorageProvider, StorageResult,
};
use locale_core::{Country, CountryCode, Region, RegionCode};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct MapCountries {
    rows: Mutex<BTreeMap<CountryCode, Country>>,
}

impl CountryRepository for MapCountries {
    fn count(&self) -> StorageResult<u64> {
        Ok(self.rows.lock().unwrap().len() as u64)
    }

    fn get(&self, code: &CountryCode) -> StorageResult<Country> {
        self.rows
            .lock()
            .unwrap()
            .get(code)
            .cloned()
            .ok_or_else(|| StorageError::not_found(EntityKind::Country, code.value()))
    }

    fn get_all(&self) -> StorageResult<Vec<Country>> {
        Ok(self.rows.lock().unwrap().values().cloned().collect())
    }

    fn get_page(&self, page: Page) -> StorageResult<Vec<Country>> {
        Ok(self
            .get_all()?
            .into_iter()
            .skip(page.offset as usize)
            .take(page.count as usize)
            .collect())
    }
}

impl MutableCountryRepository for MapCountries {
    fn add(&self, country: &Country) -> StorageResult<Country> {
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&country.code) {
            return Err(StorageError::already_exists(
                EntityKind::Country,
                country.code.value(),
            ));
        }
        rows.insert(country.code.clone(), country.clone());
        Ok(country.clone())
    }

    fn add_all(&self, countries: &[Country]) -> StorageResult<()> {
        for country in countries {
            self.add(country)?;
        }
        Ok(())
    }

    fn update(&self, country: &Country) -> StorageResult<Country> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&country.code) {
            Some(row) => {
                *row = country.clone();
                Ok(country.clone())
            }
            None => Err(StorageError::not_found(
                EntityKind::Country,
                country.code.value(),
            )),
        }
    }

    fn remove(&self, code: &CountryCode) -> StorageResult<()> {
        self.rows.lock().unwrap().remove(code);
        Ok(())
    }

    fn remove_in(&self, codes: &[CountryCode]) -> StorageResult<()> {
        codes.iter().try_for_each(|code| self.remove(code))
    }

    fn clear(&self) -> StorageResult<()> {
        self.rows.lock().unwrap().clear();
        Ok(())
    }
}

#[derive(Default)]
struct MapRegions {
    rows: Mutex<BTreeMap<RegionCode, Region>>,
}

impl RegionRepository for MapRegions {
    fn count(&self, country: Option<&CountryCode>) -> StorageResult<u64> {
        Ok(self.get_all(country)?.len() as u64)
    }

    fn get(&self, code: &RegionCode) -> StorageResult<Region> {
        self.rows
            .lock()
            .unwrap()
            .get(code)
            .cloned()
            .ok_or_else(|| StorageError::not_found(EntityKind::Region, code.value()))
    }

    fn get_all(&self, country: Option<&CountryCode>) -> StorageResult<Vec<Region>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|region| country.map_or(true, |code| region.country_code() == *code))
            .cloned()
            .collect())
    }

    fn get_page(&self, country: Option<&CountryCode>, page: Page) -> StorageResult<Vec<Region>> {
        Ok(self
            .get_all(country)?
            .into_iter()
            .skip(page.offset as usize)
            .take(page.count as usize)
            .collect())
    }
}

impl MutableRegionRepository for MapRegions {
    fn add(&self, region: &Region) -> StorageResult<Region> {
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&region.code) {
            return Err(StorageError::already_exists(
                EntityKind::Region,
                region.code.value(),
            ));
        }
        rows.insert(region.code.clone(), region.clone());
        Ok(region.clone())
    }

    fn add_all(&self, regions: &[Region]) -> StorageResult<()> {
        regions.iter().try_for_each(|region| self.add(region).map(|_| ()))
    }

    fn update(&self, region: &Region) -> StorageResult<Region> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&region.code) {
            Some(row) => {
                *row = region.clone();
                Ok(region.clone())
            }
            None => Err(StorageError::not_found(
                EntityKind::Region,
                region.code.value(),
            )),
        }
    }

    fn remove(&self, code: &RegionCode) -> StorageResult<()> {
        self.rows.lock().unwrap().remove(code);
        Ok(())
    }

    fn remove_in(&self, codes: &[RegionCode]) -> StorageResult<()> {
        codes.iter().try_for_each(|code| self.remove(code))
    }

    fn clear(&self) -> StorageResult<()> {
        self.rows.lock().unwrap().clear();
        Ok(())
    }
}

#[derive(Default)]
struct MapProvider {
    countries: Arc<MapCountries>,
    regions: Arc<MapRegions>,
    closed: AtomicBool,
}

impl StorageProvider for MapProvider {
    fn mutable_country_repository(&self) -> Arc<dyn MutableCountryRepository> {
        self.countries.clone()
    }

    fn mutable_region_repository(&self) -> Arc<dyn MutableRegionRepository> {
        self.regions.clone()
    }

    fn close(&self) -> StorageResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

fn country(code: &str) -> Country {
    Country::new(CountryCode::parse(code).unwrap())
}

fn region(code: &str) -> Region {
    Region::new(RegionCode::parse(code).unwrap())
}

#[test]
fn default_get_in_filters_the_full_listing() {
    let repo = MapCountries::default();
    repo.add_all(&[country("US"), country("CA"), country("MX")])
        .unwrap();

    let picked = repo
        .get_in(&[
            CountryCode::parse("MX").unwrap(),
            CountryCode::parse("US").unwrap(),
        ])
        .unwrap();

    let codes: Vec<&str> = picked.iter().map(|country| country.code.value()).collect();
    assert_eq!(codes, ["MX", "US"]);
    assert!(repo.get_in(&[]).unwrap().is_empty());
}

#[test]
fn default_get_or_none_absorbs_only_not_found() {
    let repo = MapCountries::default();
    repo.add(&country("US")).unwrap();

    assert!(repo
        .get_or_none(&CountryCode::parse("US").unwrap())
        .unwrap()
        .is_some());
    assert!(repo
        .get_or_none(&CountryCode::parse("FR").unwrap())
        .unwrap()
        .is_none());
}

#[test]
fn default_upsert_adds_then_replaces() {
    let repo = MapRegions::default();

    repo.upsert(&region("US-NY").with_name("New York")).unwrap();
    repo.upsert(&region("US-NY").with_name("New York State"))
        .unwrap();

    assert_eq!(repo.count(None).unwrap(), 1);
    assert_eq!(
        repo.get(&RegionCode::parse("US-NY").unwrap())
            .unwrap()
            .name
            .as_deref(),
        Some("New York State")
    );
}

#[test]
fn default_region_get_in_spans_countries() {
    let repo = MapRegions::default();
    repo.add_all(&[region("US-NY"), region("CA-ON"), region("US-TX")])
        .unwrap();

    let picked = repo
        .get_in(&[
            RegionCode::parse("CA-ON").unwrap(),
            RegionCode::parse("US-TX").unwrap(),
        ])
        .unwrap();

    assert_eq!(picked.len(), 2);
}

#[test]
fn provider_loaders_combine_both_repositories() {
    let provider = MapProvider::default();
    provider
        .mutable_country_repository()
        .add(&country("US"))
        .unwrap();
    provider
        .mutable_region_repository()
        .add_all(&[region("US-NY"), region("US-CA"), region("MX-CMX")])
        .unwrap();

    let loaded = provider
        .load_country_and_regions(&CountryCode::parse("US").unwrap())
        .unwrap();
    assert_eq!(loaded.regions.len(), 2);

    let hit = provider
        .load_country_with_region(&RegionCode::parse("US-CA").unwrap())
        .unwrap();
    assert_eq!(hit.region.map(|region| region.code.to_string()).as_deref(), Some("US-CA"));

    let miss = provider
        .load_country_with_region(&RegionCode::parse("US-WA").unwrap())
        .unwrap();
    assert!(miss.region.is_none());

    let err = provider
        .load_country_and_regions(&CountryCode::parse("MX").unwrap())
        .unwrap_err();
    assert!(matches!(
        err,
        StorageError::NotFound {
            entity: EntityKind::Country,
            ..
        }
    ));
}

#[test]
fn page_next_advances_by_its_size() {
    let page = Page::default();
    assert_eq!(page.count, locale_core::DEFAULT_PAGE_SIZE);
    assert_eq!(page.next(), Page::new(page.count, page.count));
    assert_eq!(Page::new(10, u32::MAX).next().offset, u32::MAX);
}
