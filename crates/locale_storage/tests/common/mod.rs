#![allow(dead_code)]

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use locale_core::{Country, CountryCode, Region, RegionCode};
use locale_storage::SharedClock;
use mockable::Clock;
use parking_lot::Mutex;
use std::sync::Arc;

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn starting_at(now: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(now),
        })
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

pub fn epoch_2024() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap()
}

pub fn shared(clock: &Arc<ManualClock>) -> SharedClock {
    clock.clone()
}

pub fn country(code: &str, name: &str) -> Country {
    Country::new(CountryCode::parse(code).unwrap()).with_name(name)
}

pub fn region(code: &str, name: &str) -> Region {
    Region::new(RegionCode::parse(code).unwrap()).with_name(name)
}

pub fn country_code(code: &str) -> CountryCode {
    CountryCode::parse(code).unwrap()
}

pub fn region_code(code: &str) -> RegionCode {
    RegionCode::parse(code).unwrap()
}

pub fn codes_of(countries: &[Country]) -> Vec<&str> {
    countries.iter().map(|country| country.code.value()).collect()
}

pub fn region_codes_of(regions: &[Region]) -> Vec<&str> {
    regions.iter().map(|region| region.code.value()).collect()
}
