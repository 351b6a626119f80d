//! Locale and geography core.
//!
//! Location-code validation, the `Locale` value type, the country/region
//! model and the storage contracts every backend implements.

pub mod code;
pub mod language;
pub mod locale;
pub mod logging;
pub mod model;
pub mod storage;

pub use code::{CountryCode, InvalidCodeReason, InvalidLocationCode, LocationCode, RegionCode};
pub use language::LanguageCode;
pub use locale::{
    Locale, LocaleError, LocaleParser, LocaleProvider, LocaleResult, PlatformLocaleParser,
    PlatformLocaleProvider,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::composite::{CountryAndRegions, CountryWithRegion};
pub use model::country::Country;
pub use model::region::Region;
pub use model::Location;
pub use storage::{
    CountryRepository, EntityKind, MutableCountryRepository, MutableRegionRepository, Page,
    RegionRepository, StorageError, StorageProvider, StorageResult, DEFAULT_PAGE_SIZE,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
