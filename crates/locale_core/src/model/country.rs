//! Country value object.

use super::Location;
use crate::code::{CountryCode, LocationCode};
use serde::{Deserialize, Serialize};

/// A country, keyed by its ISO 3166-1 alpha-2 code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Country {
    pub code: CountryCode,
    #[serde(default)]
    pub name: Option<String>,
    /// Default `Region::kind` for this country's subdivisions (`State`).
    #[serde(default)]
    pub region_type: Option<String>,
    /// URI of a flag image.
    #[serde(default)]
    pub flag: Option<String>,
    #[serde(default, rename = "emoji")]
    pub emoji_flag: Option<String>,
}

impl Country {
    /// Creates a country with only its code set.
    pub fn new(code: CountryCode) -> Self {
        Self {
            code,
            name: None,
            region_type: None,
            flag: None,
            emoji_flag: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_region_type(mut self, region_type: impl Into<String>) -> Self {
        self.region_type = Some(region_type.into());
        self
    }

    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.flag = Some(flag.into());
        self
    }

    pub fn with_emoji_flag(mut self, emoji_flag: impl Into<String>) -> Self {
        self.emoji_flag = Some(emoji_flag.into());
        self
    }
}

impl Location for Country {
    fn location_code(&self) -> LocationCode {
        LocationCode::Country(self.code.clone())
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}
