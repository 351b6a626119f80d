//! Region (country subdivision) value object.

use super::Location;
use crate::code::{CountryCode, LocationCode, RegionCode};
use serde::{Deserialize, Serialize};

/// A subdivision of a country, keyed by its ISO 3166-2 code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub code: RegionCode,
    #[serde(default)]
    pub name: Option<String>,
    /// Kind of subdivision (`State`, `Province`, `City`).
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub flag: Option<String>,
    #[serde(default, rename = "emoji")]
    pub emoji_flag: Option<String>,
}

impl Region {
    pub fn new(code: RegionCode) -> Self {
        Self {
            code,
            name: None,
            kind: None,
            flag: None,
            emoji_flag: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
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

    /// Country this region belongs to, derived from its code.
    pub fn country_code(&self) -> CountryCode {
        self.code.to_country_code()
    }
}

impl Location for Region {
    fn location_code(&self) -> LocationCode {
        LocationCode::Region(self.code.clone())
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}
