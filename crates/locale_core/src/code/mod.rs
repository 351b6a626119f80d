//! ISO 3166 location code taxonomy.
//!
//! # Responsibility
//! - Validate raw strings into [`CountryCode`] (ISO 3166-1 alpha-2) or
//!   [`RegionCode`] (ISO 3166-2) values.
//! - Own the country-from-region derivation rule.
//!
//! # Invariants
//! - A `CountryCode` always matches `[A-Z]{2}`.
//! - A `RegionCode` always matches `[A-Z]{2}-[A-Z0-9]+`.
//! - There are no unchecked constructors; every value went through
//!   [`LocationCode::parse`].
//! - Validation is pure: the same input yields the same code or the same
//!   rejection.

mod error;

pub use error::{InvalidCodeReason, InvalidLocationCode};

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const COUNTRY_CODE_LEN: usize = 2;
const HYPHEN: char = '-';

/// Either a country code or a region (subdivision) code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LocationCode {
    Country(CountryCode),
    Region(RegionCode),
}

/// ISO 3166-1 alpha-2 country code, stored upper-case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode(String);

/// ISO 3166-2 subdivision code (`US-NY`), stored upper-case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegionCode(String);

impl LocationCode {
    /// Validates and classifies a raw code string.
    ///
    /// Surrounding whitespace is ignored; the accepted value is upper-cased so
    /// `"us"` and `"US"` compare and serialize identically.
    ///
    /// # Errors
    /// Returns [`InvalidLocationCode`] naming the first rule `raw` violates.
    pub fn parse(raw: &str) -> Result<Self, InvalidLocationCode> {
        let value = raw.trim();
        if value.is_empty() {
            return Err(InvalidLocationCode::new(raw, InvalidCodeReason::Empty));
        }

        if let Some((index, character)) = value
            .chars()
            .enumerate()
            .find(|(_, ch)| !(ch.is_ascii_alphanumeric() || *ch == HYPHEN))
        {
            return Err(InvalidLocationCode::new(
                raw,
                InvalidCodeReason::InvalidCharacter { character, index },
            ));
        }

        // Only ASCII remains, so byte offsets are char offsets from here on.
        match value.find(HYPHEN) {
            None => {
                if value.len() != COUNTRY_CODE_LEN {
                    return Err(InvalidLocationCode::new(
                        raw,
                        InvalidCodeReason::InvalidLength {
                            length: value.len(),
                        },
                    ));
                }
                if !is_country_part(value) {
                    return Err(InvalidLocationCode::new(
                        raw,
                        InvalidCodeReason::NonLetterCountry,
                    ));
                }
                Ok(Self::Country(CountryCode(value.to_ascii_uppercase())))
            }
            Some(index) if index != COUNTRY_CODE_LEN => Err(InvalidLocationCode::new(
                raw,
                InvalidCodeReason::MisplacedHyphen { index },
            )),
            Some(index) => {
                let (country, rest) = value.split_at(index);
                if !is_country_part(country) {
                    return Err(InvalidLocationCode::new(
                        raw,
                        InvalidCodeReason::NonLetterCountry,
                    ));
                }
                let subdivision = &rest[1..];
                if subdivision.is_empty() {
                    return Err(InvalidLocationCode::new(
                        raw,
                        InvalidCodeReason::EmptySubdivision,
                    ));
                }
                if let Some(offset) = subdivision.find(HYPHEN) {
                    return Err(InvalidLocationCode::new(
                        raw,
                        InvalidCodeReason::ExtraHyphen {
                            index: index + 1 + offset,
                        },
                    ));
                }
                Ok(Self::Region(RegionCode(value.to_ascii_uppercase())))
            }
        }
    }

    /// Canonical upper-case value.
    pub fn value(&self) -> &str {
        match self {
            Self::Country(code) => code.value(),
            Self::Region(code) => code.value(),
        }
    }

    /// Country this code belongs to; a country code maps to itself.
    pub fn to_country_code(&self) -> CountryCode {
        match self {
            Self::Country(code) => code.clone(),
            Self::Region(code) => code.to_country_code(),
        }
    }

    pub fn is_country(&self) -> bool {
        matches!(self, Self::Country(_))
    }

    pub fn is_region(&self) -> bool {
        matches!(self, Self::Region(_))
    }
}

impl CountryCode {
    /// Parses a country code, rejecting well-formed region codes.
    ///
    /// # Errors
    /// Returns [`InvalidLocationCode`] when `raw` is malformed or is a region
    /// code ([`InvalidCodeReason::NotACountryCode`]).
    pub fn parse(raw: &str) -> Result<Self, InvalidLocationCode> {
        match LocationCode::parse(raw)? {
            LocationCode::Country(code) => Ok(code),
            LocationCode::Region(_) => Err(InvalidLocationCode::new(
                raw,
                InvalidCodeReason::NotACountryCode,
            )),
        }
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

impl RegionCode {
    /// Parses a region code, rejecting well-formed country codes.
    ///
    /// # Errors
    /// Returns [`InvalidLocationCode`] when `raw` is malformed or is a country
    /// code ([`InvalidCodeReason::NotARegionCode`]).
    pub fn parse(raw: &str) -> Result<Self, InvalidLocationCode> {
        match LocationCode::parse(raw)? {
            LocationCode::Region(code) => Ok(code),
            LocationCode::Country(_) => Err(InvalidLocationCode::new(
                raw,
                InvalidCodeReason::NotARegionCode,
            )),
        }
    }

    pub fn value(&self) -> &str {
        &self.0
    }

    /// Country prefix of this region (`US-NY` -> `US`).
    ///
    /// Infallible: the prefix was validated when the region code was built.
    pub fn to_country_code(&self) -> CountryCode {
        CountryCode(self.0[..COUNTRY_CODE_LEN].to_owned())
    }

    /// Subdivision part after the hyphen (`US-NY` -> `NY`).
    pub fn subdivision(&self) -> &str {
        &self.0[COUNTRY_CODE_LEN + 1..]
    }
}

fn is_country_part(value: &str) -> bool {
    value.len() == COUNTRY_CODE_LEN && value.chars().all(|ch| ch.is_ascii_alphabetic())
}

macro_rules! impl_code_conversions {
    ($ty:ty) => {
        impl FromStr for $ty {
            type Err = InvalidLocationCode;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                Self::parse(value)
            }
        }

        impl TryFrom<String> for $ty {
            type Error = InvalidLocationCode;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl TryFrom<&str> for $ty {
            type Error = InvalidLocationCode;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::parse(value)
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.value().to_owned()
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                self.value()
            }
        }

        impl Display for $ty {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.value())
            }
        }
    };
}

impl_code_conversions!(LocationCode);
impl_code_conversions!(CountryCode);
impl_code_conversions!(RegionCode);

impl From<CountryCode> for LocationCode {
    fn from(value: CountryCode) -> Self {
        Self::Country(value)
    }
}

impl From<RegionCode> for LocationCode {
    fn from(value: RegionCode) -> Self {
        Self::Region(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{CountryCode, InvalidCodeReason, LocationCode, RegionCode};

    #[test]
    fn reason_points_at_first_violation() {
        let err = LocationCode::parse("u$").unwrap_err();
        assert_eq!(
            err.reason,
            InvalidCodeReason::InvalidCharacter {
                character: '$',
                index: 1
            }
        );

        let err = LocationCode::parse("US-NY-X").unwrap_err();
        assert_eq!(err.reason, InvalidCodeReason::ExtraHyphen { index: 5 });

        let err = LocationCode::parse("US-").unwrap_err();
        assert_eq!(err.reason, InvalidCodeReason::EmptySubdivision);
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let code = LocationCode::parse("  gb ").unwrap();
        assert_eq!(code.value(), "GB");
    }

    #[test]
    fn typed_parsers_reject_the_other_variant() {
        let err = CountryCode::parse("US-NY").unwrap_err();
        assert_eq!(err.reason, InvalidCodeReason::NotACountryCode);

        let err = RegionCode::parse("US").unwrap_err();
        assert_eq!(err.reason, InvalidCodeReason::NotARegionCode);
    }

    #[test]
    fn region_exposes_subdivision_and_country() {
        let region = RegionCode::parse("fr-75c").unwrap();
        assert_eq!(region.value(), "FR-75C");
        assert_eq!(region.subdivision(), "75C");
        assert_eq!(region.to_country_code().value(), "FR");
    }

    #[test]
    fn country_code_maps_to_itself() {
        let code = LocationCode::parse("de").unwrap();
        assert_eq!(code.to_country_code(), CountryCode::parse("DE").unwrap());
        assert!(code.is_country());
    }
}
