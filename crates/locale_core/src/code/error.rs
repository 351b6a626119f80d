//! Validation failures for location codes.

use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Why a raw string was rejected as a location code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidCodeReason {
    /// Input was empty after trimming surrounding whitespace.
    Empty,
    /// Input contains a character outside `[A-Za-z0-9-]`.
    InvalidCharacter { character: char, index: usize },
    /// No hyphen and the value is not exactly two characters long.
    InvalidLength { length: usize },
    /// The two-character country part contains a non-letter.
    NonLetterCountry,
    /// The first hyphen is not at index 2.
    MisplacedHyphen { index: usize },
    /// Nothing follows the hyphen.
    EmptySubdivision,
    /// A second hyphen appears inside the subdivision part.
    ExtraHyphen { index: usize },
    /// A well-formed region code was supplied where a country code is required.
    NotACountryCode,
    /// A well-formed country code was supplied where a region code is required.
    NotARegionCode,
}

impl Display for InvalidCodeReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "value is empty"),
            Self::InvalidCharacter { character, index } => {
                write!(f, "character {character:?} at index {index} is not a letter, digit or hyphen")
            }
            Self::InvalidLength { length } => {
                write!(f, "country codes have exactly 2 letters, got {length} characters")
            }
            Self::NonLetterCountry => write!(f, "country part must be two letters"),
            Self::MisplacedHyphen { index } => {
                write!(f, "hyphen must be at index 2, found at index {index}")
            }
            Self::EmptySubdivision => write!(f, "subdivision part is empty"),
            Self::ExtraHyphen { index } => {
                write!(f, "unexpected second hyphen at index {index}")
            }
            Self::NotACountryCode => write!(f, "value is a region code, not a country code"),
            Self::NotARegionCode => write!(f, "value is a country code, not a region code"),
        }
    }
}

/// A raw string could not be turned into a location code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid location code `{value}`: {reason}")]
pub struct InvalidLocationCode {
    /// The rejected input, verbatim.
    pub value: String,
    /// The first rule the input violated.
    pub reason: InvalidCodeReason,
}

impl InvalidLocationCode {
    pub(crate) fn new(value: &str, reason: InvalidCodeReason) -> Self {
        Self {
            value: value.to_owned(),
            reason,
        }
    }
}
