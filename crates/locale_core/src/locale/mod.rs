//! BCP 47 locale value type and its platform capabilities.
//!
//! # Responsibility
//! - Represent a parsed language tag (language, script, region, variants).
//! - Define the [`LocaleParser`] and [`LocaleProvider`] capabilities that the
//!   host platform implements once.
//!
//! # Invariants
//! - A `Locale` is immutable; the only way to obtain one is through a parser
//!   or provider.
//! - Equality is structural over the canonical tag and its parts.
//!
//! Extensions and private-use subtags are dropped while parsing.

mod display;
mod platform;

pub use platform::{PlatformLocaleParser, PlatformLocaleProvider};

use crate::language::LanguageCode;
use icu_locid::subtags::Language;
use icu_locid::LanguageIdentifier;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

pub type LocaleResult<T> = Result<T, LocaleError>;

/// Locale parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocaleError {
    #[error("malformed language tag `{tag}`: {reason}")]
    MalformedLanguageTag { tag: String, reason: String },
}

/// Parses language tags into [`Locale`] values.
pub trait LocaleParser {
    /// Parses a BCP 47 tag.
    ///
    /// # Errors
    /// Returns [`LocaleError::MalformedLanguageTag`] when `tag` is not
    /// well-formed.
    fn parse(&self, tag: &str) -> LocaleResult<Locale>;

    /// Like [`LocaleParser::parse`], but absorbs failures into `None`.
    fn parse_or_none(&self, tag: &str) -> Option<Locale> {
        self.parse(tag).ok()
    }

    /// Builds a locale from independently optional parts.
    ///
    /// Omitting every part yields the undetermined (`und`) locale.
    ///
    /// # Errors
    /// Returns [`LocaleError::MalformedLanguageTag`] when the composed tag is
    /// not well-formed.
    fn from_parts(
        &self,
        language: Option<&str>,
        region: Option<&str>,
        script: Option<&str>,
        variants: &[&str],
    ) -> LocaleResult<Locale>;

    fn from_parts_or_none(
        &self,
        language: Option<&str>,
        region: Option<&str>,
        script: Option<&str>,
        variants: &[&str],
    ) -> Option<Locale> {
        self.from_parts(language, region, script, variants).ok()
    }
}

/// Source of the process default and available locales.
pub trait LocaleProvider {
    fn default_locale(&self) -> Locale;
    fn available_locales(&self) -> Vec<Locale>;
}

/// A parsed BCP 47 locale.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locale {
    id: LanguageIdentifier,
}

impl Locale {
    /// Separator used when joining variants into one subtag string.
    pub const VARIANT_SEPARATOR: char = '_';

    pub(crate) fn from_identifier(id: LanguageIdentifier) -> Self {
        Self { id }
    }

    pub(crate) fn identifier(&self) -> &LanguageIdentifier {
        &self.id
    }

    /// The empty `und` locale.
    pub fn undetermined() -> Self {
        Self::from_identifier(LanguageIdentifier::default())
    }

    /// Parses `tag` with the platform parser.
    ///
    /// # Errors
    /// Returns [`LocaleError::MalformedLanguageTag`] for malformed tags.
    pub fn parse(tag: &str) -> LocaleResult<Self> {
        PlatformLocaleParser.parse(tag)
    }

    pub fn parse_or_none(tag: &str) -> Option<Self> {
        PlatformLocaleParser.parse_or_none(tag)
    }

    /// Builds a locale from parts with the platform parser.
    ///
    /// # Errors
    /// Returns [`LocaleError::MalformedLanguageTag`] when the parts do not
    /// compose into a well-formed tag.
    pub fn from_parts(
        language: Option<&str>,
        region: Option<&str>,
        script: Option<&str>,
        variants: &[&str],
    ) -> LocaleResult<Self> {
        PlatformLocaleParser.from_parts(language, region, script, variants)
    }

    /// Process default locale from the platform provider.
    pub fn system_default() -> Self {
        PlatformLocaleProvider.default_locale()
    }

    pub fn available() -> Vec<Self> {
        PlatformLocaleProvider.available_locales()
    }

    pub fn us() -> Self {
        Self::from_identifier(icu_locid::langid!("en-US"))
    }

    pub fn english() -> Self {
        Self::from_identifier(icu_locid::langid!("en"))
    }

    pub fn en_us() -> Self {
        Self::from_identifier(icu_locid::langid!("en-US"))
    }

    /// Lower-case ISO 639 language, or `None` when undetermined.
    pub fn language(&self) -> Option<&str> {
        if self.id.language == Language::UND {
            None
        } else {
            Some(self.id.language.as_str())
        }
    }

    /// Upper-case ISO 3166 alpha-2 or UN M.49 region.
    pub fn region(&self) -> Option<&str> {
        self.id.region.as_ref().map(|region| region.as_str())
    }

    /// Title-case ISO 15924 script.
    pub fn script(&self) -> Option<&str> {
        self.id.script.as_ref().map(|script| script.as_str())
    }

    pub fn variants(&self) -> Vec<&str> {
        self.id.variants.iter().map(|variant| variant.as_str()).collect()
    }

    /// Canonical, well-formed BCP 47 tag for this locale.
    pub fn language_tag(&self) -> LanguageCode {
        LanguageCode::new(self.id.to_string())
    }

    /// Language name formatted for `in_locale` (process default when `None`).
    pub fn display_language(&self, in_locale: Option<&Locale>) -> Option<String> {
        display::language_name(&self.id, &target_locale(in_locale))
    }

    pub fn display_region(&self, in_locale: Option<&Locale>) -> Option<String> {
        display::region_name(&self.id, &target_locale(in_locale))
    }

    pub fn display_script(&self, in_locale: Option<&Locale>) -> Option<String> {
        display::script_name(&self.id, &target_locale(in_locale))
    }

    pub fn display_variant(&self, in_locale: Option<&Locale>) -> Option<String> {
        display::variant_name(&self.id, &target_locale(in_locale))
    }

    /// Full locale name (`English (United States)`).
    pub fn display_name(&self, in_locale: Option<&Locale>) -> Option<String> {
        display::locale_name(&self.id, &target_locale(in_locale))
    }
}

fn target_locale(in_locale: Option<&Locale>) -> Locale {
    match in_locale {
        Some(locale) => locale.clone(),
        None => Locale::system_default(),
    }
}

impl Display for Locale {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl FromStr for Locale {
    type Err = LocaleError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        Self::parse(tag)
    }
}

impl TryFrom<String> for Locale {
    type Error = LocaleError;

    fn try_from(tag: String) -> Result<Self, Self::Error> {
        Self::parse(&tag)
    }
}

impl From<Locale> for String {
    fn from(locale: Locale) -> Self {
        locale.id.to_string()
    }
}
