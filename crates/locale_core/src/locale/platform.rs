//! Host implementation of the locale capabilities.
//!
//! Tag grammar comes from ICU4X's `icu_locid`; the default and preferred
//! locales come from the operating system through `sys-locale`.

use super::{Locale, LocaleError, LocaleParser, LocaleProvider, LocaleResult};
use icu_locid::LanguageIdentifier;
use log::debug;

/// Parser backed by the ICU4X tag grammar.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformLocaleParser;

/// Provider backed by the operating system's locale preferences.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformLocaleProvider;

impl LocaleParser for PlatformLocaleParser {
    fn parse(&self, tag: &str) -> LocaleResult<Locale> {
        if let Some(singleton) = dangling_singleton(tag.trim()) {
            return Err(LocaleError::MalformedLanguageTag {
                tag: tag.to_owned(),
                reason: format!("singleton `{singleton}` has no subtags"),
            });
        }
        // Full locales may carry extensions; only the identifier part is kept.
        icu_locid::Locale::try_from_bytes(tag.trim().as_bytes())
            .map(|locale| Locale::from_identifier(locale.id))
            .map_err(|err| LocaleError::MalformedLanguageTag {
                tag: tag.to_owned(),
                reason: err.to_string(),
            })
    }

    fn from_parts(
        &self,
        language: Option<&str>,
        region: Option<&str>,
        script: Option<&str>,
        variants: &[&str],
    ) -> LocaleResult<Locale> {
        let tag = compose_tag(language, region, script, variants);
        if tag.is_empty() {
            return Ok(Locale::from_identifier(LanguageIdentifier::default()));
        }
        self.parse(&tag)
    }
}

impl LocaleProvider for PlatformLocaleProvider {
    fn default_locale(&self) -> Locale {
        match sys_locale::get_locale() {
            Some(tag) => PlatformLocaleParser.parse_or_none(&tag).unwrap_or_else(|| {
                debug!("event=locale_default module=locale status=fallback tag={tag}");
                Locale::undetermined()
            }),
            None => Locale::undetermined(),
        }
    }

    fn available_locales(&self) -> Vec<Locale> {
        let mut locales: Vec<Locale> = Vec::new();
        for tag in sys_locale::get_locales() {
            if let Some(locale) = PlatformLocaleParser.parse_or_none(&tag) {
                if !locales.contains(&locale) {
                    locales.push(locale);
                }
            }
        }
        locales
    }
}

/// Joins parts in canonical order: language, script, region, variants.
///
/// Language is lower-cased, script title-cased, region upper-cased; variants
/// are joined with [`Locale::VARIANT_SEPARATOR`].
fn compose_tag(
    language: Option<&str>,
    region: Option<&str>,
    script: Option<&str>,
    variants: &[&str],
) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(4);
    let language = non_blank(language);
    let script = non_blank(script);
    let region = non_blank(region);
    let variants: Vec<&str> = variants
        .iter()
        .map(|variant| variant.trim())
        .filter(|variant| !variant.is_empty())
        .collect();

    if language.is_none() && script.is_none() && region.is_none() && variants.is_empty() {
        return String::new();
    }

    parts.push(
        language
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| "und".to_owned()),
    );
    if let Some(script) = script {
        parts.push(title_case(script));
    }
    if let Some(region) = region {
        parts.push(region.to_ascii_uppercase());
    }
    if !variants.is_empty() {
        parts.push(variants.join(&Locale::VARIANT_SEPARATOR.to_string()));
    }
    parts.join("-")
}

/// First extension or private-use singleton not followed by a subtag.
///
/// `icu_locid` accepts `en-US-x` and `en-a-x-foo`, which BCP 47 rejects.
/// Subtags after `x` are private use and may be one character long.
fn dangling_singleton(tag: &str) -> Option<&str> {
    let mut subtags = tag.split(['-', '_']).skip(1).peekable();
    while let Some(subtag) = subtags.next() {
        if subtag.len() != 1 {
            continue;
        }
        let private_use = subtag.eq_ignore_ascii_case("x");
        let followed = subtags
            .peek()
            .is_some_and(|next| !next.is_empty() && (next.len() > 1 || private_use));
        if !followed {
            return Some(subtag);
        }
        if private_use {
            return None;
        }
    }
    None
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn title_case(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => {
            let mut out = first.to_ascii_uppercase().to_string();
            out.push_str(&chars.as_str().to_ascii_lowercase());
            out
        }
        None => String::new(),
    }
}
