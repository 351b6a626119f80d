//! Localized display names for locale components.
//!
//! Backed by the CLDR data compiled into `icu_experimental`. Every lookup
//! returns `None` when no localized string exists for the component.

use icu_experimental::displaynames::{
    DisplayNamesOptions, LanguageDisplayNames, LocaleDisplayNamesFormatter, RegionDisplayNames,
    ScriptDisplayNames, VariantDisplayNames,
};
use icu_locid::subtags::Language;
use icu_locid::LanguageIdentifier;

use super::Locale;

pub(super) fn language_name(subject: &LanguageIdentifier, target: &Locale) -> Option<String> {
    if subject.language == Language::UND {
        return None;
    }
    let names =
        LanguageDisplayNames::try_new(&target.identifier().into(), DisplayNamesOptions::default())
            .ok()?;
    names.of(subject.language).map(str::to_owned)
}

pub(super) fn region_name(subject: &LanguageIdentifier, target: &Locale) -> Option<String> {
    let region = subject.region?;
    let names =
        RegionDisplayNames::try_new(&target.identifier().into(), DisplayNamesOptions::default())
            .ok()?;
    names.of(region).map(str::to_owned)
}

pub(super) fn script_name(subject: &LanguageIdentifier, target: &Locale) -> Option<String> {
    let script = subject.script?;
    let names =
        ScriptDisplayNames::try_new(&target.identifier().into(), DisplayNamesOptions::default())
            .ok()?;
    names.of(script).map(str::to_owned)
}

/// Variant names joined with `, `; `None` unless every variant has a name.
pub(super) fn variant_name(subject: &LanguageIdentifier, target: &Locale) -> Option<String> {
    if subject.variants.is_empty() {
        return None;
    }
    let names =
        VariantDisplayNames::try_new(&target.identifier().into(), DisplayNamesOptions::default())
            .ok()?;
    let mut parts = Vec::with_capacity(subject.variants.len());
    for variant in subject.variants.iter() {
        parts.push(names.of(*variant)?);
    }
    Some(parts.join(", "))
}

pub(super) fn locale_name(subject: &LanguageIdentifier, target: &Locale) -> Option<String> {
    if subject.language == Language::UND {
        return None;
    }
    let formatter = LocaleDisplayNamesFormatter::try_new(
        &target.identifier().into(),
        DisplayNamesOptions::default(),
    )
    .ok()?;
    let locale = icu_locid::Locale::from(subject.clone());
    Some(formatter.of(&locale).into_owned())
}
