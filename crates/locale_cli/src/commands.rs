//! Subcommand bodies. Each writes its report to `out`.

use anyhow::{Context, Result};
use clap::ValueEnum;
use locale_core::{CountryAndRegions, CountryCode, Locale, LocationCode, Page, StorageProvider};
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Entity {
    Countries,
    Regions,
}

/// One line per code: `<code> country`, `<code> region country=<cc>` or
/// `<input> invalid <reason>`. Invalid codes do not fail the command.
pub fn classify(codes: &[String], out: &mut dyn Write) -> Result<()> {
    for raw in codes {
        match LocationCode::parse(raw) {
            Ok(LocationCode::Country(code)) => writeln!(out, "{code} country")?,
            Ok(LocationCode::Region(code)) => {
                writeln!(out, "{code} region country={}", code.to_country_code())?
            }
            Err(err) => writeln!(out, "{raw} invalid {}", err.reason)?,
        }
    }
    Ok(())
}

pub fn describe_locale(tag: &str, display_in: Option<&str>, out: &mut dyn Write) -> Result<()> {
    let locale = Locale::parse(tag)?;
    let target = display_in.map(Locale::parse).transpose()?;
    let target = target.as_ref();

    writeln!(out, "tag={}", locale.language_tag())?;
    writeln!(out, "language={}", locale.language().unwrap_or("-"))?;
    writeln!(out, "script={}", locale.script().unwrap_or("-"))?;
    writeln!(out, "region={}", locale.region().unwrap_or("-"))?;
    writeln!(out, "variants={}", locale.variants().join(","))?;
    writeln!(
        out,
        "display_name={}",
        locale.display_name(target).unwrap_or_default()
    )?;
    writeln!(
        out,
        "display_region={}",
        locale.display_region(target).unwrap_or_default()
    )?;
    Ok(())
}

/// Upserts every country and region in a JSON array of
/// [`CountryAndRegions`].
pub fn import(provider: &dyn StorageProvider, raw: &str, out: &mut dyn Write) -> Result<()> {
    let entries: Vec<CountryAndRegions> =
        serde_json::from_str(raw).context("import file is not a country/region array")?;
    let countries = provider.mutable_country_repository();
    let regions = provider.mutable_region_repository();

    let mut region_count = 0usize;
    for entry in &entries {
        countries.upsert(&entry.country)?;
        for region in &entry.regions {
            if region.country_code() != entry.country.code {
                anyhow::bail!(
                    "region {} is listed under country {}",
                    region.code,
                    entry.country.code
                );
            }
            regions.upsert(region)?;
            region_count += 1;
        }
    }

    log::info!(
        "event=cli_import module=cli status=ok countries={} regions={}",
        entries.len(),
        region_count
    );
    writeln!(
        out,
        "imported countries={} regions={}",
        entries.len(),
        region_count
    )?;
    Ok(())
}

pub fn list(
    provider: &dyn StorageProvider,
    entity: Entity,
    country: Option<&str>,
    page: Page,
    out: &mut dyn Write,
) -> Result<()> {
    match entity {
        Entity::Countries => {
            for country in provider.mutable_country_repository().get_page(page)? {
                writeln!(out, "{}", serde_json::to_string(&country)?)?;
            }
        }
        Entity::Regions => {
            let country = country.map(CountryCode::parse).transpose()?;
            for region in provider
                .mutable_region_repository()
                .get_page(country.as_ref(), page)?
            {
                writeln!(out, "{}", serde_json::to_string(&region)?)?;
            }
        }
    }
    Ok(())
}

pub fn count(
    provider: &dyn StorageProvider,
    country: Option<&str>,
    out: &mut dyn Write,
) -> Result<()> {
    let country = country.map(CountryCode::parse).transpose()?;
    let regions = provider
        .mutable_region_repository()
        .count(country.as_ref())?;
    match &country {
        Some(code) => writeln!(out, "country={code} regions={regions}")?,
        None => {
            let countries = provider.mutable_country_repository().count()?;
            writeln!(out, "countries={countries} regions={regions}")?
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{classify, count, describe_locale, import, list, Entity};
    use locale_core::{Page, StorageProvider};
    use locale_storage::sqlite::SqliteStorageProvider;

    const SEED: &str = r#"[
        {"country": {"code": "US", "name": "United States", "region_type": "State"},
         "regions": [{"code": "US-NY", "name": "New York"}, {"code": "US-CA", "name": "California"}]},
        {"country": {"code": "CA", "name": "Canada"}}
    ]"#;

    fn render(f: impl FnOnce(&mut Vec<u8>) -> anyhow::Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn classify_reports_each_code() {
        let codes = vec!["us".to_owned(), "us-ny".to_owned(), "usa".to_owned()];

        let output = render(|out| classify(&codes, out));

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "US country");
        assert_eq!(lines[1], "US-NY region country=US");
        assert!(lines[2].starts_with("usa invalid "));
    }

    #[test]
    fn describe_locale_prints_parts() {
        let output = render(|out| describe_locale("en-us", Some("en"), out));

        assert!(output.contains("tag=en-US\n"));
        assert!(output.contains("region=US\n"));
        assert!(output.contains("display_region=United States\n"));
    }

    #[test]
    fn import_then_list_and_count() {
        let provider = SqliteStorageProvider::in_memory();

        let imported = render(|out| import(&provider, SEED, out));
        assert_eq!(imported, "imported countries=2 regions=2\n");
        render(|out| import(&provider, SEED, out));

        let counted = render(|out| count(&provider, None, out));
        assert_eq!(counted, "countries=2 regions=2\n");
        let counted = render(|out| count(&provider, Some("us"), out));
        assert_eq!(counted, "country=US regions=2\n");

        let listed = render(|out| {
            list(&provider, Entity::Regions, Some("US"), Page::new(1, 0), out)
        });
        assert_eq!(listed.lines().count(), 1);
        assert!(listed.contains(r#""code":"US-CA""#));

        provider.close().unwrap();
    }

    #[test]
    fn import_rejects_regions_under_the_wrong_country() {
        let provider = SqliteStorageProvider::in_memory();
        let raw = r#"[{"country": {"code": "US"}, "regions": [{"code": "CA-ON"}]}]"#;

        let mut out = Vec::new();
        let err = import(&provider, raw, &mut out).unwrap_err();

        assert!(err.to_string().contains("CA-ON"));
    }
}
