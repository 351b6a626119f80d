#![cfg(feature = "sqlite")]

mod common;

use common::{codes_of, country, country_code, region, region_code, region_codes_of};
use locale_core::storage::{EntityKind, Page, StorageError, StorageProvider};
use locale_storage::sqlite::SqliteStorageProvider;
use rstest::{fixture, rstest};

#[fixture]
fn provider() -> SqliteStorageProvider {
    SqliteStorageProvider::in_memory()
}

#[rstest]
fn country_add_then_get_returns_equal_value(provider: SqliteStorageProvider) {
    let repo = provider.mutable_country_repository();
    let us = country("US", "United States")
        .with_region_type("State")
        .with_flag("https://flags.example/us.svg")
        .with_emoji_flag("🇺🇸");

    let stored = repo.add(&us).unwrap();

    assert_eq!(stored, us);
    assert_eq!(repo.get(&country_code("us")).unwrap(), us);
    assert_eq!(repo.count().unwrap(), 1);
}

#[rstest]
fn get_on_missing_code_is_not_found(provider: SqliteStorageProvider) {
    let repo = provider.mutable_country_repository();

    let err = repo.get(&country_code("ZZ")).unwrap_err();

    assert!(matches!(
        err,
        StorageError::NotFound {
            entity: EntityKind::Country,
            ref code
        } if code == "ZZ"
    ));
    assert_eq!(repo.get_or_none(&country_code("ZZ")).unwrap(), None);
}

#[rstest]
fn duplicate_add_is_rejected_without_touching_the_row(provider: SqliteStorageProvider) {
    let repo = provider.mutable_country_repository();
    repo.add(&country("FR", "France")).unwrap();

    let err = repo.add(&country("FR", "République française")).unwrap_err();

    assert!(matches!(err, StorageError::AlreadyExists { .. }));
    assert_eq!(
        repo.get(&country_code("FR")).unwrap().name.as_deref(),
        Some("France")
    );
    assert_eq!(repo.count().unwrap(), 1);
}

#[rstest]
fn update_replaces_the_stored_row(provider: SqliteStorageProvider) {
    let repo = provider.mutable_country_repository();
    repo.add(&country("DE", "Germany").with_flag("old.svg")).unwrap();

    let replacement = country("DE", "Deutschland");
    repo.update(&replacement).unwrap();

    let stored = repo.get(&country_code("DE")).unwrap();
    assert_eq!(stored, replacement);
    assert_eq!(stored.flag, None);
}

#[rstest]
fn update_on_missing_code_is_not_found(provider: SqliteStorageProvider) {
    let repo = provider.mutable_country_repository();

    let err = repo.update(&country("JP", "Japan")).unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(repo.count().unwrap(), 0);
}

#[rstest]
fn upsert_inserts_then_updates_a_single_row(provider: SqliteStorageProvider) {
    let repo = provider.mutable_country_repository();

    repo.upsert(&country("CA", "Canada")).unwrap();
    repo.upsert(&country("CA", "Canada").with_region_type("Province"))
        .unwrap();

    assert_eq!(repo.count().unwrap(), 1);
    assert_eq!(
        repo.get(&country_code("CA")).unwrap().region_type.as_deref(),
        Some("Province")
    );
}

#[rstest]
fn remove_is_idempotent(provider: SqliteStorageProvider) {
    let repo = provider.mutable_country_repository();
    repo.add(&country("IT", "Italy")).unwrap();

    repo.remove(&country_code("IT")).unwrap();
    repo.remove(&country_code("IT")).unwrap();

    assert_eq!(repo.get_or_none(&country_code("IT")).unwrap(), None);
}

#[rstest]
fn get_in_and_remove_in_target_only_listed_codes(provider: SqliteStorageProvider) {
    let repo = provider.mutable_country_repository();
    repo.add_all(&[
        country("ES", "Spain"),
        country("PT", "Portugal"),
        country("AD", "Andorra"),
    ])
    .unwrap();

    let picked = repo
        .get_in(&[country_code("PT"), country_code("AD"), country_code("ZZ")])
        .unwrap();
    assert_eq!(codes_of(&picked), ["AD", "PT"]);
    assert!(repo.get_in(&[]).unwrap().is_empty());

    repo.remove_in(&[country_code("ES"), country_code("AD")])
        .unwrap();
    repo.remove_in(&[]).unwrap();
    assert_eq!(codes_of(&repo.get_all().unwrap()), ["PT"]);
}

#[rstest]
fn batch_lookups_accept_more_codes_than_sqlite_variables(provider: SqliteStorageProvider) {
    let countries = provider.mutable_country_repository();
    countries
        .add_all(&[country("JP", "Japan"), country("KR", "South Korea")])
        .unwrap();
    let repeated: Vec<_> = ["JP", "XX", "KR"]
        .iter()
        .cycle()
        .take(40_000)
        .map(|code| country_code(code))
        .collect();

    assert_eq!(codes_of(&countries.get_in(&repeated).unwrap()), ["JP", "KR"]);
    countries.remove_in(&repeated).unwrap();
    assert_eq!(countries.count().unwrap(), 0);

    let regions = provider.mutable_region_repository();
    regions
        .add_all(&[region("JP-13", "Tokyo"), region("JP-27", "Osaka")])
        .unwrap();
    let many: Vec<_> = (0..40_000)
        .map(|n| region_code(&format!("JP-{n}")))
        .collect();

    assert_eq!(
        region_codes_of(&regions.get_in(&many).unwrap()),
        ["JP-13", "JP-27"]
    );
    regions.remove_in(&many).unwrap();
    assert_eq!(regions.count(None).unwrap(), 0);
}

#[rstest]
fn add_all_is_all_or_nothing(provider: SqliteStorageProvider) {
    let repo = provider.mutable_country_repository();
    repo.add(&country("NL", "Netherlands")).unwrap();

    let err = repo
        .add_all(&[country("BE", "Belgium"), country("NL", "Holland")])
        .unwrap_err();
    assert!(matches!(err, StorageError::AlreadyExists { ref code, .. } if code == "NL"));

    let err = repo
        .add_all(&[country("LU", "Luxembourg"), country("LU", "Luxemburg")])
        .unwrap_err();
    assert!(matches!(err, StorageError::AlreadyExists { .. }));

    assert_eq!(codes_of(&repo.get_all().unwrap()), ["NL"]);
}

#[rstest]
fn pages_walk_the_code_ordered_listing(provider: SqliteStorageProvider) {
    let repo = provider.mutable_country_repository();
    for (code, name) in [
        ("SE", "Sweden"),
        ("DK", "Denmark"),
        ("NO", "Norway"),
        ("FI", "Finland"),
        ("IS", "Iceland"),
    ] {
        repo.add(&country(code, name)).unwrap();
    }

    let first = Page::new(2, 0);
    assert_eq!(codes_of(&repo.get_page(first).unwrap()), ["DK", "FI"]);
    assert_eq!(codes_of(&repo.get_page(first.next()).unwrap()), ["IS", "NO"]);
    assert_eq!(codes_of(&repo.get_page(first.next().next()).unwrap()), ["SE"]);
    assert!(repo.get_page(Page::new(2, 10)).unwrap().is_empty());
    assert_eq!(repo.get_page(Page::default()).unwrap().len(), 5);
}

#[rstest]
fn clear_empties_only_its_own_table(provider: SqliteStorageProvider) {
    let countries = provider.mutable_country_repository();
    let regions = provider.mutable_region_repository();
    countries.add(&country("US", "United States")).unwrap();
    regions.add(&region("US-NY", "New York")).unwrap();

    countries.clear().unwrap();

    assert_eq!(countries.count().unwrap(), 0);
    assert_eq!(regions.count(None).unwrap(), 1);
}

#[rstest]
fn regions_filter_by_country_prefix(provider: SqliteStorageProvider) {
    let repo = provider.mutable_region_repository();
    repo.add_all(&[
        region("US-NY", "New York"),
        region("US-CA", "California"),
        region("CA-ON", "Ontario"),
        region("US-TX", "Texas"),
    ])
    .unwrap();
    let us = country_code("US");

    assert_eq!(repo.count(None).unwrap(), 4);
    assert_eq!(repo.count(Some(&us)).unwrap(), 3);
    assert_eq!(
        region_codes_of(&repo.get_all(Some(&us)).unwrap()),
        ["US-CA", "US-NY", "US-TX"]
    );
    assert_eq!(
        region_codes_of(&repo.get_page(Some(&us), Page::new(2, 1)).unwrap()),
        ["US-NY", "US-TX"]
    );
    assert_eq!(
        region_codes_of(&repo.get_page(None, Page::new(1, 0)).unwrap()),
        ["CA-ON"]
    );
    assert_eq!(repo.count(Some(&country_code("MX"))).unwrap(), 0);
}

#[rstest]
fn region_writes_follow_the_country_rules(provider: SqliteStorageProvider) {
    let repo = provider.mutable_region_repository();
    let ny = region("US-NY", "New York").with_kind("State");
    repo.add(&ny).unwrap();

    assert!(matches!(
        repo.add(&ny).unwrap_err(),
        StorageError::AlreadyExists {
            entity: EntityKind::Region,
            ..
        }
    ));
    assert!(repo
        .update(&region("US-ZZ", "Nowhere"))
        .unwrap_err()
        .is_not_found());

    repo.upsert(&region("US-NY", "New York State")).unwrap();
    repo.upsert(&region("US-NJ", "New Jersey")).unwrap();
    assert_eq!(repo.count(None).unwrap(), 2);
    assert_eq!(
        repo.get(&region_code("US-NY")).unwrap().name.as_deref(),
        Some("New York State")
    );

    let picked = repo
        .get_in(&[region_code("US-NJ"), region_code("FR-75C")])
        .unwrap();
    assert_eq!(region_codes_of(&picked), ["US-NJ"]);

    repo.remove_in(&[region_code("US-NJ")]).unwrap();
    repo.remove(&region_code("US-NY")).unwrap();
    repo.remove(&region_code("US-NY")).unwrap();
    assert_eq!(repo.count(None).unwrap(), 0);
}

#[rstest]
fn composite_loaders_join_country_and_regions(provider: SqliteStorageProvider) {
    provider
        .mutable_country_repository()
        .add(&country("US", "United States"))
        .unwrap();
    provider
        .mutable_region_repository()
        .add_all(&[region("US-NY", "New York"), region("CA-QC", "Quebec")])
        .unwrap();

    let loaded = provider
        .load_country_and_regions(&country_code("US"))
        .unwrap();
    assert_eq!(loaded.country.code.value(), "US");
    assert_eq!(region_codes_of(&loaded.regions), ["US-NY"]);

    let with_region = provider
        .load_country_with_region(&region_code("US-NY"))
        .unwrap();
    assert_eq!(
        with_region.region.map(|region| region.code),
        Some(region_code("US-NY"))
    );

    let without_region = provider
        .load_country_with_region(&region_code("US-WA"))
        .unwrap();
    assert_eq!(without_region.region, None);

    let err = provider
        .load_country_with_region(&region_code("CA-QC"))
        .unwrap_err();
    assert!(err.is_not_found());
}
