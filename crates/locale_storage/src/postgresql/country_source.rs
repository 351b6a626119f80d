//! PostgreSQL-backed country repository.

use super::PostgresDatabase;
use crate::timestamp::{offset, RowTimestamps};
use crate::SharedClock;
use chrono::{DateTime, FixedOffset, Utc};
use locale_core::storage::{
    CountryRepository, EntityKind, MutableCountryRepository, Page, StorageError, StorageResult,
};
use locale_core::{Country, CountryCode};
use log::info;
use parking_lot::Mutex;
use postgres::types::ToSql;
use postgres::{GenericClient, Row};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

const COUNTRY_SELECT_SQL: &str = "SELECT code, name, region_type, flag, emoji_flag FROM country";

/// Country repository over the provider's PostgreSQL client.
pub struct PostgresCountrySource {
    database: Arc<PostgresDatabase>,
    clock: SharedClock,
    write_lock: Mutex<()>,
}

impl PostgresCountrySource {
    pub(crate) fn new(database: Arc<PostgresDatabase>, clock: SharedClock) -> Self {
        Self {
            database,
            clock,
            write_lock: Mutex::new(()),
        }
    }

    /// Storage timestamps of the row for `code`.
    ///
    /// # Errors
    /// Returns [`StorageError::NotFound`] when no country has `code`.
    pub fn row_timestamps(&self, code: &CountryCode) -> StorageResult<RowTimestamps> {
        let row = self.database.with_connection(|client| {
            client
                .query_opt(
                    "SELECT created, updated FROM country WHERE code = $1",
                    &[&code.value()],
                )
                .map_err(StorageError::backend)
        })?;
        let row = row.ok_or_else(|| StorageError::not_found(EntityKind::Country, code.value()))?;
        let created: DateTime<FixedOffset> = row.try_get(0).map_err(StorageError::backend)?;
        let updated: DateTime<FixedOffset> = row.try_get(1).map_err(StorageError::backend)?;
        Ok(RowTimestamps {
            created: offset::decode(created),
            updated: offset::decode(updated),
        })
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }
}

impl CountryRepository for PostgresCountrySource {
    fn count(&self) -> StorageResult<u64> {
        self.database.with_connection(|client| {
            let row = client
                .query_one("SELECT COUNT(*) FROM country", &[])
                .map_err(StorageError::backend)?;
            let count: i64 = row.try_get(0).map_err(StorageError::backend)?;
            u64::try_from(count)
                .map_err(|_| StorageError::InvalidData(format!("negative row count {count}")))
        })
    }

    fn get(&self, code: &CountryCode) -> StorageResult<Country> {
        let sql = format!("{COUNTRY_SELECT_SQL} WHERE code = $1");
        let row = self.database.with_connection(|client| {
            client
                .query_opt(sql.as_str(), &[&code.value()])
                .map_err(StorageError::backend)
        })?;
        match row {
            Some(row) => country_from_row(&row),
            None => Err(StorageError::not_found(EntityKind::Country, code.value())),
        }
    }

    fn get_all(&self) -> StorageResult<Vec<Country>> {
        self.database.with_connection(|client| {
            query_countries(client, &format!("{COUNTRY_SELECT_SQL} ORDER BY code"), &[])
        })
    }

    fn get_in(&self, codes: &[CountryCode]) -> StorageResult<Vec<Country>> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }
        let codes: Vec<&str> = codes.iter().map(CountryCode::value).collect();
        self.database.with_connection(|client| {
            query_countries(
                client,
                &format!("{COUNTRY_SELECT_SQL} WHERE code = ANY($1) ORDER BY code"),
                &[&codes],
            )
        })
    }

    fn get_page(&self, page: Page) -> StorageResult<Vec<Country>> {
        self.database.with_connection(|client| {
            query_countries(
                client,
                &format!("{COUNTRY_SELECT_SQL} ORDER BY code LIMIT $1 OFFSET $2"),
                &[&i64::from(page.count), &i64::from(page.offset)],
            )
        })
    }
}

impl MutableCountryRepository for PostgresCountrySource {
    fn add(&self, country: &Country) -> StorageResult<Country> {
        let _guard = self.write_lock.lock();
        let now = self.now();
        self.database.with_connection(|client| {
            if country_exists(client, &country.code)? {
                return Err(StorageError::already_exists(
                    EntityKind::Country,
                    country.code.value(),
                ));
            }
            insert_country(client, country, now)
        })?;
        info!(
            "event=country_add module=storage status=ok backend=postgresql code={}",
            country.code
        );
        Ok(country.clone())
    }

    fn add_all(&self, countries: &[Country]) -> StorageResult<()> {
        if countries.is_empty() {
            return Ok(());
        }
        let _guard = self.write_lock.lock();
        let now = self.now();
        self.database.with_connection(|client| {
            let mut tx = client.transaction().map_err(StorageError::backend)?;
            let mut seen = HashSet::with_capacity(countries.len());
            for country in countries {
                if !seen.insert(&country.code) || country_exists(&mut tx, &country.code)? {
                    return Err(StorageError::already_exists(
                        EntityKind::Country,
                        country.code.value(),
                    ));
                }
                insert_country(&mut tx, country, now)?;
            }
            tx.commit().map_err(StorageError::backend)
        })?;
        info!(
            "event=country_add_all module=storage status=ok backend=postgresql count={}",
            countries.len()
        );
        Ok(())
    }

    fn update(&self, country: &Country) -> StorageResult<Country> {
        let _guard = self.write_lock.lock();
        let now = self.now();
        let changed = self
            .database
            .with_connection(|client| update_country(client, country, now))?;
        if changed == 0 {
            return Err(StorageError::not_found(
                EntityKind::Country,
                country.code.value(),
            ));
        }
        info!(
            "event=country_update module=storage status=ok backend=postgresql code={}",
            country.code
        );
        Ok(country.clone())
    }

    fn upsert(&self, country: &Country) -> StorageResult<Country> {
        let _guard = self.write_lock.lock();
        let now = self.now();
        let inserted = self.database.with_connection(|client| {
            if update_country(client, country, now)? > 0 {
                return Ok(false);
            }
            insert_country(client, country, now)?;
            Ok(true)
        })?;
        info!(
            "event=country_upsert module=storage status=ok backend=postgresql code={} inserted={}",
            country.code, inserted
        );
        Ok(country.clone())
    }

    fn remove(&self, code: &CountryCode) -> StorageResult<()> {
        let _guard = self.write_lock.lock();
        let removed = self.database.with_connection(|client| {
            client
                .execute("DELETE FROM country WHERE code = $1", &[&code.value()])
                .map_err(StorageError::backend)
        })?;
        info!(
            "event=country_remove module=storage status=ok backend=postgresql code={} removed={}",
            code, removed
        );
        Ok(())
    }

    fn remove_in(&self, codes: &[CountryCode]) -> StorageResult<()> {
        if codes.is_empty() {
            return Ok(());
        }
        let _guard = self.write_lock.lock();
        let values: Vec<&str> = codes.iter().map(CountryCode::value).collect();
        let removed = self.database.with_connection(|client| {
            client
                .execute("DELETE FROM country WHERE code = ANY($1)", &[&values])
                .map_err(StorageError::backend)
        })?;
        info!(
            "event=country_remove_in module=storage status=ok backend=postgresql requested={} removed={}",
            codes.len(),
            removed
        );
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        let _guard = self.write_lock.lock();
        let removed = self.database.with_connection(|client| {
            client
                .execute("DELETE FROM country", &[])
                .map_err(StorageError::backend)
        })?;
        info!("event=country_clear module=storage status=ok backend=postgresql removed={removed}");
        Ok(())
    }
}

fn country_from_row(row: &Row) -> StorageResult<Country> {
    let code: String = row.try_get("code").map_err(StorageError::backend)?;
    Ok(Country {
        code: CountryCode::parse(&code)?,
        name: row.try_get("name").map_err(StorageError::backend)?,
        region_type: row.try_get("region_type").map_err(StorageError::backend)?,
        flag: row.try_get("flag").map_err(StorageError::backend)?,
        emoji_flag: row.try_get("emoji_flag").map_err(StorageError::backend)?,
    })
}

fn query_countries(
    client: &mut impl GenericClient,
    sql: &str,
    params: &[&(dyn ToSql + Sync)],
) -> StorageResult<Vec<Country>> {
    client
        .query(sql, params)
        .map_err(StorageError::backend)?
        .iter()
        .map(country_from_row)
        .collect()
}

fn country_exists(client: &mut impl GenericClient, code: &CountryCode) -> StorageResult<bool> {
    let row = client
        .query_one(
            "SELECT EXISTS(SELECT 1 FROM country WHERE code = $1)",
            &[&code.value()],
        )
        .map_err(StorageError::backend)?;
    row.try_get(0).map_err(StorageError::backend)
}

fn insert_country(
    client: &mut impl GenericClient,
    country: &Country,
    now: DateTime<Utc>,
) -> StorageResult<()> {
    client
        .execute(
            "INSERT INTO country (id, created, updated, code, name, region_type, flag, emoji_flag)
             VALUES ($1, $2, $2, $3, $4, $5, $6, $7)",
            &[
                &Uuid::new_v4().simple().to_string(),
                &offset::encode(now),
                &country.code.value(),
                &country.name.as_deref(),
                &country.region_type.as_deref(),
                &country.flag.as_deref(),
                &country.emoji_flag.as_deref(),
            ],
        )
        .map_err(StorageError::backend)?;
    Ok(())
}

fn update_country(
    client: &mut impl GenericClient,
    country: &Country,
    now: DateTime<Utc>,
) -> StorageResult<u64> {
    client
        .execute(
            "UPDATE country
             SET updated = $1, name = $2, region_type = $3, flag = $4, emoji_flag = $5
             WHERE code = $6",
            &[
                &offset::encode(now),
                &country.name.as_deref(),
                &country.region_type.as_deref(),
                &country.flag.as_deref(),
                &country.emoji_flag.as_deref(),
                &country.code.value(),
            ],
        )
        .map_err(StorageError::backend)
}
