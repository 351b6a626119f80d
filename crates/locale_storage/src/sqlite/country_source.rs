//! SQLite-backed country repository.
//!
//! # Invariants
//! - Writes hold `write_lock` for their whole read-check-write sequence.
//! - `code` is unique; duplicates are reported before the constraint fires.
//! - Persisted codes are re-validated on read; bad rows surface as
//!   `InvalidData` instead of being skipped.

use super::{code_array, SqliteDatabase, CODE_IN_JSON_SQL};
use crate::timestamp::{millis, RowTimestamps};
use crate::SharedClock;
use chrono::{DateTime, Utc};
use locale_core::storage::{
    CountryRepository, EntityKind, MutableCountryRepository, Page, StorageError, StorageResult,
};
use locale_core::{Country, CountryCode};
use log::info;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Params, Row};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

const COUNTRY_SELECT_SQL: &str = "SELECT
    code,
    name,
    region_type,
    flag,
    emoji_flag
FROM country";

/// Country repository over the provider's SQLite connection.
pub struct SqliteCountrySource {
    database: Arc<SqliteDatabase>,
    clock: SharedClock,
    write_lock: Mutex<()>,
}

impl SqliteCountrySource {
    pub(crate) fn new(database: Arc<SqliteDatabase>, clock: SharedClock) -> Self {
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
        let stored = self.database.with_connection(|conn| {
            conn.query_row(
                "SELECT created, updated FROM country WHERE code = ?1;",
                params![code.value()],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()
            .map_err(StorageError::backend)
        })?;
        let (created, updated) =
            stored.ok_or_else(|| StorageError::not_found(EntityKind::Country, code.value()))?;
        Ok(RowTimestamps {
            created: millis::decode(created)?,
            updated: millis::decode(updated)?,
        })
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }
}

impl CountryRepository for SqliteCountrySource {
    fn count(&self) -> StorageResult<u64> {
        self.database.with_connection(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM country;", [], |row| row.get(0))
                .map_err(StorageError::backend)?;
            u64::try_from(count)
                .map_err(|_| StorageError::InvalidData(format!("negative row count {count}")))
        })
    }

    fn get(&self, code: &CountryCode) -> StorageResult<Country> {
        self.database
            .with_connection(|conn| fetch_country(conn, code))?
            .ok_or_else(|| StorageError::not_found(EntityKind::Country, code.value()))
    }

    fn get_all(&self) -> StorageResult<Vec<Country>> {
        self.database.with_connection(|conn| {
            query_countries(conn, &format!("{COUNTRY_SELECT_SQL} ORDER BY code;"), [])
        })
    }

    fn get_in(&self, codes: &[CountryCode]) -> StorageResult<Vec<Country>> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!("{COUNTRY_SELECT_SQL} WHERE {CODE_IN_JSON_SQL} ORDER BY code;");
        let codes = code_array(codes.iter().map(CountryCode::value))?;
        self.database
            .with_connection(|conn| query_countries(conn, &sql, params![codes]))
    }

    fn get_page(&self, page: Page) -> StorageResult<Vec<Country>> {
        self.database.with_connection(|conn| {
            query_countries(
                conn,
                &format!("{COUNTRY_SELECT_SQL} ORDER BY code LIMIT ?1 OFFSET ?2;"),
                params![i64::from(page.count), i64::from(page.offset)],
            )
        })
    }
}

impl MutableCountryRepository for SqliteCountrySource {
    fn add(&self, country: &Country) -> StorageResult<Country> {
        let _guard = self.write_lock.lock();
        let now = self.now();
        self.database.with_connection(|conn| {
            if country_exists(conn, &country.code)? {
                return Err(StorageError::already_exists(
                    EntityKind::Country,
                    country.code.value(),
                ));
            }
            insert_country(conn, country, now)
        })?;
        info!(
            "event=country_add module=storage status=ok backend=sqlite code={}",
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
        self.database.with_connection(|conn| {
            let tx = conn.transaction().map_err(StorageError::backend)?;
            let mut seen = HashSet::with_capacity(countries.len());
            for country in countries {
                if !seen.insert(&country.code) || country_exists(&tx, &country.code)? {
                    return Err(StorageError::already_exists(
                        EntityKind::Country,
                        country.code.value(),
                    ));
                }
                insert_country(&tx, country, now)?;
            }
            tx.commit().map_err(StorageError::backend)
        })?;
        info!(
            "event=country_add_all module=storage status=ok backend=sqlite count={}",
            countries.len()
        );
        Ok(())
    }

    fn update(&self, country: &Country) -> StorageResult<Country> {
        let _guard = self.write_lock.lock();
        let now = self.now();
        let changed = self
            .database
            .with_connection(|conn| update_country(conn, country, now))?;
        if changed == 0 {
            return Err(StorageError::not_found(
                EntityKind::Country,
                country.code.value(),
            ));
        }
        info!(
            "event=country_update module=storage status=ok backend=sqlite code={}",
            country.code
        );
        Ok(country.clone())
    }

    fn upsert(&self, country: &Country) -> StorageResult<Country> {
        let _guard = self.write_lock.lock();
        let now = self.now();
        let inserted = self.database.with_connection(|conn| {
            if update_country(conn, country, now)? > 0 {
                return Ok(false);
            }
            insert_country(conn, country, now)?;
            Ok(true)
        })?;
        info!(
            "event=country_upsert module=storage status=ok backend=sqlite code={} inserted={}",
            country.code, inserted
        );
        Ok(country.clone())
    }

    fn remove(&self, code: &CountryCode) -> StorageResult<()> {
        let _guard = self.write_lock.lock();
        let removed = self.database.with_connection(|conn| {
            conn.execute("DELETE FROM country WHERE code = ?1;", params![code.value()])
                .map_err(StorageError::backend)
        })?;
        info!(
            "event=country_remove module=storage status=ok backend=sqlite code={} removed={}",
            code, removed
        );
        Ok(())
    }

    fn remove_in(&self, codes: &[CountryCode]) -> StorageResult<()> {
        if codes.is_empty() {
            return Ok(());
        }
        let _guard = self.write_lock.lock();
        let sql = format!("DELETE FROM country WHERE {CODE_IN_JSON_SQL};");
        let values = code_array(codes.iter().map(CountryCode::value))?;
        let removed = self.database.with_connection(|conn| {
            conn.execute(&sql, params![values])
                .map_err(StorageError::backend)
        })?;
        info!(
            "event=country_remove_in module=storage status=ok backend=sqlite requested={} removed={}",
            codes.len(),
            removed
        );
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        let _guard = self.write_lock.lock();
        let removed = self.database.with_connection(|conn| {
            conn.execute("DELETE FROM country;", [])
                .map_err(StorageError::backend)
        })?;
        info!("event=country_clear module=storage status=ok backend=sqlite removed={removed}");
        Ok(())
    }
}

struct CountryRow {
    code: String,
    name: Option<String>,
    region_type: Option<String>,
    flag: Option<String>,
    emoji_flag: Option<String>,
}

impl CountryRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            code: row.get(0)?,
            name: row.get(1)?,
            region_type: row.get(2)?,
            flag: row.get(3)?,
            emoji_flag: row.get(4)?,
        })
    }

    fn into_country(self) -> StorageResult<Country> {
        Ok(Country {
            code: CountryCode::parse(&self.code)?,
            name: self.name,
            region_type: self.region_type,
            flag: self.flag,
            emoji_flag: self.emoji_flag,
        })
    }
}

fn query_countries(
    conn: &Connection,
    sql: &str,
    params: impl Params,
) -> StorageResult<Vec<Country>> {
    let mut stmt = conn.prepare(sql).map_err(StorageError::backend)?;
    let rows = stmt
        .query_map(params, CountryRow::read)
        .map_err(StorageError::backend)?;
    let mut countries = Vec::new();
    for row in rows {
        countries.push(row.map_err(StorageError::backend)?.into_country()?);
    }
    Ok(countries)
}

fn fetch_country(conn: &Connection, code: &CountryCode) -> StorageResult<Option<Country>> {
    conn.query_row(
        &format!("{COUNTRY_SELECT_SQL} WHERE code = ?1;"),
        params![code.value()],
        CountryRow::read,
    )
    .optional()
    .map_err(StorageError::backend)?
    .map(CountryRow::into_country)
    .transpose()
}

fn country_exists(conn: &Connection, code: &CountryCode) -> StorageResult<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM country WHERE code = ?1);",
        params![code.value()],
        |row| row.get(0),
    )
    .map_err(StorageError::backend)
}

fn insert_country(conn: &Connection, country: &Country, now: DateTime<Utc>) -> StorageResult<()> {
    conn.execute(
        "INSERT INTO country (
            id,
            created,
            updated,
            code,
            name,
            region_type,
            flag,
            emoji_flag
        ) VALUES (?1, ?2, ?2, ?3, ?4, ?5, ?6, ?7);",
        params![
            Uuid::new_v4().simple().to_string(),
            millis::encode(now),
            country.code.value(),
            country.name.as_deref(),
            country.region_type.as_deref(),
            country.flag.as_deref(),
            country.emoji_flag.as_deref(),
        ],
    )
    .map_err(StorageError::backend)?;
    Ok(())
}

fn update_country(
    conn: &Connection,
    country: &Country,
    now: DateTime<Utc>,
) -> StorageResult<usize> {
    conn.execute(
        "UPDATE country
         SET
            updated = ?1,
            name = ?2,
            region_type = ?3,
            flag = ?4,
            emoji_flag = ?5
         WHERE code = ?6;",
        params![
            millis::encode(now),
            country.name.as_deref(),
            country.region_type.as_deref(),
            country.flag.as_deref(),
            country.emoji_flag.as_deref(),
            country.code.value(),
        ],
    )
    .map_err(StorageError::backend)
}
