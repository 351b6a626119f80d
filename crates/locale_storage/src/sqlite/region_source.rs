//! SQLite-backed region repository.
//!
//! Regions carry a denormalized `country_code` column derived from their
//! code so per-country listings hit `region_country_code_idx`.

use super::{code_array, SqliteDatabase, CODE_IN_JSON_SQL};
use crate::timestamp::{millis, RowTimestamps};
use crate::SharedClock;
use chrono::{DateTime, Utc};
use locale_core::storage::{
    EntityKind, MutableRegionRepository, Page, RegionRepository, StorageError, StorageResult,
};
use locale_core::{CountryCode, Region, RegionCode};
use log::info;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Params, Row};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

const REGION_SELECT_SQL: &str = "SELECT
    code,
    name,
    type,
    flag,
    emoji_flag
FROM region";

/// Region repository over the provider's SQLite connection.
pub struct SqliteRegionSource {
    database: Arc<SqliteDatabase>,
    clock: SharedClock,
    write_lock: Mutex<()>,
}

impl SqliteRegionSource {
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
    /// Returns [`StorageError::NotFound`] when no region has `code`.
    pub fn row_timestamps(&self, code: &RegionCode) -> StorageResult<RowTimestamps> {
        let stored = self.database.with_connection(|conn| {
            conn.query_row(
                "SELECT created, updated FROM region WHERE code = ?1;",
                params![code.value()],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()
            .map_err(StorageError::backend)
        })?;
        let (created, updated) =
            stored.ok_or_else(|| StorageError::not_found(EntityKind::Region, code.value()))?;
        Ok(RowTimestamps {
            created: millis::decode(created)?,
            updated: millis::decode(updated)?,
        })
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }
}

impl RegionRepository for SqliteRegionSource {
    fn count(&self, country: Option<&CountryCode>) -> StorageResult<u64> {
        self.database.with_connection(|conn| {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM region WHERE (?1 IS NULL OR country_code = ?1);",
                    params![country.map(CountryCode::value)],
                    |row| row.get(0),
                )
                .map_err(StorageError::backend)?;
            u64::try_from(count)
                .map_err(|_| StorageError::InvalidData(format!("negative row count {count}")))
        })
    }

    fn get(&self, code: &RegionCode) -> StorageResult<Region> {
        self.database
            .with_connection(|conn| fetch_region(conn, code))?
            .ok_or_else(|| StorageError::not_found(EntityKind::Region, code.value()))
    }

    fn get_all(&self, country: Option<&CountryCode>) -> StorageResult<Vec<Region>> {
        self.database.with_connection(|conn| {
            query_regions(
                conn,
                &format!(
                    "{REGION_SELECT_SQL}
                     WHERE (?1 IS NULL OR country_code = ?1)
                     ORDER BY code;"
                ),
                params![country.map(CountryCode::value)],
            )
        })
    }

    fn get_in(&self, codes: &[RegionCode]) -> StorageResult<Vec<Region>> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!("{REGION_SELECT_SQL} WHERE {CODE_IN_JSON_SQL} ORDER BY code;");
        let codes = code_array(codes.iter().map(RegionCode::value))?;
        self.database
            .with_connection(|conn| query_regions(conn, &sql, params![codes]))
    }

    fn get_page(&self, country: Option<&CountryCode>, page: Page) -> StorageResult<Vec<Region>> {
        self.database.with_connection(|conn| {
            query_regions(
                conn,
                &format!(
                    "{REGION_SELECT_SQL}
                     WHERE (?1 IS NULL OR country_code = ?1)
                     ORDER BY code
                     LIMIT ?2 OFFSET ?3;"
                ),
                params![
                    country.map(CountryCode::value),
                    i64::from(page.count),
                    i64::from(page.offset),
                ],
            )
        })
    }
}

impl MutableRegionRepository for SqliteRegionSource {
    fn add(&self, region: &Region) -> StorageResult<Region> {
        let _guard = self.write_lock.lock();
        let now = self.now();
        self.database.with_connection(|conn| {
            if region_exists(conn, &region.code)? {
                return Err(StorageError::already_exists(
                    EntityKind::Region,
                    region.code.value(),
                ));
            }
            insert_region(conn, region, now)
        })?;
        info!(
            "event=region_add module=storage status=ok backend=sqlite code={}",
            region.code
        );
        Ok(region.clone())
    }

    fn add_all(&self, regions: &[Region]) -> StorageResult<()> {
        if regions.is_empty() {
            return Ok(());
        }
        let _guard = self.write_lock.lock();
        let now = self.now();
        self.database.with_connection(|conn| {
            let tx = conn.transaction().map_err(StorageError::backend)?;
            let mut seen = HashSet::with_capacity(regions.len());
            for region in regions {
                if !seen.insert(&region.code) || region_exists(&tx, &region.code)? {
                    return Err(StorageError::already_exists(
                        EntityKind::Region,
                        region.code.value(),
                    ));
                }
                insert_region(&tx, region, now)?;
            }
            tx.commit().map_err(StorageError::backend)
        })?;
        info!(
            "event=region_add_all module=storage status=ok backend=sqlite count={}",
            regions.len()
        );
        Ok(())
    }

    fn update(&self, region: &Region) -> StorageResult<Region> {
        let _guard = self.write_lock.lock();
        let now = self.now();
        let changed = self
            .database
            .with_connection(|conn| update_region(conn, region, now))?;
        if changed == 0 {
            return Err(StorageError::not_found(
                EntityKind::Region,
                region.code.value(),
            ));
        }
        info!(
            "event=region_update module=storage status=ok backend=sqlite code={}",
            region.code
        );
        Ok(region.clone())
    }

    fn upsert(&self, region: &Region) -> StorageResult<Region> {
        let _guard = self.write_lock.lock();
        let now = self.now();
        let inserted = self.database.with_connection(|conn| {
            if update_region(conn, region, now)? > 0 {
                return Ok(false);
            }
            insert_region(conn, region, now)?;
            Ok(true)
        })?;
        info!(
            "event=region_upsert module=storage status=ok backend=sqlite code={} inserted={}",
            region.code, inserted
        );
        Ok(region.clone())
    }

    fn remove(&self, code: &RegionCode) -> StorageResult<()> {
        let _guard = self.write_lock.lock();
        let removed = self.database.with_connection(|conn| {
            conn.execute("DELETE FROM region WHERE code = ?1;", params![code.value()])
                .map_err(StorageError::backend)
        })?;
        info!(
            "event=region_remove module=storage status=ok backend=sqlite code={} removed={}",
            code, removed
        );
        Ok(())
    }

    fn remove_in(&self, codes: &[RegionCode]) -> StorageResult<()> {
        if codes.is_empty() {
            return Ok(());
        }
        let _guard = self.write_lock.lock();
        let sql = format!("DELETE FROM region WHERE {CODE_IN_JSON_SQL};");
        let values = code_array(codes.iter().map(RegionCode::value))?;
        let removed = self.database.with_connection(|conn| {
            conn.execute(&sql, params![values])
                .map_err(StorageError::backend)
        })?;
        info!(
            "event=region_remove_in module=storage status=ok backend=sqlite requested={} removed={}",
            codes.len(),
            removed
        );
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        let _guard = self.write_lock.lock();
        let removed = self.database.with_connection(|conn| {
            conn.execute("DELETE FROM region;", [])
                .map_err(StorageError::backend)
        })?;
        info!("event=region_clear module=storage status=ok backend=sqlite removed={removed}");
        Ok(())
    }
}

struct RegionRow {
    code: String,
    name: Option<String>,
    kind: Option<String>,
    flag: Option<String>,
    emoji_flag: Option<String>,
}

impl RegionRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            code: row.get(0)?,
            name: row.get(1)?,
            kind: row.get(2)?,
            flag: row.get(3)?,
            emoji_flag: row.get(4)?,
        })
    }

    fn into_region(self) -> StorageResult<Region> {
        Ok(Region {
            code: RegionCode::parse(&self.code)?,
            name: self.name,
            kind: self.kind,
            flag: self.flag,
            emoji_flag: self.emoji_flag,
        })
    }
}

fn query_regions(conn: &Connection, sql: &str, params: impl Params) -> StorageResult<Vec<Region>> {
    let mut stmt = conn.prepare(sql).map_err(StorageError::backend)?;
    let rows = stmt
        .query_map(params, RegionRow::read)
        .map_err(StorageError::backend)?;
    let mut regions = Vec::new();
    for row in rows {
        regions.push(row.map_err(StorageError::backend)?.into_region()?);
    }
    Ok(regions)
}

fn fetch_region(conn: &Connection, code: &RegionCode) -> StorageResult<Option<Region>> {
    conn.query_row(
        &format!("{REGION_SELECT_SQL} WHERE code = ?1;"),
        params![code.value()],
        RegionRow::read,
    )
    .optional()
    .map_err(StorageError::backend)?
    .map(RegionRow::into_region)
    .transpose()
}

fn region_exists(conn: &Connection, code: &RegionCode) -> StorageResult<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM region WHERE code = ?1);",
        params![code.value()],
        |row| row.get(0),
    )
    .map_err(StorageError::backend)
}

fn insert_region(conn: &Connection, region: &Region, now: DateTime<Utc>) -> StorageResult<()> {
    conn.execute(
        "INSERT INTO region (
            id,
            created,
            updated,
            code,
            country_code,
            name,
            type,
            flag,
            emoji_flag
        ) VALUES (?1, ?2, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
        params![
            Uuid::new_v4().simple().to_string(),
            millis::encode(now),
            region.code.value(),
            region.country_code().value(),
            region.name.as_deref(),
            region.kind.as_deref(),
            region.flag.as_deref(),
            region.emoji_flag.as_deref(),
        ],
    )
    .map_err(StorageError::backend)?;
    Ok(())
}

fn update_region(conn: &Connection, region: &Region, now: DateTime<Utc>) -> StorageResult<usize> {
    conn.execute(
        "UPDATE region
         SET
            updated = ?1,
            name = ?2,
            type = ?3,
            flag = ?4,
            emoji_flag = ?5
         WHERE code = ?6;",
        params![
            millis::encode(now),
            region.name.as_deref(),
            region.kind.as_deref(),
            region.flag.as_deref(),
            region.emoji_flag.as_deref(),
            region.code.value(),
        ],
    )
    .map_err(StorageError::backend)
}
