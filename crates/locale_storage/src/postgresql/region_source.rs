//! PostgreSQL-backed region repository.

use super::PostgresDatabase;
use crate::timestamp::{offset, RowTimestamps};
use crate::SharedClock;
use chrono::{DateTime, FixedOffset, Utc};
use locale_core::storage::{
    EntityKind, MutableRegionRepository, Page, RegionRepository, StorageError, StorageResult,
};
use locale_core::{CountryCode, Region, RegionCode};
use log::info;
use parking_lot::Mutex;
use postgres::types::ToSql;
use postgres::{GenericClient, Row};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

const REGION_SELECT_SQL: &str = "SELECT code, name, type, flag, emoji_flag FROM region";
const COUNTRY_FILTER_SQL: &str = "($1::TEXT IS NULL OR country_code = $1)";

/// Region repository over the provider's PostgreSQL client.
pub struct PostgresRegionSource {
    database: Arc<PostgresDatabase>,
    clock: SharedClock,
    write_lock: Mutex<()>,
}

impl PostgresRegionSource {
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
    /// Returns [`StorageError::NotFound`] when no region has `code`.
    pub fn row_timestamps(&self, code: &RegionCode) -> StorageResult<RowTimestamps> {
        let row = self.database.with_connection(|client| {
            client
                .query_opt(
                    "SELECT created, updated FROM region WHERE code = $1",
                    &[&code.value()],
                )
                .map_err(StorageError::backend)
        })?;
        let row = row.ok_or_else(|| StorageError::not_found(EntityKind::Region, code.value()))?;
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

impl RegionRepository for PostgresRegionSource {
    fn count(&self, country: Option<&CountryCode>) -> StorageResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM region WHERE {COUNTRY_FILTER_SQL}");
        let country = country.map(CountryCode::value);
        self.database.with_connection(|client| {
            let row = client
                .query_one(sql.as_str(), &[&country])
                .map_err(StorageError::backend)?;
            let count: i64 = row.try_get(0).map_err(StorageError::backend)?;
            u64::try_from(count)
                .map_err(|_| StorageError::InvalidData(format!("negative row count {count}")))
        })
    }

    fn get(&self, code: &RegionCode) -> StorageResult<Region> {
        let sql = format!("{REGION_SELECT_SQL} WHERE code = $1");
        let row = self.database.with_connection(|client| {
            client
                .query_opt(sql.as_str(), &[&code.value()])
                .map_err(StorageError::backend)
        })?;
        match row {
            Some(row) => region_from_row(&row),
            None => Err(StorageError::not_found(EntityKind::Region, code.value())),
        }
    }

    fn get_all(&self, country: Option<&CountryCode>) -> StorageResult<Vec<Region>> {
        let country = country.map(CountryCode::value);
        self.database.with_connection(|client| {
            query_regions(
                client,
                &format!("{REGION_SELECT_SQL} WHERE {COUNTRY_FILTER_SQL} ORDER BY code"),
                &[&country],
            )
        })
    }

    fn get_in(&self, codes: &[RegionCode]) -> StorageResult<Vec<Region>> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }
        let codes: Vec<&str> = codes.iter().map(RegionCode::value).collect();
        self.database.with_connection(|client| {
            query_regions(
                client,
                &format!("{REGION_SELECT_SQL} WHERE code = ANY($1) ORDER BY code"),
                &[&codes],
            )
        })
    }

    fn get_page(&self, country: Option<&CountryCode>, page: Page) -> StorageResult<Vec<Region>> {
        let country = country.map(CountryCode::value);
        self.database.with_connection(|client| {
            query_regions(
                client,
                &format!(
                    "{REGION_SELECT_SQL} WHERE {COUNTRY_FILTER_SQL} ORDER BY code LIMIT $2 OFFSET $3"
                ),
                &[&country, &i64::from(page.count), &i64::from(page.offset)],
            )
        })
    }
}

impl MutableRegionRepository for PostgresRegionSource {
    fn add(&self, region: &Region) -> StorageResult<Region> {
        let _guard = self.write_lock.lock();
        let now = self.now();
        self.database.with_connection(|client| {
            if region_exists(client, &region.code)? {
                return Err(StorageError::already_exists(
                    EntityKind::Region,
                    region.code.value(),
                ));
            }
            insert_region(client, region, now)
        })?;
        info!(
            "event=region_add module=storage status=ok backend=postgresql code={}",
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
        self.database.with_connection(|client| {
            let mut tx = client.transaction().map_err(StorageError::backend)?;
            let mut seen = HashSet::with_capacity(regions.len());
            for region in regions {
                if !seen.insert(&region.code) || region_exists(&mut tx, &region.code)? {
                    return Err(StorageError::already_exists(
                        EntityKind::Region,
                        region.code.value(),
                    ));
                }
                insert_region(&mut tx, region, now)?;
            }
            tx.commit().map_err(StorageError::backend)
        })?;
        info!(
            "event=region_add_all module=storage status=ok backend=postgresql count={}",
            regions.len()
        );
        Ok(())
    }

    fn update(&self, region: &Region) -> StorageResult<Region> {
        let _guard = self.write_lock.lock();
        let now = self.now();
        let changed = self
            .database
            .with_connection(|client| update_region(client, region, now))?;
        if changed == 0 {
            return Err(StorageError::not_found(
                EntityKind::Region,
                region.code.value(),
            ));
        }
        info!(
            "event=region_update module=storage status=ok backend=postgresql code={}",
            region.code
        );
        Ok(region.clone())
    }

    fn upsert(&self, region: &Region) -> StorageResult<Region> {
        let _guard = self.write_lock.lock();
        let now = self.now();
        let inserted = self.database.with_connection(|client| {
            if update_region(client, region, now)? > 0 {
                return Ok(false);
            }
            insert_region(client, region, now)?;
            Ok(true)
        })?;
        info!(
            "event=region_upsert module=storage status=ok backend=postgresql code={} inserted={}",
            region.code, inserted
        );
        Ok(region.clone())
    }

    fn remove(&self, code: &RegionCode) -> StorageResult<()> {
        let _guard = self.write_lock.lock();
        let removed = self.database.with_connection(|client| {
            client
                .execute("DELETE FROM region WHERE code = $1", &[&code.value()])
                .map_err(StorageError::backend)
        })?;
        info!(
            "event=region_remove module=storage status=ok backend=postgresql code={} removed={}",
            code, removed
        );
        Ok(())
    }

    fn remove_in(&self, codes: &[RegionCode]) -> StorageResult<()> {
        if codes.is_empty() {
            return Ok(());
        }
        let _guard = self.write_lock.lock();
        let values: Vec<&str> = codes.iter().map(RegionCode::value).collect();
        let removed = self.database.with_connection(|client| {
            client
                .execute("DELETE FROM region WHERE code = ANY($1)", &[&values])
                .map_err(StorageError::backend)
        })?;
        info!(
            "event=region_remove_in module=storage status=ok backend=postgresql requested={} removed={}",
            codes.len(),
            removed
        );
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        let _guard = self.write_lock.lock();
        let removed = self.database.with_connection(|client| {
            client
                .execute("DELETE FROM region", &[])
                .map_err(StorageError::backend)
        })?;
        info!("event=region_clear module=storage status=ok backend=postgresql removed={removed}");
        Ok(())
    }
}

fn region_from_row(row: &Row) -> StorageResult<Region> {
    let code: String = row.try_get("code").map_err(StorageError::backend)?;
    Ok(Region {
        code: RegionCode::parse(&code)?,
        name: row.try_get("name").map_err(StorageError::backend)?,
        kind: row.try_get("type").map_err(StorageError::backend)?,
        flag: row.try_get("flag").map_err(StorageError::backend)?,
        emoji_flag: row.try_get("emoji_flag").map_err(StorageError::backend)?,
    })
}

fn query_regions(
    client: &mut impl GenericClient,
    sql: &str,
    params: &[&(dyn ToSql + Sync)],
) -> StorageResult<Vec<Region>> {
    client
        .query(sql, params)
        .map_err(StorageError::backend)?
        .iter()
        .map(region_from_row)
        .collect()
}

fn region_exists(client: &mut impl GenericClient, code: &RegionCode) -> StorageResult<bool> {
    let row = client
        .query_one(
            "SELECT EXISTS(SELECT 1 FROM region WHERE code = $1)",
            &[&code.value()],
        )
        .map_err(StorageError::backend)?;
    row.try_get(0).map_err(StorageError::backend)
}

fn insert_region(
    client: &mut impl GenericClient,
    region: &Region,
    now: DateTime<Utc>,
) -> StorageResult<()> {
    client
        .execute(
            "INSERT INTO region (id, created, updated, code, country_code, name, type, flag, emoji_flag)
             VALUES ($1, $2, $2, $3, $4, $5, $6, $7, $8)",
            &[
                &Uuid::new_v4().simple().to_string(),
                &offset::encode(now),
                &region.code.value(),
                &region.country_code().value(),
                &region.name.as_deref(),
                &region.kind.as_deref(),
                &region.flag.as_deref(),
                &region.emoji_flag.as_deref(),
            ],
        )
        .map_err(StorageError::backend)?;
    Ok(())
}

fn update_region(
    client: &mut impl GenericClient,
    region: &Region,
    now: DateTime<Utc>,
) -> StorageResult<u64> {
    client
        .execute(
            "UPDATE region
             SET updated = $1, name = $2, type = $3, flag = $4, emoji_flag = $5
             WHERE code = $6",
            &[
                &offset::encode(now),
                &region.name.as_deref(),
                &region.kind.as_deref(),
                &region.flag.as_deref(),
                &region.emoji_flag.as_deref(),
                &region.code.value(),
            ],
        )
        .map_err(StorageError::backend)
}
