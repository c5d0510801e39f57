//! SQLite cache of raw crawl bundles.
//!
//! A full crawl is saved once and can be reloaded by later runs, so the
//! extraction stage can be re-run without touching the network.

use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection};

use crate::types::RawApplicationBundle;

const SCHEMA_VERSION: i32 = 1;

#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("cache schema version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: i32, supported: i32 },
}

pub struct BundleCache {
    conn: Connection,
}

impl BundleCache {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;
        Ok(Self { conn })
    }

    /// Open an in-memory cache (for testing).
    pub fn open_in_memory() -> Result<Self, CacheError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    pub fn init(&self) -> Result<(), CacheError> {
        let version: i32 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;
        if version > SCHEMA_VERSION {
            return Err(CacheError::UnsupportedVersion {
                found: version,
                supported: SCHEMA_VERSION,
            });
        }

        let schema = include_str!("../../schema/bundle_cache.sql");
        self.conn.execute_batch(schema)?;

        if version < SCHEMA_VERSION {
            self.conn
                .pragma_update(None, "user_version", SCHEMA_VERSION)?;
        }
        Ok(())
    }

    /// Replaces the cached crawl with `bundles`, keeping their order.
    pub fn save(&mut self, bundles: &[RawApplicationBundle]) -> Result<usize, CacheError> {
        let crawled_at = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM raw_bundles", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO raw_bundles (
                   seq, source_url, main_detail_html, dates_html, document_bytes, crawled_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for (seq, bundle) in bundles.iter().enumerate() {
                stmt.execute(params![
                    seq as i64,
                    bundle.source_url,
                    bundle.main_detail_html,
                    bundle.dates_html,
                    bundle.document_bytes,
                    crawled_at,
                ])?;
            }
        }
        tx.commit()?;
        tracing::info!("Cached {} raw bundles", bundles.len());
        Ok(bundles.len())
    }

    /// All cached bundles, in the order they were discovered.
    pub fn load(&self) -> Result<Vec<RawApplicationBundle>, CacheError> {
        let mut stmt = self.conn.prepare(
            "SELECT source_url, main_detail_html, dates_html, document_bytes
             FROM raw_bundles
             ORDER BY seq",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(RawApplicationBundle {
                source_url: row.get(0)?,
                main_detail_html: row.get(1)?,
                dates_html: row.get(2)?,
                document_bytes: row.get(3)?,
            })
        })?;
        let bundles = rows.collect::<Result<Vec<_>, _>>()?;
        tracing::info!("Loaded {} raw bundles from cache", bundles.len());
        Ok(bundles)
    }

    pub fn count(&self) -> Result<usize, CacheError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(1) FROM raw_bundles", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
