//! Enrichment cache row operations.
//!
//! One table holds every enrichment kind; `(kind, cache_key)` is the primary key.

use super::connection::CacheDb;
use super::store::{CacheBackend, CacheKind};
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A raw cache row as stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheRow {
    pub cache_key: String,
    pub payload_json: String,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

#[async_trait::async_trait]
impl CacheBackend for CacheDb {
    async fn read(&self, kind: CacheKind, key: &str) -> Result<Option<CacheRow>, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CacheRow>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT cache_key, payload_json, created_at FROM enrichment_cache
                     WHERE kind = ?1 AND cache_key = ?2",
                )?;

                let result = stmt.query_row(params![kind.as_str(), key], |row| {
                    Ok(CacheRow { cache_key: row.get(0)?, payload_json: row.get(1)?, created_at: row.get(2)? })
                });

                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    async fn upsert(&self, kind: CacheKind, key: &str, payload_json: &str, created_at: &str) -> Result<(), Error> {
        let key = key.to_string();
        let payload_json = payload_json.to_string();
        let created_at = created_at.to_string();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO enrichment_cache (kind, cache_key, payload_json, created_at)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT(kind, cache_key) DO UPDATE SET
                        payload_json = excluded.payload_json,
                        created_at = excluded.created_at",
                    params![kind.as_str(), key, payload_json, created_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, kind: CacheKind, key: &str) -> Result<u64, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute(
                    "DELETE FROM enrichment_cache WHERE kind = ?1 AND cache_key = ?2",
                    params![kind.as_str(), key],
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete_by_prefix(&self, kind: CacheKind, prefix: &str) -> Result<u64, Error> {
        let prefix = prefix.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                // substr avoids LIKE wildcard escaping for '%' and '_' in keys.
                let count = conn.execute(
                    "DELETE FROM enrichment_cache
                     WHERE kind = ?1 AND substr(cache_key, 1, length(?2)) = ?2",
                    params![kind.as_str(), prefix],
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete_many(&self, kind: CacheKind, keys: &[String]) -> Result<u64, Error> {
        let keys = keys.to_vec();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let tx = conn.unchecked_transaction()?;
                let mut deleted = 0u64;
                {
                    let mut stmt = tx.prepare("DELETE FROM enrichment_cache WHERE kind = ?1 AND cache_key = ?2")?;
                    for key in &keys {
                        deleted += stmt.execute(params![kind.as_str(), key])? as u64;
                    }
                }
                tx.commit()?;
                Ok(deleted)
            })
            .await
            .map_err(Error::from)
    }
}

impl CacheDb {
    /// Count rows of one kind, fresh or not.
    pub async fn count_entries(&self, kind: CacheKind) -> Result<u64, Error> {
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM enrichment_cache WHERE kind = ?1",
                    params![kind.as_str()],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
