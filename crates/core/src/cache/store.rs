//! Versioned TTL key-value store over a cache backend.
//!
//! `CacheStore` owns the read-time policy: expiry, lazy eviction, and
//! fail-open behavior. The backend only moves rows.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::task::JoinHandle;

use super::entries::CacheRow;
use crate::Error;

/// Enrichment kind a cache entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CacheKind {
    Insights,
    Images,
}

impl CacheKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheKind::Insights => "insights",
            CacheKind::Images => "images",
        }
    }
}

/// Row-level persistence used by [`CacheStore`].
#[async_trait::async_trait]
pub trait CacheBackend: Send + Sync {
    async fn read(&self, kind: CacheKind, key: &str) -> Result<Option<CacheRow>, Error>;

    /// Insert or replace a row. Concurrent writers are last-write-wins.
    async fn upsert(&self, kind: CacheKind, key: &str, payload_json: &str, created_at: &str) -> Result<(), Error>;

    async fn delete(&self, kind: CacheKind, key: &str) -> Result<u64, Error>;

    async fn delete_by_prefix(&self, kind: CacheKind, prefix: &str) -> Result<u64, Error>;

    async fn delete_many(&self, kind: CacheKind, keys: &[String]) -> Result<u64, Error>;
}

/// Cache view for one enrichment kind with a fixed TTL.
#[derive(Clone)]
pub struct CacheStore {
    backend: Arc<dyn CacheBackend>,
    kind: CacheKind,
    ttl: Duration,
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("kind", &self.kind)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

/// True when an entry created at `created_at` is older than `ttl` at `now`.
///
/// An entry exactly `ttl` old is still fresh.
pub fn is_expired(created_at: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
    now.signed_duration_since(created_at) > ttl
}

impl CacheStore {
    pub fn new(backend: Arc<dyn CacheBackend>, kind: CacheKind, ttl: Duration) -> Self {
        Self { backend, kind, ttl }
    }

    pub fn kind(&self) -> CacheKind {
        self.kind
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a fresh value.
    ///
    /// Backend failures are logged and reported as a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_at(key, Utc::now()).await
    }

    /// Look up a value as of `now`.
    ///
    /// Expired rows, rows with an unreadable timestamp, and rows whose payload
    /// no longer deserializes are deleted and reported as a miss.
    pub async fn get_at<T: DeserializeOwned>(&self, key: &str, now: DateTime<Utc>) -> Option<T> {
        let row = match self.backend.read(self.kind, key).await {
            Ok(Some(row)) => row,
            Ok(None) => {
                tracing::debug!(kind = self.kind.as_str(), key, "cache miss");
                return None;
            }
            Err(e) => {
                tracing::warn!(kind = self.kind.as_str(), key, error = %e, "cache read failed; treating as miss");
                return None;
            }
        };

        let fresh = DateTime::parse_from_rfc3339(&row.created_at)
            .map(|created| !is_expired(created.with_timezone(&Utc), now, self.ttl))
            .unwrap_or(false);
        if !fresh {
            tracing::debug!(kind = self.kind.as_str(), key, created_at = %row.created_at, "cache entry expired");
            self.evict(key).await;
            return None;
        }

        match serde_json::from_str(&row.payload_json) {
            Ok(value) => {
                tracing::debug!(kind = self.kind.as_str(), key, "cache hit");
                Some(value)
            }
            Err(e) => {
                tracing::debug!(kind = self.kind.as_str(), key, error = %e, "cached payload unreadable");
                self.evict(key).await;
                None
            }
        }
    }

    /// Upsert a value. Failures are logged and swallowed.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        self.set_at(key, value, Utc::now()).await;
    }

    pub async fn set_at<T: Serialize + ?Sized>(&self, key: &str, value: &T, created_at: DateTime<Utc>) {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(kind = self.kind.as_str(), key, error = %e, "cache payload encoding failed");
                return;
            }
        };
        self.write_payload(key, &payload, created_at).await;
    }

    /// Spawn the write as a task. Awaiting the handle is optional.
    pub fn set_in_background<T: Serialize + ?Sized>(&self, key: String, value: &T) -> JoinHandle<()> {
        let payload = serde_json::to_string(value);
        let store = self.clone();
        tokio::spawn(async move {
            match payload {
                Ok(payload) => store.write_payload(&key, &payload, Utc::now()).await,
                Err(e) => {
                    tracing::warn!(kind = store.kind.as_str(), key = %key, error = %e, "cache payload encoding failed");
                }
            }
        })
    }

    async fn write_payload(&self, key: &str, payload: &str, created_at: DateTime<Utc>) {
        let created_at = created_at.to_rfc3339_opts(SecondsFormat::Millis, true);
        match self.backend.upsert(self.kind, key, payload, &created_at).await {
            Ok(()) => tracing::debug!(kind = self.kind.as_str(), key, "cache write"),
            Err(e) => tracing::warn!(kind = self.kind.as_str(), key, error = %e, "cache write failed"),
        }
    }

    async fn evict(&self, key: &str) {
        if let Err(e) = self.backend.delete(self.kind, key).await {
            tracing::warn!(kind = self.kind.as_str(), key, error = %e, "failed to evict stale cache entry");
        }
    }

    /// Delete one entry. Returns whether a row was removed.
    pub async fn delete(&self, key: &str) -> Result<bool, Error> {
        Ok(self.backend.delete(self.kind, key).await? > 0)
    }

    /// Delete every entry whose key starts with `prefix`.
    pub async fn delete_by_pattern(&self, prefix: &str) -> Result<u64, Error> {
        if prefix.is_empty() {
            return Err(Error::InvalidInput("prefix cannot be empty".into()));
        }
        self.backend.delete_by_prefix(self.kind, prefix).await
    }

    /// Delete the listed keys, returning how many rows were removed.
    pub async fn bulk_delete(&self, keys: &[String]) -> Result<u64, Error> {
        if keys.is_empty() {
            return Ok(0);
        }
        self.backend.delete_many(self.kind, keys).await
    }
}
