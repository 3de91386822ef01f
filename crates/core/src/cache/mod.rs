//! SQLite-backed enrichment cache.
//!
//! This module provides a persistent, versioned key-value cache using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - Version-namespaced keys (bumping the token orphans old entries)
//! - TTL expiry checked at read time, with lazy deletion
//! - Fail-open reads and best-effort writes
//! - Administrative invalidation by key, prefix, or key list

pub mod connection;
pub mod entries;
pub mod key;
pub mod migrations;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::CacheRow;
pub use key::{CacheKeyBuilder, EntityIdentity};
pub use store::{CacheBackend, CacheKind, CacheStore};
