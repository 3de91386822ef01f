//! Core types and shared functionality for swingset.
//!
//! This crate provides:
//! - Versioned TTL cache over SQLite
//! - Rate limiting and in-flight request deduplication
//! - Source and description validators, result scorer and tier calculator
//! - The batch enrichment orchestrator and image cache service
//! - Collaborator traits for the external providers
//! - Unified error types and layered configuration

pub mod cache;
pub mod config;
pub mod dedup;
pub mod enrich;
pub mod error;
pub mod images;
pub mod limiter;
pub mod model;
pub mod providers;
pub mod quality;

pub use cache::{CacheDb, CacheKeyBuilder, CacheKind, CacheStore};
pub use config::{AppConfig, ConfigError};
pub use enrich::{BatchEnrichment, EnrichmentOrchestrator, OrchestratorOptions, PendingWrites, WriteTracker};
pub use error::Error;
pub use images::{ImageCacheService, ImageLookup, ImageRequest, ImageSource};
pub use limiter::RateLimiter;
pub use providers::{ImageSearchProvider, InsightProvider, ProviderError, ReverseGeocoder};
