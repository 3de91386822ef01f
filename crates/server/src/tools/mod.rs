//! MCP tool implementations.
//!
//! This module contains all tools exposed by the swingset server.

pub mod cache;
pub mod enrich;
pub mod images;

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;
use swingset_core::{CacheKind, CacheStore, EnrichmentOrchestrator, Error, ImageCacheService, WriteTracker};

pub use cache::CacheInvalidateParams;
pub use enrich::EnrichBatchParams;

/// Services the tools run against.
#[derive(Debug, Clone)]
pub struct Services {
    pub orchestrator: Arc<EnrichmentOrchestrator>,
    pub images: Arc<ImageCacheService>,
    pub insights_cache: CacheStore,
    pub images_cache: CacheStore,
    /// Background cache writes, drained before the process exits.
    pub writes: WriteTracker,
}

impl Services {
    pub fn cache_for(&self, kind: CacheKind) -> &CacheStore {
        match kind {
            CacheKind::Insights => &self.insights_cache,
            CacheKind::Images => &self.images_cache,
        }
    }
}

/// Render a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(|e| Error::Payload(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
