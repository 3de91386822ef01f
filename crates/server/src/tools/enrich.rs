//! playground_enrich and playground_enrich_batch tool implementations.
//!
//! Cache writes for accepted results continue in the background after the
//! tool responds; they are handed to the shared tracker so shutdown can
//! wait for them.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swingset_core::model::{EnrichmentRequest, EnrichmentResult};
use swingset_core::{BatchEnrichment, EnrichmentOrchestrator, WriteTracker};
use tokio_util::sync::CancellationToken;

use super::json_result;

/// Input parameters for playground_enrich_batch tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct EnrichBatchParams {
    /// Entities to enrich (at most 5).
    pub entities: Vec<EnrichmentRequest>,
}

/// Output from the playground_enrich_batch tool, in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichBatchOutput {
    pub results: Vec<EnrichmentResult>,
}

/// Implementation of the playground_enrich tool.
pub async fn enrich_impl(
    orchestrator: &EnrichmentOrchestrator, writes: &WriteTracker, request: EnrichmentRequest, cancel: &CancellationToken,
) -> Result<CallToolResult, McpError> {
    let (result, pending) = orchestrator.enrich_one(request, cancel).await?;
    tracing::debug!(entity_id = %result.entity_id, status = ?result.status, pending_writes = pending.len(), "enrich complete");
    writes.track(pending);
    json_result(&result)
}

/// Implementation of the playground_enrich_batch tool.
pub async fn enrich_batch_impl(
    orchestrator: &EnrichmentOrchestrator, writes: &WriteTracker, params: EnrichBatchParams, cancel: &CancellationToken,
) -> Result<CallToolResult, McpError> {
    let size = params.entities.len();
    let BatchEnrichment { results, writes: pending } = orchestrator.enrich_batch(params.entities, cancel).await?;
    tracing::debug!(size, pending_writes = pending.len(), "batch enrich complete");
    writes.track(pending);
    json_result(&EnrichBatchOutput { results })
}
