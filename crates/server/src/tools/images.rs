//! playground_images tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use swingset_core::{ImageCacheService, ImageRequest, WriteTracker};
use tokio_util::sync::CancellationToken;

use super::json_result;

/// Implementation of the playground_images tool.
///
/// Returns `{images, source}`; `images` is null when search was unavailable
/// or the call was cancelled.
pub async fn images_impl(
    service: &ImageCacheService, writes: &WriteTracker, request: ImageRequest, cancel: &CancellationToken,
) -> Result<CallToolResult, McpError> {
    let (lookup, pending) = service.get_images(&request, cancel).await?;
    tracing::debug!(name = %request.name, source = ?lookup.source, pending_writes = pending.len(), "image lookup complete");
    writes.track(pending);
    json_result(&lookup)
}
