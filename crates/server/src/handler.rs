//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use swingset_core::ImageRequest;
use swingset_core::model::EnrichmentRequest;

use crate::tools::{
    CacheInvalidateParams, EnrichBatchParams, Services, cache::invalidate_impl, enrich::enrich_batch_impl,
    enrich::enrich_impl, images::images_impl,
};

/// The main MCP server handler for swingset.
#[derive(Clone)]
pub struct PlaygroundServer {
    services: Services,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// Each tool observes the request's cancellation token, so a client
/// cancelling a call resolves pending entities as cancelled.
#[tool_router]
impl PlaygroundServer {
    pub fn new(services: Services) -> Self {
        Self { services, tool_router: Self::tool_router() }
    }

    #[tool(
        description = "Enrich one playground with AI-generated insights (description, features, parking, accessibility). Cache-first; identify it by stableExternalId or by coordinates plus displayNameHint."
    )]
    async fn playground_enrich(
        &self, params: Parameters<EnrichmentRequest>, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        enrich_impl(&self.services.orchestrator, &self.services.writes, params.0, &context.ct).await
    }

    #[tool(
        description = "Enrich up to 5 playgrounds in one call. Cached entries are served without provider calls; results are returned in input order."
    )]
    async fn playground_enrich_batch(
        &self, params: Parameters<EnrichBatchParams>, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        enrich_batch_impl(&self.services.orchestrator, &self.services.writes, params.0, &context.ct).await
    }

    #[tool(description = "Find photos of a playground. Returns {images, source}; images is null when search is unavailable.")]
    async fn playground_images(
        &self, params: Parameters<ImageRequest>, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        images_impl(&self.services.images, &self.services.writes, params.0, &context.ct).await
    }

    #[tool(description = "Invalidate cached insights or images by exact key, key prefix, or key list. Returns the number deleted.")]
    async fn cache_invalidate(&self, params: Parameters<CacheInvalidateParams>) -> Result<CallToolResult, McpError> {
        invalidate_impl(&self.services, params.0).await
    }
}

impl ServerHandler for PlaygroundServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "swingset".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Playground enrichment: AI insights, quality tiers and photos for playgrounds, cached in SQLite.".into(),
            ),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::fixture;

    #[tokio::test]
    async fn test_lists_all_tools() {
        let fx = fixture().await;
        let server = PlaygroundServer::new(fx.services);
        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();
        assert_eq!(names, ["cache_invalidate", "playground_enrich", "playground_enrich_batch", "playground_images"]);
    }

    #[tokio::test]
    async fn test_server_info() {
        let fx = fixture().await;
        let info = PlaygroundServer::new(fx.services).get_info();
        assert_eq!(info.server_info.name, "swingset");
        assert!(info.capabilities.tools.is_some());
    }
}
