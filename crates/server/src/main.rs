//! swingset MCP server entry point.
//!
//! Boots the enrichment services and serves them on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use swingset_client::{BraveClient, ChatInsightClient, NominatimGeocoder, Unconfigured};
use swingset_core::{
    AppConfig, CacheDb, CacheKeyBuilder, CacheKind, CacheStore, EnrichmentOrchestrator, ImageCacheService,
    ImageSearchProvider, InsightProvider, OrchestratorOptions, RateLimiter, WriteTracker,
};
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

use tools::Services;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;

    let services = build_services(&config).await?;
    let orchestrator = services.orchestrator.clone();
    let writes = services.writes.clone();

    tracing::info!(
        db_path = %config.db_path.display(),
        cache_version = %config.cache_version,
        cache_only = config.cache_only,
        "Starting swingset server on stdio transport"
    );

    let handler = handler::PlaygroundServer::new(services);
    let server = serve_server(handler, stdio()).await?;

    let quit = tokio::select! {
        quit = server.waiting() => quit.map(|_| ()),
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupt received, aborting in-flight provider calls");
            Ok(())
        }
    };
    orchestrator.shutdown();
    tracing::info!(pending_writes = writes.outstanding(), "flushing cache writes before exit");
    writes.drain().await;

    quit?;
    Ok(())
}

async fn build_services(config: &AppConfig) -> Result<Services> {
    let db = Arc::new(
        CacheDb::open(&config.db_path)
            .await
            .with_context(|| format!("failed to open cache at {}", config.db_path.display()))?,
    );
    let insights_cache = CacheStore::new(db.clone(), CacheKind::Insights, config.insights_ttl());
    let images_cache = CacheStore::new(db, CacheKind::Images, config.images_ttl());
    let keys = CacheKeyBuilder::new(config.cache_version.clone());

    let geocoder = Arc::new(NominatimGeocoder::from_config(config)?);

    let provider: Arc<dyn InsightProvider> = match ChatInsightClient::from_config(config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::warn!(error = %e, "insight provider not configured; uncached entities will fail");
            Arc::new(Unconfigured::new("SWINGSET_AI_API_KEY"))
        }
    };

    let search: Arc<dyn ImageSearchProvider> = match BraveClient::from_config(config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::warn!(error = %e, "image search not configured; uncached lookups will be unavailable");
            Arc::new(Unconfigured::new("SWINGSET_BRAVE_API_KEY"))
        }
    };

    let orchestrator = EnrichmentOrchestrator::new(
        insights_cache.clone(),
        keys.clone(),
        geocoder,
        provider,
        RateLimiter::new(config.max_provider_concurrency),
        OrchestratorOptions::from_config(config),
    );
    let images = ImageCacheService::new(images_cache.clone(), keys, search, config.max_images);

    Ok(Services {
        orchestrator: Arc::new(orchestrator),
        images: Arc::new(images),
        insights_cache,
        images_cache,
        writes: WriteTracker::new(),
    })
}
