//! Collaborator traits for the paid external services.
//!
//! Concrete HTTP implementations live in `swingset-client`. Cancellation is
//! expressed by dropping the returned future, which aborts the outbound call.

use crate::model::{Coordinates, ImageResult, Place, RawInsights};

/// Failures reported by external providers.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    /// Provider credentials are not configured.
    #[error("missing API key: {0}")]
    MissingApiKey(String),

    /// Authentication failed (invalid API key).
    #[error("authentication failed")]
    Auth,

    /// Rate limited by the provider.
    #[error("rate limited: too many requests")]
    RateLimited,

    /// Non-success HTTP status.
    #[error("HTTP error: {status}")]
    Http { status: u16 },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(String),

    /// Response could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// Request rejected before it was sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// What the insight provider is asked about.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsightQuery {
    pub entity_id: String,
    pub name: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub place: Option<Place>,
}

/// Coordinates → administrative location.
#[async_trait::async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// Resolve every point, returning `None` for points that did not resolve.
    ///
    /// The output has the same length and order as `points`.
    async fn reverse_geocode(&self, points: &[Coordinates]) -> Result<Vec<Option<Place>>, ProviderError>;
}

/// Location/name prompt → strict-JSON insights.
#[async_trait::async_trait]
pub trait InsightProvider: Send + Sync {
    async fn fetch_insights(&self, query: &InsightQuery) -> Result<RawInsights, ProviderError>;
}

/// Text query → ranked image results.
#[async_trait::async_trait]
pub trait ImageSearchProvider: Send + Sync {
    async fn search_images(&self, query: &str, count: usize) -> Result<Vec<ImageResult>, ProviderError>;
}
