//! Brave Image Search API client.
//!
//! ### Specification
//!
//! - **Endpoint**: `https://api.search.brave.com/res/v1/images/search`
//! - **Authentication**: Uses `X-Subscription-Token` header.
//! - **Rate Limiting**: Default 1s interval between requests for the free tier.
//! - **Normalization**: Converts Brave's response into [`ImageResult`] values.

pub mod request;
pub mod response;

pub use request::{ImageSearchRequest, SafeSearch};
pub use response::BraveImageResponse;

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header;
use swingset_core::model::ImageResult;
use swingset_core::{AppConfig, ImageSearchProvider, ProviderError};

use crate::error::check_status;
use crate::{ClientError, Throttle};

/// Default base URL for Brave Search API.
const DEFAULT_BASE_URL: &str = "https://api.search.brave.com/res/v1";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "swingset/0.1";

/// Minimum interval between requests (1 second for free tier).
const MIN_REQUEST_INTERVAL: Duration = Duration::from_secs(1);

/// Environment variable holding the subscription token.
const API_KEY_VAR: &str = "SWINGSET_BRAVE_API_KEY";

/// Brave API client configuration.
#[derive(Debug, Clone)]
pub struct BraveConfig {
    pub api_key: String,
    /// Base URL (default: https://api.search.brave.com/res/v1).
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for BraveConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl BraveConfig {
    /// Build from the application config. Fails when no key is configured.
    pub fn from_config(config: &AppConfig) -> Result<Self, ClientError> {
        let api_key = config
            .require_brave_api_key()
            .map_err(|_| ClientError::MissingApiKey(API_KEY_VAR))?
            .to_string();

        Ok(Self { api_key, timeout: config.timeout(), user_agent: config.user_agent.clone(), ..Default::default() })
    }
}

/// Brave Image Search API client.
#[derive(Debug, Clone)]
pub struct BraveClient {
    http: reqwest::Client,
    config: BraveConfig,
    throttle: Arc<Throttle>,
}

impl BraveClient {
    /// Create a new Brave client with the given configuration.
    pub fn new(config: BraveConfig) -> Result<Self, ClientError> {
        if config.api_key.is_empty() {
            return Err(ClientError::MissingApiKey(API_KEY_VAR));
        }

        let http = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self { http, config, throttle: Arc::new(Throttle::new(MIN_REQUEST_INTERVAL)) })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ClientError> {
        Self::new(BraveConfig::from_config(config)?)
    }

    /// Execute an image search query.
    pub async fn search(&self, req: ImageSearchRequest) -> Result<Vec<ImageResult>, ClientError> {
        req.validate()?;

        self.throttle.acquire().await;

        let start = Instant::now();
        let url = format!("{}/images/search", self.config.base_url);

        tracing::debug!(query = %req.q, "searching Brave images");

        let http_response = self
            .http
            .get(&url)
            .header("X-Subscription-Token", &self.config.api_key)
            .header(header::ACCEPT, "application/json")
            .header(header::USER_AGENT, &self.config.user_agent)
            .query(&req)
            .send()
            .await?;

        let status = http_response.status();
        tracing::debug!(%status, "Brave API response");
        check_status(status)?;

        let bytes = http_response.bytes().await?;
        let api_response: BraveImageResponse =
            serde_json::from_slice(&bytes).map_err(|e| ClientError::Parse(e.to_string()))?;

        let images = api_response.into_images();
        tracing::debug!(elapsed = ?start.elapsed(), count = images.len(), "image search completed");

        Ok(images)
    }
}

#[async_trait::async_trait]
impl ImageSearchProvider for BraveClient {
    async fn search_images(&self, query: &str, count: usize) -> Result<Vec<ImageResult>, ProviderError> {
        Ok(self.search(ImageSearchRequest::new(query, count)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_new_missing_key() {
        let result = BraveClient::new(BraveConfig::default());
        assert!(matches!(result, Err(ClientError::MissingApiKey(API_KEY_VAR))));
    }

    #[test]
    fn test_config_from_app_config() {
        let app = AppConfig { brave_api_key: Some("token".into()), ..Default::default() };
        let config = BraveConfig::from_config(&app).unwrap();
        assert_eq!(config.api_key, "token");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, app.timeout());
        assert_eq!(config.user_agent, app.user_agent);
    }

    #[test]
    fn test_config_from_app_config_missing_key() {
        let app = AppConfig::default();
        assert!(matches!(BraveConfig::from_config(&app), Err(ClientError::MissingApiKey(_))));
    }

    #[tokio::test]
    async fn test_invalid_request_fails_before_network() {
        let client = BraveClient::new(BraveConfig { api_key: "k".into(), ..Default::default() }).unwrap();
        let req = ImageSearchRequest { q: String::new(), ..Default::default() };
        assert!(matches!(client.search(req).await, Err(ClientError::InvalidQuery(_))));
    }

    #[tokio::test]
    #[ignore = "requires SWINGSET_BRAVE_API_KEY and network access"]
    async fn test_live_image_search() {
        let api_key = std::env::var(API_KEY_VAR).unwrap();
        let client = BraveClient::new(BraveConfig { api_key, ..Default::default() }).unwrap();
        let images = client.search_images("dolores park playground san francisco", 5).await.unwrap();
        assert!(images.len() <= 5);
    }
}
