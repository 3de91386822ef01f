//! Stand-in provider for a service whose API key is not configured.
//!
//! The server starts without keys; each call then reports the missing key
//! instead of failing at startup.

use swingset_core::model::{ImageResult, RawInsights};
use swingset_core::providers::InsightQuery;
use swingset_core::{ImageSearchProvider, InsightProvider, ProviderError};

#[derive(Debug, Clone)]
pub struct Unconfigured {
    var: &'static str,
}

impl Unconfigured {
    pub fn new(var: &'static str) -> Self {
        Self { var }
    }

    fn error(&self) -> ProviderError {
        ProviderError::MissingApiKey(self.var.to_string())
    }
}

#[async_trait::async_trait]
impl InsightProvider for Unconfigured {
    async fn fetch_insights(&self, _query: &InsightQuery) -> Result<RawInsights, ProviderError> {
        Err(self.error())
    }
}

#[async_trait::async_trait]
impl ImageSearchProvider for Unconfigured {
    async fn search_images(&self, _query: &str, _count: usize) -> Result<Vec<ImageResult>, ProviderError> {
        Err(self.error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reports_missing_key() {
        let provider = Unconfigured::new("SWINGSET_BRAVE_API_KEY");
        let err = provider.search_images("swings", 3).await.unwrap_err();
        assert!(matches!(err, ProviderError::MissingApiKey(var) if var == "SWINGSET_BRAVE_API_KEY"));

        let err = provider.fetch_insights(&InsightQuery::default()).await.unwrap_err();
        assert!(matches!(err, ProviderError::MissingApiKey(_)));
    }
}
