//! Brave Image Search API request types and validation.

use serde::{Deserialize, Serialize};

use crate::ClientError;

/// Maximum results Brave returns for one image query.
pub const MAX_IMAGE_COUNT: u8 = 200;

/// Search request parameters for the Brave Image Search API.
///
/// Based on Brave Image Search API documentation:
/// https://api-dashboard.search.brave.com/app/documentation/image-search/get-started
#[derive(Debug, Clone, Serialize, Default)]
pub struct ImageSearchRequest {
    /// Search query (required, max 400 chars / 50 words).
    pub q: String,

    /// Number of results (1-200, default 50).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u8>,

    /// Safe search: off|strict (default strict).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safesearch: Option<SafeSearch>,

    /// Country code (ISO 3166-1 alpha-2, e.g., "US").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    /// Content language (ISO 639-1, e.g., "en").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_lang: Option<String>,

    /// Enable spell-check on query.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spellcheck: Option<bool>,
}

/// Safe search filtering levels supported for images.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SafeSearch {
    Off,
    Strict,
}

impl ImageSearchRequest {
    /// Request `count` images for `query` with strict safe search.
    pub fn new(query: impl Into<String>, count: usize) -> Self {
        let count = count.clamp(1, usize::from(MAX_IMAGE_COUNT)) as u8;
        Self { q: query.into(), count: Some(count), safesearch: Some(SafeSearch::Strict), ..Default::default() }
    }

    /// Validate the search request parameters.
    ///
    /// Returns an error if any parameters are out of range or malformed.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.q.trim().is_empty() {
            return Err(ClientError::InvalidQuery("query cannot be empty".to_string()));
        }

        if self.q.len() > 400 {
            return Err(ClientError::InvalidQuery(format!(
                "query too long: {} chars (max 400)",
                self.q.len()
            )));
        }

        let word_count = self.q.split_whitespace().count();
        if word_count > 50 {
            return Err(ClientError::InvalidQuery(format!(
                "query too long: {} words (max 50)",
                word_count
            )));
        }

        if let Some(count) = self.count
            && !(1..=MAX_IMAGE_COUNT).contains(&count)
        {
            return Err(ClientError::InvalidCount { max: usize::from(MAX_IMAGE_COUNT) });
        }

        Ok(())
    }

    /// Get the effective safesearch setting (default Strict).
    pub fn get_safesearch(&self) -> SafeSearch {
        self.safesearch.unwrap_or(SafeSearch::Strict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_request() {
        let req = ImageSearchRequest::new("dolores park playground san francisco", 10);
        assert!(req.validate().is_ok());
        assert_eq!(req.count, Some(10));
        assert_eq!(req.get_safesearch(), SafeSearch::Strict);
    }

    #[test]
    fn test_empty_query() {
        let req = ImageSearchRequest { q: "  ".to_string(), ..Default::default() };
        assert!(matches!(req.validate(), Err(ClientError::InvalidQuery(_))));
    }

    #[test]
    fn test_query_too_long_chars() {
        let req = ImageSearchRequest { q: "a".repeat(401), ..Default::default() };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_query_too_many_words() {
        let req = ImageSearchRequest { q: "swing ".repeat(51), ..Default::default() };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_invalid_count() {
        let req = ImageSearchRequest { q: "test".to_string(), count: Some(0), ..Default::default() };
        assert!(matches!(req.validate(), Err(ClientError::InvalidCount { max: 200 })));
    }

    #[test]
    fn test_count_clamped() {
        assert_eq!(ImageSearchRequest::new("test", 0).count, Some(1));
        assert_eq!(ImageSearchRequest::new("test", 1000).count, Some(200));
    }

    #[test]
    fn test_query_string_skips_unset_fields() {
        let req = ImageSearchRequest::new("tot lot", 5);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["safesearch"], "strict");
        assert!(json.get("country").is_none());
    }
}
