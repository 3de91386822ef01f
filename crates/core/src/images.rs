//! Cache-first photo lookup.
//!
//! Cached lists are filtered to `http(s)` URLs on read; a partially invalid
//! list is rewritten with the valid subset instead of triggering a new
//! search. Misses run one search per query concurrently and merge the
//! results by canonical URL in query order.

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::future::join_all;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::Error;
use crate::cache::{CacheKeyBuilder, CacheStore, EntityIdentity};
use crate::enrich::PendingWrites;
use crate::model::ImageResult;
use crate::providers::ImageSearchProvider;

/// Default cap on returned images.
pub const DEFAULT_MAX_IMAGES: usize = 10;

/// Photos wanted for one entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageRequest {
    /// Display name of the playground.
    pub name: String,
    #[serde(default)]
    pub stable_external_id: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    /// Search queries to run; a generic query is derived when empty.
    #[serde(default)]
    pub queries: Vec<String>,
}

impl ImageRequest {
    fn identity(&self) -> EntityIdentity {
        EntityIdentity {
            stable_id: self.stable_external_id.clone(),
            name: Some(self.name.clone()),
            city: self.city.clone(),
            region: self.region.clone(),
            country: self.country.clone(),
        }
    }

    /// Queries to run on a miss, in priority order.
    pub fn search_queries(&self) -> Vec<String> {
        let explicit: Vec<String> = self
            .queries
            .iter()
            .map(|q| q.trim())
            .filter(|q| !q.is_empty())
            .map(str::to_string)
            .collect();
        if !explicit.is_empty() {
            return explicit;
        }
        let name = self.name.trim();
        match self.city.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            Some(city) => vec![format!("{name} playground {city}")],
            None => vec![format!("{name} playground")],
        }
    }
}

/// Where a lookup's images came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    Cache,
    Search,
    /// Search failed; no images.
    Unavailable,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ImageLookup {
    pub images: Option<Vec<ImageResult>>,
    pub source: ImageSource,
}

pub struct ImageCacheService {
    cache: CacheStore,
    keys: CacheKeyBuilder,
    search: Arc<dyn ImageSearchProvider>,
    max_images: usize,
}

impl std::fmt::Debug for ImageCacheService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageCacheService")
            .field("cache", &self.cache)
            .field("keys", &self.keys)
            .field("max_images", &self.max_images)
            .finish_non_exhaustive()
    }
}

impl ImageCacheService {
    pub fn new(cache: CacheStore, keys: CacheKeyBuilder, search: Arc<dyn ImageSearchProvider>, max_images: usize) -> Self {
        Self { cache, keys, search, max_images: max_images.max(1) }
    }

    /// Look up photos for an entity, searching only on a cache miss.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` when the request has neither a stable id
    /// nor a name. A name without any location part is searched but never
    /// cached.
    pub async fn get_images(
        &self, request: &ImageRequest, cancel: &CancellationToken,
    ) -> Result<(ImageLookup, PendingWrites), Error> {
        let has_stable_id = request.stable_external_id.as_deref().is_some_and(|id| !id.trim().is_empty());
        if !has_stable_id && request.name.trim().is_empty() {
            return Err(Error::InvalidInput("image request requires a name or stableExternalId".into()));
        }
        let key = self.keys.key_for(&request.identity());
        let mut writes = PendingWrites::default();

        if let Some(key) = &key
            && let Some(cached) = self.cache.get::<Vec<ImageResult>>(key).await
        {
            let total = cached.len();
            let valid: Vec<ImageResult> = cached.into_iter().filter(|image| is_web_url(&image.url)).collect();
            if valid.len() == total && total > 0 {
                return Ok((ImageLookup { images: Some(valid), source: ImageSource::Cache }, writes));
            }
            if !valid.is_empty() {
                tracing::debug!(key = %key, dropped = total - valid.len(), "rewriting cached images without invalid URLs");
                writes.push(self.cache.set_in_background(key.clone(), &valid));
                return Ok((ImageLookup { images: Some(valid), source: ImageSource::Cache }, writes));
            }
            tracing::debug!(key = %key, "cached images all invalid; searching again");
        }

        let queries = request.search_queries();
        let searches = join_all(queries.iter().map(|query| self.search.search_images(query, self.max_images)));
        let outcomes = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Ok((ImageLookup { images: None, source: ImageSource::Cancelled }, writes));
            }
            outcomes = searches => outcomes,
        };

        let mut batches = Vec::new();
        for (query, outcome) in queries.iter().zip(outcomes) {
            match outcome {
                Ok(images) => batches.push(images),
                Err(e) => tracing::warn!(query = %query, error = %e, "image search failed"),
            }
        }
        if batches.is_empty() {
            return Ok((ImageLookup { images: None, source: ImageSource::Unavailable }, writes));
        }

        let images = merge_results(batches, self.max_images);
        if !images.is_empty()
            && let Some(key) = key
        {
            writes.push(self.cache.set_in_background(key, &images));
        }
        Ok((ImageLookup { images: Some(images), source: ImageSource::Search }, writes))
    }
}

fn is_web_url(raw: &str) -> bool {
    Url::parse(raw.trim()).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

/// URL used to detect the same image across queries.
fn canonical_url(raw: &str) -> Option<String> {
    let mut url = Url::parse(raw.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(url.to_string())
}

/// Concatenate result lists in order, keeping the first of each canonical URL.
fn merge_results(batches: Vec<Vec<ImageResult>>, max: usize) -> Vec<ImageResult> {
    let mut seen = HashSet::new();
    batches
        .into_iter()
        .flatten()
        .filter(|image| canonical_url(&image.url).is_some_and(|canonical| seen.insert(canonical)))
        .take(max)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheDb, CacheKind};
    use crate::providers::ProviderError;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Clone, Copy, PartialEq)]
    enum Mode {
        Results,
        Empty,
        Fail,
    }

    struct FakeSearch {
        queries: Mutex<Vec<String>>,
        mode: Mode,
    }

    impl FakeSearch {
        fn new(mode: Mode) -> Arc<Self> {
            Arc::new(Self { queries: Mutex::new(Vec::new()), mode })
        }

        fn seen(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl ImageSearchProvider for FakeSearch {
        async fn search_images(&self, query: &str, count: usize) -> Result<Vec<ImageResult>, ProviderError> {
            self.queries.lock().unwrap().push(query.to_string());
            match self.mode {
                Mode::Fail => Err(ProviderError::RateLimited),
                Mode::Empty => Ok(Vec::new()),
                Mode::Results => {
                    let slug = query.replace(' ', "-");
                    Ok((0..count.min(4))
                        .map(|i| {
                            let name = if i == 0 { "shared".to_string() } else { format!("{slug}-{i}") };
                            image(&format!("https://img.example.com/{name}.jpg"))
                        })
                        .collect())
                }
            }
        }
    }

    fn image(url: &str) -> ImageResult {
        ImageResult { url: url.into(), thumbnail_url: None, title: None, source_page: None, width: None, height: None }
    }

    fn request() -> ImageRequest {
        ImageRequest {
            name: "Dolores Park Playground".into(),
            stable_external_id: Some("osm:way/42".into()),
            city: Some("San Francisco".into()),
            ..Default::default()
        }
    }

    async fn service(search: Arc<FakeSearch>, max: usize) -> (CacheStore, ImageCacheService) {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = CacheStore::new(Arc::new(db), CacheKind::Images, Duration::from_secs(3600));
        let service = ImageCacheService::new(store.clone(), CacheKeyBuilder::new("v1"), search, max);
        (store, service)
    }

    #[tokio::test]
    async fn test_self_heals_partially_invalid_cache() {
        let search = FakeSearch::new(Mode::Results);
        let (store, service) = service(search.clone(), 10).await;
        let cached = vec![
            image("https://a.example.com/1.jpg"),
            image("javascript:alert(1)"),
            image("http://b.example.com/2.jpg"),
        ];
        store.set("v1:osm:way/42", &cached).await;

        let (lookup, writes) = service.get_images(&request(), &CancellationToken::new()).await.unwrap();
        writes.wait().await;

        let images = lookup.images.unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(lookup.source, ImageSource::Cache);
        assert!(search.seen().is_empty());

        let rewritten = store.get::<Vec<ImageResult>>("v1:osm:way/42").await.unwrap();
        assert_eq!(rewritten, images);
    }

    #[tokio::test]
    async fn test_all_invalid_cache_is_a_miss() {
        let search = FakeSearch::new(Mode::Results);
        let (store, service) = service(search.clone(), 10).await;
        store.set("v1:osm:way/42", &vec![image("ftp://old.example.com/1.jpg")]).await;

        let (lookup, _) = service.get_images(&request(), &CancellationToken::new()).await.unwrap();
        assert_eq!(lookup.source, ImageSource::Search);
        assert_eq!(search.seen(), ["Dolores Park Playground playground San Francisco"]);
    }

    #[tokio::test]
    async fn test_queries_merged_in_order_and_truncated() {
        let search = FakeSearch::new(Mode::Results);
        let (store, service) = service(search.clone(), 5).await;
        let request = ImageRequest { queries: vec!["first".into(), " ".into(), "second".into()], ..request() };

        let (lookup, writes) = service.get_images(&request, &CancellationToken::new()).await.unwrap();
        writes.wait().await;

        let urls: Vec<_> = lookup.images.unwrap().into_iter().map(|i| i.url).collect();
        assert_eq!(
            urls,
            [
                "https://img.example.com/shared.jpg",
                "https://img.example.com/first-1.jpg",
                "https://img.example.com/first-2.jpg",
                "https://img.example.com/first-3.jpg",
                "https://img.example.com/second-1.jpg",
            ]
        );
        assert_eq!(store.get::<Vec<ImageResult>>("v1:osm:way/42").await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_empty_results_not_persisted() {
        let (store, service) = service(FakeSearch::new(Mode::Empty), 10).await;
        let (lookup, writes) = service.get_images(&request(), &CancellationToken::new()).await.unwrap();
        assert_eq!(lookup.images, Some(Vec::new()));
        assert_eq!(lookup.source, ImageSource::Search);
        assert!(writes.is_empty());
        assert!(store.get::<Vec<ImageResult>>("v1:osm:way/42").await.is_none());

        assert!(merge_results(vec![vec![], vec![image("mailto:a@b.c")]], 10).is_empty());
    }

    #[tokio::test]
    async fn test_search_failure_returns_no_images() {
        let search = FakeSearch::new(Mode::Fail);
        let (store, service) = service(search, 10).await;
        let (lookup, writes) = service.get_images(&request(), &CancellationToken::new()).await.unwrap();
        assert_eq!(lookup.images, None);
        assert_eq!(lookup.source, ImageSource::Unavailable);
        assert!(writes.is_empty());
        assert!(store.get::<Vec<ImageResult>>("v1:osm:way/42").await.is_none());
    }

    #[tokio::test]
    async fn test_name_without_place_is_searched_not_cached() {
        let search = FakeSearch::new(Mode::Results);
        let (store, service) = service(search.clone(), 10).await;
        let request = ImageRequest { name: "Central Park Playground".into(), ..Default::default() };

        let (lookup, writes) = service.get_images(&request, &CancellationToken::new()).await.unwrap();
        assert_eq!(lookup.source, ImageSource::Search);
        assert!(lookup.images.is_some_and(|images| !images.is_empty()));
        assert!(writes.is_empty());
        assert_eq!(search.seen(), ["Central Park Playground playground"]);
        assert!(store.get::<Vec<ImageResult>>("v1:central park playground").await.is_none());

        let (again, _) = service.get_images(&request, &CancellationToken::new()).await.unwrap();
        assert_eq!(again.source, ImageSource::Search);
        assert_eq!(search.seen().len(), 2);
    }

    #[tokio::test]
    async fn test_request_without_identity_rejected() {
        let (_store, service) = service(FakeSearch::new(Mode::Results), 10).await;
        let blank = ImageRequest { name: "  ".into(), stable_external_id: Some(" ".into()), ..Default::default() };
        let err = service.get_images(&blank, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_canonical_url_drops_fragment() {
        assert_eq!(
            canonical_url("HTTPS://Img.Example.com/a.jpg#top").as_deref(),
            Some("https://img.example.com/a.jpg")
        );
        assert_eq!(canonical_url("data:image/png;base64,AAAA"), None);
    }

    #[test]
    fn test_generic_query_without_city() {
        let request = ImageRequest { name: "Tot Lot".into(), ..Default::default() };
        assert_eq!(request.search_queries(), ["Tot Lot playground"]);
    }
}
