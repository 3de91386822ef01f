//! Batch enrichment workflow.
//!
//! For each batch: serve stable-id hits from cache, reverse-geocode the
//! misses in one call, re-check composite keys, then call the insight
//! provider once per remaining entity through the deduplicator, the rate
//! limiter and a per-call timeout. Results are scored, cache-worthy ones are
//! written in the background, and everything is returned in input order.

mod writes;

pub use writes::{PendingWrites, WriteTracker};

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use tokio_util::sync::CancellationToken;

use crate::cache::{CacheKeyBuilder, CacheStore, EntityIdentity};
use crate::config::AppConfig;
use crate::dedup::RequestDeduplicator;
use crate::limiter::RateLimiter;
use crate::model::{
    EnrichmentRequest, EnrichmentResult, EnrichmentStatus, Insights, MAX_BATCH_SIZE, Place, RawInsights, Tier,
};
use crate::providers::{InsightProvider, InsightQuery, ProviderError, ReverseGeocoder};
use crate::quality::{LocationTarget, calculate_tier, score_result};
use crate::Error;

/// Behavior switches for the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorOptions {
    /// Serve from cache only; misses resolve as `not_cached`.
    pub cache_only: bool,
    /// Upper bound on waiting for a provider slot plus the call itself.
    pub provider_timeout: Duration,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self { cache_only: false, provider_timeout: Duration::from_secs(45) }
    }
}

impl OrchestratorOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self { cache_only: config.cache_only, provider_timeout: config.provider_timeout() }
    }
}

/// Settled outcome of one provider call, shared by every deduplicated caller.
#[derive(Debug, Clone)]
pub enum ProviderOutcome {
    Answered(RawInsights),
    Failed(ProviderError),
    TimedOut,
    ShutDown,
}

/// Results for a batch, in input order, plus the cache writes it started.
#[derive(Debug)]
pub struct BatchEnrichment {
    pub results: Vec<EnrichmentResult>,
    pub writes: PendingWrites,
}

/// An entity that missed the stable-id cache pass.
struct Pending<'a> {
    index: usize,
    request: &'a EnrichmentRequest,
    key: Option<String>,
    place: Option<Place>,
}

pub struct EnrichmentOrchestrator {
    cache: CacheStore,
    keys: CacheKeyBuilder,
    geocoder: Arc<dyn ReverseGeocoder>,
    provider: Arc<dyn InsightProvider>,
    limiter: RateLimiter,
    dedup: Arc<RequestDeduplicator<ProviderOutcome>>,
    options: OrchestratorOptions,
    shutdown: CancellationToken,
}

impl std::fmt::Debug for EnrichmentOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnrichmentOrchestrator")
            .field("cache", &self.cache)
            .field("keys", &self.keys)
            .field("limiter", &self.limiter)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl EnrichmentOrchestrator {
    pub fn new(
        cache: CacheStore, keys: CacheKeyBuilder, geocoder: Arc<dyn ReverseGeocoder>,
        provider: Arc<dyn InsightProvider>, limiter: RateLimiter, options: OrchestratorOptions,
    ) -> Self {
        Self {
            cache,
            keys,
            geocoder,
            provider,
            limiter,
            dedup: Arc::new(RequestDeduplicator::new()),
            options,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn deduplicator(&self) -> &RequestDeduplicator<ProviderOutcome> {
        &self.dedup
    }

    /// Abort every provider call in flight. Affected entities resolve as failed.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Enrich a single entity as a batch of one.
    pub async fn enrich_one(
        &self, request: EnrichmentRequest, cancel: &CancellationToken,
    ) -> Result<(EnrichmentResult, PendingWrites), Error> {
        let entity_id = request.entity_id.clone();
        let BatchEnrichment { results, writes } = self.enrich_batch(vec![request], cancel).await?;
        let result = results
            .into_iter()
            .next()
            .ok_or_else(|| Error::InvalidInput(format!("{entity_id}: no result produced")))?;
        Ok((result, writes))
    }

    /// Enrich up to [`MAX_BATCH_SIZE`] entities.
    ///
    /// # Errors
    ///
    /// Returns `Error::BatchTooLarge` for oversized batches and
    /// `Error::InvalidInput` when any request cannot be identified. Provider
    /// failures never fail the batch.
    pub async fn enrich_batch(
        &self, requests: Vec<EnrichmentRequest>, cancel: &CancellationToken,
    ) -> Result<BatchEnrichment, Error> {
        if requests.len() > MAX_BATCH_SIZE {
            return Err(Error::BatchTooLarge { size: requests.len(), max: MAX_BATCH_SIZE });
        }
        for request in &requests {
            request.validate()?;
        }

        let mut slots: Vec<Option<EnrichmentResult>> = vec![None; requests.len()];
        let mut writes = PendingWrites::default();

        let mut pending = Vec::new();
        for (index, request) in requests.iter().enumerate() {
            let key = request.stable_id().map(|id| self.keys.with_stable_id(id));
            if let Some(key) = &key
                && let Some(insights) = self.cache.get::<Insights>(key).await
            {
                slots[index] = Some(cached(request, insights));
                continue;
            }
            pending.push(Pending { index, request, key, place: None });
        }

        tracing::debug!(batch = requests.len(), misses = pending.len(), "stable-id cache pass complete");

        if self.options.cache_only {
            for entry in pending {
                slots[entry.index] = Some(unresolved(entry.request, EnrichmentStatus::NotCached));
            }
            return Ok(BatchEnrichment { results: slots.into_iter().flatten().collect(), writes });
        }

        if !pending.is_empty() && !self.geocode(&mut pending, cancel).await {
            for entry in pending {
                slots[entry.index] = Some(unresolved(entry.request, EnrichmentStatus::Cancelled));
            }
            return Ok(BatchEnrichment { results: slots.into_iter().flatten().collect(), writes });
        }

        let mut to_fetch = Vec::new();
        for mut entry in pending {
            if entry.key.is_none() {
                entry.key = self.composite_key(&entry);
                if let Some(key) = &entry.key
                    && let Some(insights) = self.cache.get::<Insights>(key).await
                {
                    slots[entry.index] = Some(cached(entry.request, insights));
                    continue;
                }
            }
            to_fetch.push(entry);
        }

        let fetched = join_all(to_fetch.iter().map(|entry| self.fetch(entry, cancel))).await;
        for (entry, outcome) in to_fetch.iter().zip(fetched) {
            slots[entry.index] = Some(self.settle(entry, outcome, &mut writes));
        }

        Ok(BatchEnrichment { results: slots.into_iter().flatten().collect(), writes })
    }

    /// Attach geocoded places to pending entries with coordinates.
    ///
    /// Returns `false` when the caller cancelled. Geocoder failures are
    /// logged and leave places unset.
    async fn geocode(&self, pending: &mut [Pending<'_>], cancel: &CancellationToken) -> bool {
        let located: Vec<usize> = pending
            .iter()
            .enumerate()
            .filter_map(|(i, entry)| entry.request.coordinates.map(|_| i))
            .collect();
        let points: Vec<_> = located
            .iter()
            .filter_map(|&i| pending[i].request.coordinates)
            .collect();
        if points.is_empty() {
            return true;
        }

        let started = Instant::now();
        let places = tokio::select! {
            biased;
            _ = cancel.cancelled() => return false,
            places = self.geocoder.reverse_geocode(&points) => places,
        };

        match places {
            Ok(places) => {
                tracing::debug!(
                    points = points.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "reverse geocoding complete"
                );
                for (i, place) in located.into_iter().zip(places) {
                    pending[i].place = place;
                }
            }
            Err(e) => {
                tracing::warn!(points = points.len(), error = %e, "reverse geocoding failed; continuing without places");
            }
        }
        true
    }

    /// Name plus geocoded place. Without a place the entity is uncacheable.
    fn composite_key(&self, entry: &Pending<'_>) -> Option<String> {
        let place = entry.place.as_ref()?;
        let identity = EntityIdentity {
            stable_id: None,
            name: entry.request.name_hint().map(str::to_string),
            city: place.city.clone(),
            region: place.region.clone(),
            country: place.country.clone(),
        };
        self.keys.key_for(&identity)
    }

    /// One deduplicated, rate-limited, time-bounded provider call.
    ///
    /// Returns `None` when the caller cancelled first.
    async fn fetch(&self, entry: &Pending<'_>, cancel: &CancellationToken) -> Option<ProviderOutcome> {
        let request = entry.request;
        let dedup_key = entry.key.clone().unwrap_or_else(|| format!("entity:{}", request.entity_id));
        let query = InsightQuery {
            entity_id: request.entity_id.clone(),
            name: request.name_hint().map(str::to_string),
            coordinates: request.coordinates,
            place: entry.place.clone(),
        };

        let provider = Arc::clone(&self.provider);
        let limiter = self.limiter.clone();
        let shutdown = self.shutdown.clone();
        let timeout = self.options.provider_timeout;
        let call = move || async move {
            let started = Instant::now();
            let outcome = match tokio::time::timeout(timeout, limiter.run(&shutdown, provider.fetch_insights(&query)))
                .await
            {
                Ok(Ok(Ok(raw))) => ProviderOutcome::Answered(raw),
                Ok(Ok(Err(e))) => ProviderOutcome::Failed(e),
                Ok(Err(_)) => ProviderOutcome::ShutDown,
                Err(_) => ProviderOutcome::TimedOut,
            };
            tracing::debug!(
                entity_id = %query.entity_id,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "insight provider call settled"
            );
            outcome
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            outcome = self.dedup.run(&dedup_key, call) => Some(outcome),
        }
    }

    fn settle(
        &self, entry: &Pending<'_>, outcome: Option<ProviderOutcome>, writes: &mut PendingWrites,
    ) -> EnrichmentResult {
        let request = entry.request;
        let raw = match outcome {
            None => return unresolved(request, EnrichmentStatus::Cancelled),
            Some(ProviderOutcome::Answered(raw)) => raw,
            Some(ProviderOutcome::Failed(e)) => {
                tracing::warn!(entity_id = %request.entity_id, error = %e, "insight provider failed");
                return failed(request);
            }
            Some(ProviderOutcome::TimedOut) => {
                tracing::warn!(entity_id = %request.entity_id, timeout = ?self.options.provider_timeout, "insight provider timed out");
                return failed(request);
            }
            Some(ProviderOutcome::ShutDown) => {
                tracing::warn!(entity_id = %request.entity_id, "insight provider call aborted by shutdown");
                return failed(request);
            }
        };

        let place = entry.place.as_ref();
        let target = LocationTarget {
            city: place.and_then(|p| p.city.as_deref()),
            region: place.and_then(|p| p.region.as_deref()),
        };
        let score = score_result(Some(&raw), target);

        tracing::debug!(
            entity_id = %request.entity_id,
            overall = score.overall,
            accept = score.should_accept,
            cache = score.should_cache,
            flags = ?score.flags,
            "scored provider result"
        );

        if !score.should_accept {
            return EnrichmentResult {
                entity_id: request.entity_id.clone(),
                insights: None,
                tier: Tier::Neighborhood,
                tier_reasoning: format!("Rejected low-quality result (score {})", score.overall),
                status: EnrichmentStatus::Rejected,
                attempted: true,
                score: Some(score),
            };
        }

        let insights = raw.insights;
        if score.should_cache
            && let Some(key) = &entry.key
        {
            writes.push(self.cache.set_in_background(key.clone(), &insights));
        }

        let (tier, tier_reasoning) = calculate_tier(Some(&insights));
        EnrichmentResult {
            entity_id: request.entity_id.clone(),
            insights: Some(insights),
            tier,
            tier_reasoning,
            status: EnrichmentStatus::Enriched,
            attempted: true,
            score: Some(score),
        }
    }
}

fn cached(request: &EnrichmentRequest, insights: Insights) -> EnrichmentResult {
    let (tier, tier_reasoning) = calculate_tier(Some(&insights));
    EnrichmentResult {
        entity_id: request.entity_id.clone(),
        insights: Some(insights),
        tier,
        tier_reasoning,
        status: EnrichmentStatus::Cached,
        attempted: true,
        score: None,
    }
}

fn failed(request: &EnrichmentRequest) -> EnrichmentResult {
    EnrichmentResult {
        entity_id: request.entity_id.clone(),
        insights: None,
        tier: Tier::Neighborhood,
        tier_reasoning: "Enrichment failed".to_string(),
        status: EnrichmentStatus::Failed,
        attempted: true,
        score: None,
    }
}

/// Result for an entity that was never sent to the provider.
fn unresolved(request: &EnrichmentRequest, status: EnrichmentStatus) -> EnrichmentResult {
    let (tier, tier_reasoning) = calculate_tier(None);
    EnrichmentResult {
        entity_id: request.entity_id.clone(),
        insights: None,
        tier,
        tier_reasoning,
        status,
        attempted: false,
        score: None,
    }
}
