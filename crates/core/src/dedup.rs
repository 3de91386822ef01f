//! In-process registry collapsing concurrent identical fetches.
//!
//! The first caller for a key creates a shared future; later callers for the
//! same key await that same future. The entry is removed when the fetch
//! settles, or when every waiter has dropped it, so the next call starts a
//! fresh fetch.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::future::{BoxFuture, FutureExt, Shared, WeakShared};

type Registry<T> = Arc<Mutex<HashMap<String, (u64, WeakShared<BoxFuture<'static, T>>)>>>;

pub struct RequestDeduplicator<T: Clone> {
    in_flight: Registry<T>,
    next_id: AtomicU64,
}

impl<T: Clone> Default for RequestDeduplicator<T> {
    fn default() -> Self {
        Self { in_flight: Arc::new(Mutex::new(HashMap::new())), next_id: AtomicU64::new(0) }
    }
}

impl<T: Clone> std::fmt::Debug for RequestDeduplicator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestDeduplicator")
            .field("registered", &lock(&self.in_flight).len())
            .finish()
    }
}

/// Removes a registry entry when the owning fetch completes or is dropped.
struct SettleGuard<T: Clone> {
    registry: Registry<T>,
    key: String,
    id: u64,
}

impl<T: Clone> Drop for SettleGuard<T> {
    fn drop(&mut self) {
        let mut in_flight = lock(&self.registry);
        // A newer fetch may already own the key.
        if in_flight.get(&self.key).is_some_and(|(id, _)| *id == self.id) {
            in_flight.remove(&self.key);
        }
    }
}

fn lock<K, V>(registry: &Mutex<HashMap<K, V>>) -> MutexGuard<'_, HashMap<K, V>> {
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<T> RequestDeduplicator<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Await the in-flight fetch for `key`, starting one with `fetch` if none
    /// is outstanding. `fetch` is only invoked by the caller that starts it.
    pub async fn run<F, Fut>(&self, key: &str, fetch: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        self.join_or_start(key, fetch).await
    }

    fn join_or_start<F, Fut>(&self, key: &str, fetch: F) -> Shared<BoxFuture<'static, T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let mut in_flight = lock(&self.in_flight);

        if let Some(shared) = in_flight.get(key).and_then(|(_, weak)| weak.upgrade()) {
            tracing::debug!(key, "joining in-flight request");
            return shared;
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let guard = SettleGuard { registry: Arc::clone(&self.in_flight), key: key.to_string(), id };
        let call = fetch();
        let shared = async move {
            let _guard = guard;
            call.await
        }
        .boxed()
        .shared();

        if let Some(weak) = shared.downgrade() {
            in_flight.insert(key.to_string(), (id, weak));
        }
        shared
    }

    /// Number of keys with an outstanding fetch.
    pub fn in_flight_count(&self) -> usize {
        // Upgraded handles are dropped after the lock is released: dropping the
        // last one runs the settle guard, which takes the lock again.
        let live: Vec<_> = lock(&self.in_flight)
            .values()
            .filter_map(|(_, weak)| weak.upgrade())
            .collect();
        live.len()
    }

    pub fn is_in_flight(&self, key: &str) -> bool {
        let live = lock(&self.in_flight).get(key).and_then(|(_, weak)| weak.upgrade());
        live.is_some()
    }

    /// Forget every registered fetch. Fetches already running keep running
    /// for their current waiters.
    pub fn clear(&self) {
        lock(&self.in_flight).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::sync::Notify;

    #[tokio::test]
    async fn test_concurrent_callers_share_one_fetch() {
        let dedup = Arc::new(RequestDeduplicator::<usize>::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let release = Arc::new(Notify::new());

        let start = |dedup: Arc<RequestDeduplicator<usize>>| {
            let calls = calls.clone();
            let release = release.clone();
            tokio::spawn(async move {
                dedup
                    .run("v1:osm:1", move || async move {
                        let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                        release.notified().await;
                        n * 100
                    })
                    .await
            })
        };

        let first = start(dedup.clone());
        let second = start(dedup.clone());
        while !dedup.is_in_flight("v1:osm:1") {
            tokio::task::yield_now().await;
        }
        tokio::task::yield_now().await;
        release.notify_one();

        let (a, b) = (first.await.unwrap(), second.await.unwrap());
        assert_eq!(a, b);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(dedup.in_flight_count(), 0);

        let third = dedup
            .run("v1:osm:1", || {
                let calls = calls.clone();
                async move { calls.fetch_add(1, Ordering::SeqCst) + 1 }
            })
            .await;
        assert_eq!(third, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_removed() {
        let dedup = RequestDeduplicator::<Result<u8, String>>::new();
        let out = dedup.run("k", || async { Err("boom".to_string()) }).await;
        assert!(out.is_err());
        assert!(!dedup.is_in_flight("k"));

        let out = dedup.run("k", || async { Ok(7) }).await;
        assert_eq!(out, Ok(7));
    }

    #[tokio::test]
    async fn test_dropped_waiters_release_entry() {
        let dedup = RequestDeduplicator::<u8>::new();
        let pending = dedup.run("k", || async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            1
        });

        let timed_out = tokio::time::timeout(Duration::from_millis(10), pending).await;
        assert!(timed_out.is_err());
        assert_eq!(dedup.in_flight_count(), 0);

        let fresh = dedup.run("k", || async { 2 }).await;
        assert_eq!(fresh, 2);
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_share() {
        let dedup = RequestDeduplicator::<&'static str>::new();
        let (a, b) = tokio::join!(dedup.run("a", || async { "a" }), dedup.run("b", || async { "b" }));
        assert_eq!((a, b), ("a", "b"));
    }

    #[tokio::test]
    async fn test_clear_resets_registry() {
        let dedup = Arc::new(RequestDeduplicator::<u8>::new());
        let release = Arc::new(Notify::new());
        let waiter = {
            let dedup = dedup.clone();
            let release = release.clone();
            tokio::spawn(async move {
                dedup
                    .run("k", move || async move {
                        release.notified().await;
                        1
                    })
                    .await
            })
        };
        while !dedup.is_in_flight("k") {
            tokio::task::yield_now().await;
        }

        dedup.clear();
        assert!(!dedup.is_in_flight("k"));

        release.notify_one();
        assert_eq!(waiter.await.unwrap(), 1);
    }
}
