//! Bounded-concurrency gate in front of the AI provider.
//!
//! A slot is held for the lifetime of the returned permit, so it is released
//! when the call settles, fails, or is dropped by cancellation. Waiters are
//! served in FIFO order by the underlying tokio semaphore.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

/// Returned when a caller gives up waiting for a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cancelled while waiting for a provider slot")]
pub struct Cancelled;

#[derive(Debug, Clone)]
pub struct RateLimiter {
    slots: Arc<Semaphore>,
    capacity: usize,
}

impl RateLimiter {
    /// Create a limiter allowing `capacity` concurrent calls (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { slots: Arc::new(Semaphore::new(capacity)), capacity }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }

    /// Wait for a slot unless `cancel` fires first.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<OwnedSemaphorePermit, Cancelled> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Cancelled),
            permit = Arc::clone(&self.slots).acquire_owned() => permit.map_err(|_| Cancelled),
        }
    }

    /// Run `call` while holding a slot.
    pub async fn run<F, T>(&self, cancel: &CancellationToken, call: F) -> Result<T, Cancelled>
    where
        F: Future<Output = T>,
    {
        let _permit = self.acquire(cancel).await?;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Cancelled),
            out = call => Ok(out),
        }
    }
}
