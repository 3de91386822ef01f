//! Handles over cache writes spawned by enrichment and image calls.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::JoinHandle;

/// Background cache writes a caller may await.
///
/// Dropping the handle does not cancel the writes.
#[derive(Debug, Default)]
pub struct PendingWrites {
    handles: Vec<JoinHandle<()>>,
}

impl PendingWrites {
    pub(crate) fn push(&mut self, handle: JoinHandle<()>) {
        self.handles.push(handle);
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every write to finish. Write failures are already logged by
    /// the store; a panicked write task is logged here.
    pub async fn wait(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "cache write task failed");
            }
        }
    }

    fn absorb(&mut self, other: PendingWrites) {
        self.handles.retain(|handle| !handle.is_finished());
        self.handles.extend(other.handles);
    }
}

/// Writes still outstanding across calls, shared by every tool invocation.
///
/// The runtime cancels spawned tasks when `main` returns, so the server
/// drains this before exiting.
#[derive(Debug, Clone, Default)]
pub struct WriteTracker {
    pending: Arc<Mutex<PendingWrites>>,
}

impl WriteTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand over a call's writes. Writes that already finished are dropped.
    pub fn track(&self, writes: PendingWrites) {
        if writes.is_empty() {
            return;
        }
        lock(&self.pending).absorb(writes);
    }

    /// Writes not yet known to have finished.
    pub fn outstanding(&self) -> usize {
        lock(&self.pending).handles.iter().filter(|handle| !handle.is_finished()).count()
    }

    /// Wait for every tracked write, including ones tracked while draining.
    pub async fn drain(&self) {
        loop {
            let writes = std::mem::take(&mut *lock(&self.pending));
            if writes.is_empty() {
                return;
            }
            tracing::debug!(pending_writes = writes.len(), "waiting for cache writes");
            writes.wait().await;
        }
    }
}

fn lock(pending: &Mutex<PendingWrites>) -> MutexGuard<'_, PendingWrites> {
    pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
