//! Market snapshot store
//!
//! Holds the latest listings batch and replaces it wholesale on every
//! successful refresh. Overlapping refreshes are resolved by a
//! sequence number taken before the fetch and compared at commit time:
//! an older response that resolves after a newer one has committed is
//! discarded rather than overwriting the fresher snapshot.

use crate::{
    constants::TOP_LISTINGS_LIMIT, error::MarketError, market::ListingsProvider,
    types::ListingsSnapshot,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct CommittedSnapshot {
    snapshot: Option<ListingsSnapshot>,
    seq: u64,
}

/// Store for the latest top-listings snapshot
///
/// Independent of the wallet session: refreshes share no mutable state
/// with it and may run while wallet operations are in flight.
pub struct MarketSnapshotStore {
    provider: Arc<dyn ListingsProvider>,
    slot: RwLock<CommittedSnapshot>,
    next_seq: AtomicU64,
}

impl MarketSnapshotStore {
    /// Creates an empty store backed by the given provider
    pub fn new(provider: Arc<dyn ListingsProvider>) -> Self {
        Self {
            provider,
            slot: RwLock::new(CommittedSnapshot::default()),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Fetches a fresh batch and commits it if still the newest
    ///
    /// On failure the previous snapshot is retained unchanged and the
    /// failure is logged before being returned.
    pub async fn refresh(&self) -> Result<(), MarketError> {
        // Sequence taken before the fetch so commit order reflects
        // request order, not response order
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;

        match self.provider.fetch_top_listings(TOP_LISTINGS_LIMIT).await {
            Ok(snapshot) => {
                let mut slot = self.slot.write().await;
                if seq > slot.seq {
                    tracing::debug!(count = snapshot.listings.len(), "market snapshot replaced");
                    slot.seq = seq;
                    slot.snapshot = Some(snapshot);
                } else {
                    tracing::debug!(seq, committed = slot.seq, "stale market response discarded");
                }
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "market refresh failed, keeping previous snapshot");
                Err(err)
            }
        }
    }

    /// The current snapshot, cloned; never a partially replaced batch
    pub async fn latest(&self) -> Option<ListingsSnapshot> {
        self.slot.read().await.snapshot.clone()
    }
}
