//! Per-provider listing cache
//!
//! Bulk-directory providers fetch their entire upstream listing once per
//! process and serve every subsequent search from this cache. Entries live
//! for the process lifetime; there is no eviction beyond explicit
//! invalidation (listings are bounded by upstream directory size), and
//! nothing is persisted across restarts.

use chrono::{DateTime, Utc};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::IconRecord;

/// One cached bulk listing.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub listing: Arc<Vec<IconRecord>>,
    pub fetched_at: DateTime<Utc>,
}

/// Shared cache keyed by `(provider_name, cache_key)`.
///
/// Writers are serialized internally; callers never need their own locking.
/// Concurrent first-time fetches for the same key converge through
/// [`put_if_absent`](Self::put_if_absent): the first writer wins and later
/// writers discard their fetch in favor of the stored listing, so all racers
/// return equivalent results.
#[derive(Debug, Default)]
pub struct ListingCache {
    entries: RwLock<HashMap<(String, String), CacheEntry>>,
}

impl ListingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, provider: &str, key: &str) -> Option<Arc<Vec<IconRecord>>> {
        let entries = self.entries.read().await;
        entries
            .get(&(provider.to_string(), key.to_string()))
            .map(|entry| entry.listing.clone())
    }

    /// Store a listing unless one is already present, returning whichever
    /// listing ended up in the slot.
    pub async fn put_if_absent(
        &self,
        provider: &str,
        key: &str,
        listing: Vec<IconRecord>,
    ) -> Arc<Vec<IconRecord>> {
        let mut entries = self.entries.write().await;
        match entries.entry((provider.to_string(), key.to_string())) {
            Entry::Occupied(occupied) => {
                debug!(provider, key, "listing already cached, discarding fetch");
                occupied.get().listing.clone()
            }
            Entry::Vacant(vacant) => {
                debug!(provider, key, count = listing.len(), "caching bulk listing");
                let listing = Arc::new(listing);
                vacant.insert(CacheEntry {
                    listing: listing.clone(),
                    fetched_at: Utc::now(),
                });
                listing
            }
        }
    }

    /// Drop every entry belonging to one provider, e.g. after its
    /// configuration changed. Returns the number of entries removed.
    pub async fn invalidate(&self, provider: &str) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|(entry_provider, _), _| entry_provider != provider);
        let removed = before - entries.len();
        if removed > 0 {
            debug!(provider, removed, "invalidated cached listings");
        }
        removed
    }

    pub async fn fetched_at(&self, provider: &str, key: &str) -> Option<DateTime<Utc>> {
        let entries = self.entries.read().await;
        entries
            .get(&(provider.to_string(), key.to_string()))
            .map(|entry| entry.fetched_at)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
