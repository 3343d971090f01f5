//! Per-client snapshot cache for raw collection payloads.
//!
//! Each collection is fetched at most once per client; the result is kept
//! as an immutable, shared snapshot until it is explicitly invalidated.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use super::Collection;
use crate::error::Result;

/// Immutable raw records of one collection.
pub type Snapshot = Arc<Vec<serde_json::Value>>;

/// Counters describing cache usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served from a stored snapshot
    pub hits: u64,
    /// Lookups that had to fetch
    pub misses: u64,
    /// Collections currently stored
    pub entries: usize,
}

/// Mapping from collection to its lazily populated snapshot.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    entries: Mutex<HashMap<Collection, Snapshot>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the stored snapshot, or run `fetch` and store its result.
    ///
    /// A failed fetch stores nothing, so the next call fetches again.
    pub fn get_or_fetch<F>(&self, collection: Collection, fetch: F) -> Result<Snapshot>
    where
        F: FnOnce() -> Result<Vec<serde_json::Value>>,
    {
        if let Some(snapshot) = self.get(collection) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!("cache hit for {}", collection);
            return Ok(snapshot);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let snapshot = Arc::new(fetch()?);
        self.entries
            .lock()
            .entry(collection)
            .or_insert_with(|| Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// The stored snapshot, if any, without fetching.
    pub fn get(&self, collection: Collection) -> Option<Snapshot> {
        self.entries.lock().get(&collection).cloned()
    }

    pub fn contains(&self, collection: Collection) -> bool {
        self.entries.lock().contains_key(&collection)
    }

    /// Drop one collection so the next lookup fetches it again.
    pub fn invalidate(&self, collection: Collection) -> bool {
        self.entries.lock().remove(&collection).is_some()
    }

    /// Drop every snapshot and zero the counters.
    pub fn reset(&self) {
        self.entries.lock().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.lock().len(),
        }
    }
}
