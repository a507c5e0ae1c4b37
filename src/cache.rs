//! Per-video retriever cache.
//!
//! Memoizes the [`VectorIndex`] of each video so repeated questions skip
//! chunking and embedding. Entries are bounded by an LRU capacity and an
//! optional time-to-live. Each entry owns a `OnceCell`, so concurrent cold
//! lookups of one video share a single build while lookups of other videos
//! proceed independently. The map lock is only held for bookkeeping, never
//! across an await.
//!
//! An entry whose build is still running is never evicted or expired. The map
//! may briefly hold more than `capacity` entries while builds are in flight and
//! is trimmed again as each build completes. The TTL counts from completion.

use crate::config::CacheSettings;
use crate::error::Result;
use crate::index::{Indexer, VectorIndex};
use crate::transcript::Transcript;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

type Slot = Arc<OnceCell<Arc<VectorIndex>>>;

struct Entry {
    slot: Slot,
    /// Set once the build completes.
    built_at: Option<Instant>,
    last_used: u64,
}

impl Entry {
    /// Built, or abandoned by every caller.
    fn evictable(&self) -> bool {
        self.slot.initialized() || Arc::strong_count(&self.slot) == 1
    }
}

#[derive(Default)]
struct Entries {
    map: HashMap<String, Entry>,
    clock: u64,
}

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub builds: u64,
    pub evictions: u64,
}

/// Cache mapping video IDs to their vector index.
pub struct RetrieverCache {
    indexer: Arc<Indexer>,
    capacity: usize,
    ttl: Option<Duration>,
    entries: Mutex<Entries>,
    hits: AtomicU64,
    misses: AtomicU64,
    builds: AtomicU64,
    evictions: AtomicU64,
}

impl RetrieverCache {
    /// Create a cache holding at most `capacity` indexes.
    pub fn new(indexer: Arc<Indexer>, capacity: usize, ttl: Option<Duration>) -> Self {
        Self {
            indexer,
            capacity: capacity.max(1),
            ttl,
            entries: Mutex::new(Entries::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            builds: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn from_settings(indexer: Arc<Indexer>, settings: &CacheSettings) -> Self {
        Self::new(
            indexer,
            settings.capacity,
            settings.ttl_seconds.map(Duration::from_secs),
        )
    }

    pub fn indexer(&self) -> &Arc<Indexer> {
        &self.indexer
    }

    /// Return the index for a video, building it from `transcript` on a miss.
    ///
    /// A hit returns the cached index even if `transcript` differs from the one
    /// originally indexed.
    pub async fn get_or_build(&self, video_id: &str, transcript: &Transcript) -> Result<Arc<VectorIndex>> {
        self.get_or_try_build(video_id, || self.indexer.index_transcript(transcript))
            .await
    }

    /// Return the index for a video, running `build` on a miss.
    ///
    /// At most one build runs per video at a time; concurrent callers wait for it
    /// and share its result. If the build fails or is cancelled, the next waiter
    /// starts its own. A failed build with nobody waiting leaves no entry.
    #[instrument(skip(self, build))]
    pub async fn get_or_try_build<F, Fut>(&self, video_id: &str, build: F) -> Result<Arc<VectorIndex>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<VectorIndex>>,
    {
        let slot = self.slot(video_id);

        if let Some(index) = slot.get() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Cache hit for {}", video_id);
            return Ok(index.clone());
        }

        let mut built = false;
        let result = slot
            .get_or_try_init(|| {
                built = true;
                self.builds.fetch_add(1, Ordering::Relaxed);
                info!("Building index for {}", video_id);
                async move { build().await.map(Arc::new) }
            })
            .await;

        match result {
            Ok(index) => {
                if built {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    self.mark_built(video_id, &slot);
                } else {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                }
                Ok(index.clone())
            }
            Err(e) => {
                self.discard_if_unbuilt(video_id, &slot);
                Err(e)
            }
        }
    }

    /// Whether a built, unexpired index is cached for the video.
    pub fn contains(&self, video_id: &str) -> bool {
        let entries = self.lock();
        entries
            .map
            .get(video_id)
            .is_some_and(|e| !self.is_expired(e) && e.slot.initialized())
    }

    /// Number of entries, including builds in flight.
    pub fn len(&self) -> usize {
        self.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            builds: self.builds.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_expired(&self, entry: &Entry) -> bool {
        match (self.ttl, entry.built_at) {
            (Some(ttl), Some(built_at)) => built_at.elapsed() >= ttl,
            _ => false,
        }
    }

    /// Find or create the slot for a video, updating recency and evicting as needed.
    fn slot(&self, video_id: &str) -> Slot {
        let mut entries = self.lock();
        entries.clock += 1;
        let now = entries.clock;

        if let Some(entry) = entries.map.get_mut(video_id) {
            if !self.is_expired(entry) {
                entry.last_used = now;
                return entry.slot.clone();
            }
            debug!("Cached index for {} expired", video_id);
            entries.map.remove(video_id);
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }

        let slot: Slot = Arc::new(OnceCell::new());
        entries.map.insert(
            video_id.to_string(),
            Entry {
                slot: slot.clone(),
                built_at: None,
                last_used: now,
            },
        );
        self.evict_over_capacity(&mut entries, video_id);

        slot
    }

    /// Stamp a finished build and trim entries that piled up while it ran.
    fn mark_built(&self, video_id: &str, slot: &Slot) {
        let mut entries = self.lock();
        if let Some(entry) = entries.map.get_mut(video_id) {
            if Arc::ptr_eq(&entry.slot, slot) {
                entry.built_at = Some(Instant::now());
            }
        }
        self.evict_over_capacity(&mut entries, video_id);
    }

    /// Drop least recently used entries until the map fits, skipping `keep`
    /// and any build still in flight.
    fn evict_over_capacity(&self, entries: &mut Entries, keep: &str) {
        while entries.map.len() > self.capacity {
            let victim = entries
                .map
                .iter()
                .filter(|(key, e)| key.as_str() != keep && e.evictable())
                .min_by_key(|(_, e)| e.last_used)
                .map(|(key, _)| key.clone());

            match victim {
                Some(key) => {
                    debug!("Evicting index for {}", key);
                    entries.map.remove(&key);
                    self.evictions.fetch_add(1, Ordering::Relaxed);
                }
                None => break,
            }
        }
    }

    /// Remove a slot whose build failed, unless another caller is waiting on it
    /// and will start its own build.
    fn discard_if_unbuilt(&self, video_id: &str, slot: &Slot) {
        let mut entries = self.lock();
        let abandoned = entries.map.get(video_id).is_some_and(|e| {
            Arc::ptr_eq(&e.slot, slot) && !e.slot.initialized() && Arc::strong_count(&e.slot) <= 2
        });
        if abandoned {
            entries.map.remove(video_id);
        }
    }
}
