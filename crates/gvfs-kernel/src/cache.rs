//! Fileset metadata cache.
//!
//! Maps a [`CatalogIdentifier`] to everything needed to serve paths in that
//! fileset: the catalog record, an open backend, and whether the storage
//! location is a single file. Entries are bounded by count (LRU) and by age
//! (TTL from load time).
//!
//! Lookups take a short `parking_lot` read lock and never wait on I/O. A
//! miss takes a per-identifier async gate, re-checks, loads without holding
//! the map lock, then inserts under a brief write lock. Loads for different
//! filesets run in parallel; concurrent misses on the same fileset share a
//! single load.
//!
//! Entries own their backend through a lease, so one that leaves the map is
//! closed only after the calls and open files still using it are done.

use dashmap::DashMap;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use gvfs_types::{CatalogIdentifier, FilesetMetadata};

use crate::catalog::CatalogClient;
use crate::config::CacheConfig;
use crate::error::{GvfsError, GvfsResult};
use crate::lease::BackendLease;
use crate::resolver::BackendResolver;
use crate::vfs::StorageBackend;

/// What a fileset's storage location points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountKind {
    /// A directory (or a location that does not exist yet).
    Directory,
    /// A single file; only the fileset root itself is addressable.
    File,
}

/// One loaded fileset.
///
/// Never mutated after insertion apart from its LRU stamp; a refresh
/// replaces the whole entry.
pub struct CacheEntry {
    identifier: CatalogIdentifier,
    metadata: FilesetMetadata,
    backend: Arc<BackendLease>,
    mount_kind: MountKind,
    loaded_at: Instant,
    last_access: AtomicU64,
}

impl CacheEntry {
    pub fn identifier(&self) -> &CatalogIdentifier {
        &self.identifier
    }

    pub fn metadata(&self) -> &FilesetMetadata {
        &self.metadata
    }

    pub fn storage_location(&self) -> &str {
        &self.metadata.storage_location
    }

    /// The fileset's backend. Holding the returned handle keeps the
    /// backend open even after this entry leaves the cache.
    pub fn backend(&self) -> Arc<dyn StorageBackend> {
        self.backend.clone()
    }

    pub fn mount_kind(&self) -> MountKind {
        self.mount_kind
    }

    pub fn is_single_file(&self) -> bool {
        self.mount_kind == MountKind::File
    }

    pub fn loaded_at(&self) -> Instant {
        self.loaded_at
    }

    fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.loaded_at) >= ttl
    }
}

impl std::fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheEntry")
            .field("identifier", &self.identifier)
            .field("storage_location", &self.metadata.storage_location)
            .field("scheme", &self.backend.scheme())
            .field("mount_kind", &self.mount_kind)
            .finish()
    }
}

/// Counters for cache activity since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Live entries right now.
    pub entries: usize,
    /// Lookups answered without waiting.
    pub hits: u64,
    /// Lookups that went to the load path.
    pub misses: u64,
    /// Catalog round trips that produced an entry.
    pub loads: u64,
    /// Loads that failed (catalog, resolver or probe).
    pub load_failures: u64,
    /// Entries dropped for capacity.
    pub evictions: u64,
    /// Entries dropped for age.
    pub expirations: u64,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    loads: AtomicU64,
    load_failures: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

/// Bounded, TTL-limited map from fileset identifier to loaded entry.
pub struct FilesetCache {
    catalog: Arc<dyn CatalogClient>,
    resolver: BackendResolver,
    max_entries: usize,
    ttl: Duration,
    entries: RwLock<HashMap<CatalogIdentifier, Arc<CacheEntry>>>,
    gates: DashMap<CatalogIdentifier, Arc<Mutex<()>>>,
    clock: AtomicU64,
    counters: Counters,
}

impl FilesetCache {
    /// Create a cache; fails if `config` is out of range.
    pub fn new(
        catalog: Arc<dyn CatalogClient>,
        resolver: BackendResolver,
        config: &CacheConfig,
    ) -> GvfsResult<Self> {
        config.validate()?;
        Ok(Self {
            catalog,
            resolver,
            max_entries: config.max_entries,
            ttl: config.ttl(),
            entries: RwLock::new(HashMap::new()),
            gates: DashMap::new(),
            clock: AtomicU64::new(0),
            counters: Counters::default(),
        })
    }

    /// Get the entry for `id`, loading it on a miss.
    #[tracing::instrument(skip(self), name = "cache.resolve")]
    pub async fn resolve(&self, id: &CatalogIdentifier) -> GvfsResult<Arc<CacheEntry>> {
        if let Some(entry) = self.lookup(id) {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("cache hit");
            return Ok(entry);
        }
        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("cache miss");
        self.load_gated(id).await
    }

    /// Read-locked lookup of a live entry.
    fn lookup(&self, id: &CatalogIdentifier) -> Option<Arc<CacheEntry>> {
        let entries = self.entries.read();
        let entry = entries.get(id)?;
        if entry.is_expired(self.ttl, Instant::now()) {
            return None;
        }
        entry
            .last_access
            .store(self.tick(), Ordering::Relaxed);
        Some(entry.clone())
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }

    async fn load_gated(&self, id: &CatalogIdentifier) -> GvfsResult<Arc<CacheEntry>> {
        let gate = self
            .gates
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let result = {
            let _guard = gate.lock().await;
            // Another loader may have finished while we waited.
            match self.lookup(id) {
                Some(entry) => Ok(entry),
                None => self.load(id).await,
            }
        };

        // Map + our clone means nobody else is queued on this gate.
        self.gates
            .remove_if(id, |_, g| Arc::ptr_eq(g, &gate) && Arc::strong_count(g) == 2);
        result
    }

    /// Fetch, build, probe and insert. Caller holds the gate for `id`.
    #[tracing::instrument(skip(self), name = "cache.load")]
    async fn load(&self, id: &CatalogIdentifier) -> GvfsResult<Arc<CacheEntry>> {
        // An expired entry goes away whether or not the reload succeeds.
        let expired = {
            let mut entries = self.entries.write();
            let now = Instant::now();
            let is_expired = entries
                .get(id)
                .is_some_and(|entry| entry.is_expired(self.ttl, now));
            if is_expired { entries.remove(id) } else { None }
        };
        if let Some(entry) = expired {
            self.counters.expirations.fetch_add(1, Ordering::Relaxed);
            tracing::info!(fileset = %entry.identifier, "fileset entry expired");
            close_entries(vec![entry]).await;
        }

        let entry = match self.build_entry(id).await {
            Ok(entry) => Arc::new(entry),
            Err(e) => {
                self.counters.load_failures.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(error = %e, "fileset load failed");
                return Err(e);
            }
        };
        self.counters.loads.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            storage_location = %entry.storage_location(),
            mount_kind = ?entry.mount_kind,
            "loaded fileset"
        );

        let dropped = {
            let mut entries = self.entries.write();
            let mut dropped: Vec<Arc<CacheEntry>> = Vec::new();
            if let Some(replaced) = entries.insert(id.clone(), entry.clone()) {
                dropped.push(replaced);
            }
            dropped.extend(self.evict_if_needed(&mut entries, id));
            dropped
        };
        close_entries(dropped).await;

        Ok(entry)
    }

    async fn build_entry(&self, id: &CatalogIdentifier) -> GvfsResult<CacheEntry> {
        let metadata = self.catalog.load_fileset(id).await?;
        let backend = Arc::new(BackendLease::new(
            self.resolver.build(id, &metadata.storage_location).await?,
        ));

        let mount_kind = match probe_mount_kind(&*backend, &metadata.storage_location).await {
            Ok(kind) => kind,
            Err(e) => {
                if let Err(close_err) = backend.release().await {
                    tracing::warn!(error = %close_err, "failed to close backend after probe error");
                }
                return Err(e);
            }
        };

        Ok(CacheEntry {
            identifier: id.clone(),
            metadata,
            backend,
            mount_kind,
            loaded_at: Instant::now(),
            last_access: AtomicU64::new(self.tick()),
        })
    }

    /// Drop least-recently-used entries beyond capacity, never `keep`.
    fn evict_if_needed(
        &self,
        entries: &mut HashMap<CatalogIdentifier, Arc<CacheEntry>>,
        keep: &CatalogIdentifier,
    ) -> Vec<Arc<CacheEntry>> {
        let mut evicted = Vec::new();
        while entries.len() > self.max_entries {
            let oldest = entries
                .iter()
                .filter(|(k, _)| *k != keep)
                .min_by_key(|(_, e)| e.last_access.load(Ordering::Relaxed))
                .map(|(k, _)| k.clone());

            match oldest.and_then(|key| entries.remove(&key)) {
                Some(entry) => {
                    self.counters.evictions.fetch_add(1, Ordering::Relaxed);
                    tracing::info!(fileset = %entry.identifier, "evicting fileset entry");
                    evicted.push(entry);
                }
                None => break,
            }
        }
        evicted
    }

    /// Remove every expired entry now. Returns how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let expired: Vec<Arc<CacheEntry>> = {
            let mut entries = self.entries.write();
            let now = Instant::now();
            let keys: Vec<CatalogIdentifier> = entries
                .iter()
                .filter(|(_, e)| e.is_expired(self.ttl, now))
                .map(|(k, _)| k.clone())
                .collect();
            keys.iter().filter_map(|k| entries.remove(k)).collect()
        };
        let count = expired.len();
        if count > 0 {
            self.counters
                .expirations
                .fetch_add(count as u64, Ordering::Relaxed);
            tracing::debug!(count, "purged expired fileset entries");
        }
        close_entries(expired).await;
        count
    }

    /// Run [`purge_expired`](Self::purge_expired) every `interval` until the
    /// cache is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // First tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(cache) = weak.upgrade() else {
                    break;
                };
                cache.purge_expired().await;
            }
            tracing::debug!("fileset cache sweeper stopped");
        })
    }

    /// Drop the entry for `id`, closing its backend. Returns true if one
    /// was present.
    pub async fn invalidate(&self, id: &CatalogIdentifier) -> bool {
        let removed = self.entries.write().remove(id);
        match removed {
            Some(entry) => {
                close_entries(vec![entry]).await;
                true
            }
            None => false,
        }
    }

    /// Drop every entry, closing their backends.
    pub async fn invalidate_all(&self) {
        let drained: Vec<Arc<CacheEntry>> = {
            let mut entries = self.entries.write();
            entries.drain().map(|(_, e)| e).collect()
        };
        close_entries(drained).await;
    }

    /// Live entry for `id`, without loading or touching LRU order.
    pub fn peek(&self, id: &CatalogIdentifier) -> Option<Arc<CacheEntry>> {
        let entries = self.entries.read();
        entries
            .get(id)
            .filter(|e| !e.is_expired(self.ttl, Instant::now()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            loads: self.counters.loads.load(Ordering::Relaxed),
            load_failures: self.counters.load_failures.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            expirations: self.counters.expirations.load(Ordering::Relaxed),
        }
    }
}

/// Single-file or directory? A missing location counts as a directory.
async fn probe_mount_kind(
    backend: &dyn StorageBackend,
    storage_location: &str,
) -> GvfsResult<MountKind> {
    match backend.getattr(storage_location).await {
        Ok(status) if status.is_file() => Ok(MountKind::File),
        Ok(_) => Ok(MountKind::Directory),
        Err(e) if e.is_not_found() => Ok(MountKind::Directory),
        Err(source) => Err(GvfsError::Backend {
            path: storage_location.to_string(),
            source,
        }),
    }
}

/// Close the backends of entries that left the cache.
///
/// Backends still held by an in-flight call or an open file are skipped;
/// their lease closes them when the last holder drops.
async fn close_entries(entries: Vec<Arc<CacheEntry>>) {
    for entry in entries {
        let Ok(entry) = Arc::try_unwrap(entry) else {
            continue;
        };
        if Arc::strong_count(&entry.backend) > 1 {
            continue;
        }
        if let Err(e) = entry.backend.release().await {
            tracing::warn!(
                fileset = %entry.identifier,
                error = %e,
                "failed to close backend"
            );
        }
    }
}
