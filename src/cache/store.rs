//! Cache Store Module
//!
//! Main cache engine combining the keyed digest, the radix index and the leaf
//! registry behind a single reader/writer guard.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::cache::{
    CacheStats, Digester, DigitWidth, LeafEntry, LeafRegistry, NodeId, RadixIndex, Secret,
    StatsCounters,
};
use crate::config::{validate_timing, CacheConfig};
use crate::error::{ConfigError, Result};
use crate::tasks::Scavenger;

// == Cache State ==
/// Everything guarded by the cache lock.
#[derive(Debug)]
pub(crate) struct CacheState {
    index: RadixIndex,
    registry: LeafRegistry,
    ttl_ms: u64,
    scavenge_interval_ms: u64,
}

impl CacheState {
    fn new(config: &CacheConfig) -> Self {
        Self {
            index: RadixIndex::new(config.digit_width),
            registry: LeafRegistry::new(),
            ttl_ms: config.ttl_ms,
            scavenge_interval_ms: config.scavenge_interval_ms,
        }
    }

    /// Drops the row for `leaf` and prunes the branch it leaves behind.
    fn evict(&mut self, leaf: NodeId) -> bool {
        if self.registry.remove(leaf).is_none() {
            return false;
        }
        self.index.prune(leaf);
        true
    }

    fn sweep(&mut self, now: DateTime<Utc>) -> usize {
        let stale = self.registry.stale_leaves(now, self.ttl_ms);
        stale.into_iter().filter(|leaf| self.evict(*leaf)).count()
    }
}

// == Cache Shared ==
/// State shared between the cache handle and its scavenger task.
#[derive(Debug)]
pub(crate) struct CacheShared {
    digester: Digester,
    width: DigitWidth,
    state: RwLock<CacheState>,
    stats: StatsCounters,
}

impl CacheShared {
    fn read_state(&self) -> RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(|poisoned| {
            warn!("Cache lock poisoned, recovering shared access");
            PoisonError::into_inner(poisoned)
        })
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(|poisoned| {
            warn!("Cache lock poisoned, recovering exclusive access");
            PoisonError::into_inner(poisoned)
        })
    }

    fn path(&self, key: &[u8]) -> impl Iterator<Item = usize> {
        self.width.digits(self.digester.digest(key))
    }

    // == Sweep Expired ==
    /// Removes every entry older than the TTL at `now`, pruning as it goes.
    ///
    /// Runs entirely under one exclusive acquisition.
    pub(crate) fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let removed = self.write_state().sweep(now);
        self.stats.record_sweep(removed);
        removed
    }

    pub(crate) fn len(&self) -> usize {
        self.read_state().registry.len()
    }
}

// == Hash Cache ==
/// In-memory cache addressed by the keyed SipHash digest of each key.
///
/// Entries are never checked for age on read. The background scavenger
/// removes entries older than the TTL every scavenge interval, so a value may
/// be returned for up to one interval after it has nominally expired.
///
/// Two keys with the same 64-bit digest share one slot; the later write wins.
#[derive(Debug)]
pub struct HashCache {
    shared: Arc<CacheShared>,
    scavenger: Scavenger,
}

impl HashCache {
    // == Constructor ==
    /// Creates a cache with the default TTL (10 s) and scavenge interval (1 s).
    ///
    /// `secret` is normalized to 16 bytes: left-padded with zeros when shorter,
    /// only its last 16 bytes kept when longer.
    ///
    /// # Panics
    /// Must be called from within a Tokio runtime, since it spawns the scavenger.
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self::start(secret.as_ref(), CacheConfig::default())
    }

    /// Creates a cache with custom settings, rejecting an invalid TTL/interval pair.
    ///
    /// # Panics
    /// Must be called from within a Tokio runtime, since it spawns the scavenger.
    pub fn with_config(secret: impl AsRef<[u8]>, config: CacheConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::start(secret.as_ref(), config))
    }

    fn start(secret: &[u8], config: CacheConfig) -> Self {
        let shared = Arc::new(CacheShared {
            digester: Digester::new(&Secret::normalize(secret)),
            width: config.digit_width,
            state: RwLock::new(CacheState::new(&config)),
            stats: StatsCounters::default(),
        });
        let scavenger = Scavenger::spawn(Arc::clone(&shared), config.scavenge_interval_ms);

        info!(
            ttl_ms = config.ttl_ms,
            scavenge_interval_ms = config.scavenge_interval_ms,
            digit_bits = config.digit_width.bits(),
            "Hash cache initialized"
        );

        Self { shared, scavenger }
    }

    // == Write ==
    /// Stores `value` under `key`, replacing any previous value at the same digest.
    pub fn write(&self, key: impl AsRef<[u8]>, value: impl Into<Vec<u8>>) {
        let path = self.shared.path(key.as_ref());
        let entry = LeafEntry::new(value.into());

        {
            let mut state = self.shared.write_state();
            let leaf = state.index.ensure_path(path);
            state.registry.upsert(leaf, entry);
        }

        self.shared.stats.record_write();
    }

    // == Read ==
    /// Returns a copy of the value stored under `key`, if any.
    ///
    /// Does not look at the entry's age.
    pub fn read(&self, key: impl AsRef<[u8]>) -> Option<Vec<u8>> {
        let path = self.shared.path(key.as_ref());

        let value = {
            let state = self.shared.read_state();
            state
                .index
                .lookup_path(path)
                .and_then(|leaf| state.registry.get(leaf))
                .map(|entry| entry.value.clone())
        };

        match value {
            Some(_) => self.shared.stats.record_hit(),
            None => self.shared.stats.record_miss(),
        }
        value
    }

    // == Delete ==
    /// Removes `key`. Returns true if an entry was removed.
    pub fn delete(&self, key: impl AsRef<[u8]>) -> bool {
        let path = self.shared.path(key.as_ref());

        let removed = {
            let mut state = self.shared.write_state();
            match state.index.lookup_path(path) {
                Some(leaf) => state.evict(leaf),
                None => false,
            }
        };

        if removed {
            self.shared.stats.record_delete();
            debug!("Cache entry deleted");
        }
        removed
    }

    // == Count ==
    /// Returns the current number of entries in the cache.
    pub fn count(&self) -> usize {
        self.shared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn ttl_ms(&self) -> u64 {
        self.shared.read_state().ttl_ms
    }

    pub fn scavenge_interval_ms(&self) -> u64 {
        self.shared.read_state().scavenge_interval_ms
    }

    pub fn digit_width(&self) -> DigitWidth {
        self.shared.width
    }

    // == Set TTL ==
    /// Sets the entry time-to-live. Must be at least the scavenge interval.
    pub fn set_ttl(&self, ttl_ms: u64) -> Result<()> {
        let mut state = self.shared.write_state();
        if ttl_ms < state.scavenge_interval_ms {
            let err = ConfigError::TtlBelowScavengeInterval {
                ttl_ms,
                interval_ms: state.scavenge_interval_ms,
            };
            warn!(error = %err, "Rejected TTL change");
            return Err(err);
        }
        state.ttl_ms = ttl_ms;
        debug!(ttl_ms, "TTL updated");
        Ok(())
    }

    // == Set Scavenge Interval ==
    /// Sets how often the scavenger sweeps. Must be non-zero and at most the TTL.
    ///
    /// A scavenger wait already in progress completes at its old length; the
    /// following waits use the new interval.
    pub fn set_scavenge_interval(&self, interval_ms: u64) -> Result<()> {
        let mut state = self.shared.write_state();
        if let Err(err) = validate_timing(state.ttl_ms, interval_ms) {
            warn!(error = %err, "Rejected scavenge interval change");
            return Err(err);
        }
        state.scavenge_interval_ms = interval_ms;
        self.scavenger.reschedule(interval_ms);
        debug!(interval_ms, "Scavenge interval updated");
        Ok(())
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let (entries, nodes) = {
            let state = self.shared.read_state();
            (state.registry.len(), state.index.node_count())
        };
        self.shared.stats.snapshot(entries, nodes)
    }

    // == Sweep Expired ==
    /// Runs one scavenger sweep immediately. Returns the number of entries removed.
    pub fn sweep_expired(&self) -> usize {
        self.shared.sweep_expired(Utc::now())
    }

    // == Stop ==
    /// Stops the scavenger and waits for its task to exit.
    ///
    /// The cache stays usable afterwards but entries no longer expire unless
    /// [`HashCache::sweep_expired`] is called. Calling `stop` twice is harmless.
    pub async fn stop(&self) {
        self.scavenger.stop().await;
    }

    /// Returns true once the scavenger task has exited.
    pub fn is_stopped(&self) -> bool {
        self.scavenger.is_finished()
    }
}
