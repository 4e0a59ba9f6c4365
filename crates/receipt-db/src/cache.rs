//! # Session Cache
//!
//! Bounded read cache of validated sessions.
//!
//! ## Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  get(id)                                                                │
//! │    ├── missing            → None                                       │
//! │    ├── older than ttl     → dropped, None                              │
//! │    └── fresh              → Some(session), marked most recently used   │
//! │                                                                         │
//! │  insert(session)                                                        │
//! │    └── at capacity        → least recently used entry evicted          │
//! │                                                                         │
//! │  Defaults: 100 entries, 5 minutes                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Entries age from insertion, not from last access. Time comes from
//! `tokio::time`, so tests can pause and advance the clock.
//!
//! ## Read/Write Races
//! ```text
//! reader: generation() ─► store.fetch ............ insert_if_current(g) ─► skipped
//! writer:                      store.write ─► invalidate (generation + 1)
//! ```
//! A reader only caches what it fetched if no invalidation happened since it
//! took its generation, so a fetch that overlaps a write never resurrects
//! the pre-write row.

use std::collections::HashMap;
use std::time::Duration;

use receipt_core::Session;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::trace;
use uuid::Uuid;

/// Default time-to-live of a cached session.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Default maximum number of cached sessions.
pub const DEFAULT_CAPACITY: usize = 100;

/// Cache sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    pub ttl: Duration,
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            ttl: DEFAULT_TTL,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

#[derive(Debug, Clone)]
struct CachedSession {
    session: Session,
    cached_at: Instant,
    /// Monotonic access stamp; the smallest one is evicted first.
    last_used: u64,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<Uuid, CachedSession>,
    clock: u64,
    /// Bumped by every invalidation.
    generation: u64,
}

impl CacheInner {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub expired: usize,
}

/// TTL + LRU cache of sessions keyed by id.
#[derive(Debug)]
pub struct SessionCache {
    config: CacheConfig,
    inner: Mutex<CacheInner>,
}

impl SessionCache {
    pub fn new(config: CacheConfig) -> Self {
        SessionCache {
            config,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    pub fn config(&self) -> CacheConfig {
        self.config
    }

    /// Returns a fresh cached session, if any.
    pub async fn get(&self, id: Uuid) -> Option<Session> {
        let mut inner = self.inner.lock().await;
        let stamp = inner.tick();

        let expired = match inner.entries.get_mut(&id) {
            None => return None,
            Some(entry) if entry.cached_at.elapsed() >= self.config.ttl => true,
            Some(entry) => {
                entry.last_used = stamp;
                return Some(entry.session.clone());
            }
        };

        if expired {
            trace!(session_id = %id, "Cache entry expired");
            inner.entries.remove(&id);
        }
        None
    }

    /// Current write generation, taken by readers before they fetch.
    pub async fn generation(&self) -> u64 {
        self.inner.lock().await.generation
    }

    /// Caches a session, evicting the least recently used entry when full.
    pub async fn insert(&self, session: Session) {
        let mut inner = self.inner.lock().await;
        self.insert_locked(&mut inner, session);
    }

    /// Caches a session fetched under `generation`, unless an invalidation
    /// happened since. Returns whether it was cached.
    pub async fn insert_if_current(&self, session: Session, generation: u64) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.generation != generation {
            trace!(session_id = %session.id, "Skipping cache fill after concurrent write");
            return false;
        }
        self.insert_locked(&mut inner, session)
    }

    fn insert_locked(&self, inner: &mut CacheInner, session: Session) -> bool {
        if self.config.capacity == 0 {
            return false;
        }

        let stamp = inner.tick();
        let id = session.id;

        if !inner.entries.contains_key(&id) && inner.entries.len() >= self.config.capacity {
            let oldest = inner
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| *key);
            if let Some(oldest) = oldest {
                trace!(session_id = %oldest, "Evicting least recently used session");
                inner.entries.remove(&oldest);
            }
        }

        inner.entries.insert(
            id,
            CachedSession {
                session,
                cached_at: Instant::now(),
                last_used: stamp,
            },
        );
        true
    }

    /// Drops one session. Returns whether it was cached.
    pub async fn invalidate(&self, id: Uuid) -> bool {
        let mut inner = self.inner.lock().await;
        inner.generation += 1;
        inner.entries.remove(&id).is_some()
    }

    /// Clear the cache
    pub async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        inner.generation += 1;
        inner.entries.clear();
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().await;
        CacheStats {
            entries: inner.entries.len(),
            expired: inner
                .entries
                .values()
                .filter(|entry| entry.cached_at.elapsed() >= self.config.ttl)
                .count(),
        }
    }
}

impl Default for SessionCache {
    fn default() -> Self {
        SessionCache::new(CacheConfig::default())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
