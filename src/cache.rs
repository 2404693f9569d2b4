//! Cross-request memoization of search results: capacity-bounded
//! (least-recently-used first out) and time-bounded. The clock is
//! injectable so expiry is deterministically testable, and each key
//! carries a single-flight lock so identical concurrent queries cannot
//! race to populate the same entry with two browser sessions.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, Instant};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

use crate::models::Listing;

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct Entry {
    listings: Vec<Listing>,
    expires_at: Instant,
}

#[derive(Default)]
struct Inner {
    map: HashMap<String, Entry>,
    // Recency order, least recently used at the front.
    order: VecDeque<String>,
}

pub struct ResultCache {
    inner: Mutex<Inner>,
    flights: Mutex<HashMap<String, Weak<AsyncMutex<()>>>>,
    capacity: usize,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl ResultCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self::with_clock(capacity, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(capacity: usize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            flights: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
            ttl,
            clock,
        }
    }

    /// Stored listings for `key`, if present and unexpired. A hit counts
    /// as a use for eviction ordering.
    pub fn get(&self, key: &str) -> Option<Vec<Listing>> {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        let now = self.clock.now();

        let expired = match inner.map.get(key) {
            Some(entry) => entry.expires_at <= now,
            None => return None,
        };
        if expired {
            debug!(key, "cache entry expired");
            inner.map.remove(key);
            inner.order.retain(|k| k != key);
            return None;
        }

        inner.order.retain(|k| k != key);
        inner.order.push_back(key.to_string());
        inner.map.get(key).map(|e| e.listings.clone())
    }

    /// Store the final assembled result set for `key`. Entries are
    /// immutable until they expire or get evicted.
    pub fn insert(&self, key: String, listings: Vec<Listing>) {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        let expires_at = self.clock.now() + self.ttl;

        if inner.map.insert(key.clone(), Entry { listings, expires_at }).is_none()
            && inner.order.len() >= self.capacity
        {
            if let Some(evicted) = inner.order.pop_front() {
                debug!(key = %evicted, "cache capacity eviction");
                inner.map.remove(&evicted);
            }
        }
        inner.order.retain(|k| k != &key);
        inner.order.push_back(key);
    }

    /// Per-key population lock. Callers hold the guard across the scrape
    /// and re-check `get` after acquiring it, making lookup-or-begin-fetch
    /// atomic per key.
    pub async fn begin_fetch(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut flights = self.flights.lock().expect("flight lock poisoned");
            flights.retain(|_, weak| weak.strong_count() > 0);
            match flights.get(key).and_then(Weak::upgrade) {
                Some(existing) => existing,
                None => {
                    let fresh = Arc::new(AsyncMutex::new(()));
                    flights.insert(key.to_string(), Arc::downgrade(&fresh));
                    fresh
                }
            }
        };
        lock.lock_owned().await
    }
}
