//! Explicit time-to-live cache. Owners construct it with a TTL and a clock and
//! drop it when done; there is no process-wide instance.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::debug;

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
}

pub struct TtlCache<V> {
    ttl: Duration,
    clock: Box<dyn Clock>,
    entries: HashMap<String, CacheEntry<V>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }

    pub fn with_clock(ttl: Duration, clock: impl Clock + 'static) -> Self {
        Self {
            ttl,
            clock: Box::new(clock),
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh value for `key`, if any.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let entry = self.entries.get(key)?;
        if now.duration_since(entry.stored_at) < self.ttl {
            debug!("cache hit for {key}");
            Some(entry.value.clone())
        } else {
            None
        }
    }

    /// Stores `value` under `key` and drops every expired entry.
    pub fn insert(&mut self, key: &str, value: V) {
        let now = self.clock.now();
        let ttl = self.ttl;
        self.entries
            .retain(|_, entry| now.duration_since(entry.stored_at) < ttl);
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                stored_at: now,
            },
        );
    }

    /// Returns the fresh entry for `key`, or runs `fetch` and stores its
    /// value. A failed fetch falls back to a stale entry when one exists.
    pub fn get_or_fetch<E, F>(&mut self, key: &str, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        debug!("cache miss for {key}");
        match fetch() {
            Ok(value) => {
                self.insert(key, value.clone());
                Ok(value)
            }
            Err(err) => match self.entries.get(key) {
                Some(stale) => {
                    debug!("fetch failed for {key}, serving stale entry");
                    Ok(stale.value.clone())
                }
                None => Err(err),
            },
        }
    }

    pub fn invalidate(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
