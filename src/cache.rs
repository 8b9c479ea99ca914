//! TTL cache for rule and policy documents
//!
//! Restriction rules and commission policies are read-only from the engine's
//! perspective; admin workflows mutate them elsewhere. The engine tolerates
//! brief staleness (bounded by the TTL) and exposes explicit invalidation
//! hooks for rule/policy writers.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Concurrent TTL cache keyed by string. A TTL of zero disables caching.
#[derive(Debug)]
pub struct TtlCache<V> {
    ttl: Duration,
    entries: DashMap<String, (Instant, Arc<V>)>,
}

impl<V> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    /// Fetch a live entry; expired entries are dropped on access.
    ///
    /// The removal happens after the read guard is released: removing while
    /// still holding the shard's read lock would deadlock the calling
    /// thread.
    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        if self.ttl.is_zero() {
            return None;
        }
        let live = match self.entries.get(key) {
            Some(entry) if entry.0.elapsed() < self.ttl => Some(entry.1.clone()),
            _ => None,
        };
        if live.is_none() {
            // Guarded so a concurrent put between the read and this call
            // is not thrown away.
            self.entries
                .remove_if(key, |_, (stored, _)| stored.elapsed() >= self.ttl);
        }
        live
    }

    pub fn put(&self, key: impl Into<String>, value: V) -> Arc<V> {
        let value = Arc::new(value);
        if !self.ttl.is_zero() {
            self.entries.insert(key.into(), (Instant::now(), value.clone()));
        }
        value
    }

    /// Invalidation hook for rule/policy writers.
    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}
