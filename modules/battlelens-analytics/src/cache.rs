//! Process-local TTL cache for parsed snapshots and computed responses.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Source of "now" for expiry checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

struct Entry<V> {
    value: V,
    inserted_at: DateTime<Utc>,
}

/// Key -> (value, insertion time) with a fixed time-to-live.
///
/// Nothing is evicted proactively: an expired entry reads as a miss and is
/// overwritten by the next insert for its key, or dropped by `purge_expired`.
pub struct TtlCache<V> {
    entries: HashMap<String, Entry<V>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            clock,
        }
    }

    pub fn with_system_clock(ttl: Duration) -> Self {
        Self::new(ttl, Arc::new(SystemClock))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached value if present and younger than the TTL.
    pub fn get(&self, key: &str) -> Option<V> {
        let entry = self.entries.get(key)?;
        if self.is_fresh(entry.inserted_at) {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    pub fn insert(&mut self, key: String, value: V) {
        let inserted_at = self.clock.now();
        self.entries.insert(key, Entry { value, inserted_at });
    }

    /// Drop expired entries, returning how many were removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now();
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries.retain(|_, e| now - e.inserted_at < ttl);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_fresh(&self, inserted_at: DateTime<Utc>) -> bool {
        self.clock.now() - inserted_at < self.ttl
    }
}

/// Stable cache key: sha256 over the namespace and the JSON form of `params`.
///
/// Struct fields serialize in declaration order, so equal parameter values
/// always hash the same.
pub fn cache_key<K: Serialize + ?Sized>(
    namespace: &str,
    params: &K,
) -> serde_json::Result<String> {
    let params_bytes = serde_json::to_vec(params)?;
    let mut hasher = Sha256::new();
    hasher.update(namespace.as_bytes());
    hasher.update([0u8]);
    hasher.update(&params_bytes);
    Ok(hex::encode(hasher.finalize()))
}
