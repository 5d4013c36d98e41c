//! Time-boxed memoization of GET responses.
//!
//! Entries expire a fixed TTL after they were written. Expiry is lazy: a
//! stale entry is removed when it is read, never by a background sweep.

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::envelope::NormalizedResponse;

/// Freshness window of a cached response.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Query parameters of a GET. Ordered, so their JSON form is stable.
pub type Params = BTreeMap<String, String>;

/// Source of the current instant, injectable for tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub data: NormalizedResponse<Value>,
    pub timestamp: Instant,
}

#[derive(Debug)]
pub struct ResponseCache {
    ttl: Duration,
    entries: HashMap<String, CacheEntry>,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh entry for `key`, evicting it when stale.
    pub fn get(&mut self, key: &str, now: Instant) -> Option<NormalizedResponse<Value>> {
        let entry = self.entries.get(key)?;
        if now.saturating_duration_since(entry.timestamp) > self.ttl {
            self.entries.remove(key);
            return None;
        }
        Some(entry.data.clone())
    }

    pub fn insert(&mut self, key: String, data: NormalizedResponse<Value>, now: Instant) {
        self.entries.insert(
            key,
            CacheEntry {
                data,
                timestamp: now,
            },
        );
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

/// `"<endpoint>:<JSON of params>"`, with `{}` when there are none.
pub fn cache_key(endpoint: &str, params: Option<&Params>) -> String {
    let params = match params {
        Some(params) => serde_json::to_string(params).unwrap_or_else(|_| "{}".to_string()),
        None => "{}".to_string(),
    };
    format!("{endpoint}:{params}")
}
