//! In-process LRU cache for rendered widgets.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use lru::LruCache;
use serde::Serialize;
use sha2::{Digest, Sha256};
use utoipa::ToSchema;

use crate::widget::BuildOutput;

struct Entry {
    output: BuildOutput,
    inserted_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub capacity: usize,
}

/// Thread-safe LRU keyed by a digest of the build inputs.
///
/// A capacity of zero disables caching: lookups always miss and inserts are dropped.
pub struct RenderCache {
    inner: Option<Mutex<LruCache<String, Entry>>>,
    capacity: usize,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RenderCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
            capacity,
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn disabled() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// SHA-256 over the function name, the LLM text and the payload JSON.
    ///
    /// Fields are length-prefixed so `("ab", "c")` and `("a", "bc")` differ.
    /// `serde_json::Value` objects are ordered maps, so equal payloads always
    /// serialize identically.
    pub fn key(
        function_name: &str,
        llm_output: Option<&str>,
        backend_output: &serde_json::Value,
    ) -> String {
        let payload = backend_output.to_string();
        let mut hasher = Sha256::new();
        for part in [function_name, llm_output.unwrap_or(""), payload.as_str()] {
            hasher.update((part.len() as u64).to_be_bytes());
            hasher.update(part.as_bytes());
        }
        hasher.update([u8::from(llm_output.is_some())]);
        hex::encode(hasher.finalize())
    }

    pub fn get(&self, key: &str) -> Option<BuildOutput> {
        let Some(inner) = &self.inner else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };
        let mut cache = match inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let fresh = cache
            .peek(key)
            .map(|entry| entry.inserted_at.elapsed() <= self.ttl);
        let found = match fresh {
            Some(true) => cache.get(key).map(|entry| entry.output.clone()),
            Some(false) => {
                cache.pop(key);
                None
            }
            None => None,
        };

        let counter = if found.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    pub fn insert(&self, key: String, output: BuildOutput) {
        let Some(inner) = &self.inner else {
            return;
        };
        let mut cache = match inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        cache.put(
            key,
            Entry {
                output,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self
            .inner
            .as_ref()
            .map(|inner| match inner.lock() {
                Ok(guard) => guard.len(),
                Err(poisoned) => poisoned.into_inner().len(),
            })
            .unwrap_or(0);
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries,
            capacity: self.capacity,
        }
    }
}
