use crate::classification::Classification;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Configuration for the classification cache
#[derive(Clone, Debug)]
pub struct CacheConfig {
    /// How long a resolved classification stays usable
    pub ttl: Duration,
    /// Whether caching is enabled
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::hours(24),
            enabled: true,
        }
    }
}

impl CacheConfig {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, enabled: true }
    }
}

/// In-memory classification store keyed by RxNorm code.
///
/// Entries are never evicted proactively: an expired entry is dropped the
/// next time it is read. Callers get clones, the cache keeps ownership.
pub struct ClassificationCache {
    cache: DashMap<String, Classification>,
    pub config: CacheConfig,
}

impl Default for ClassificationCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl ClassificationCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            cache: DashMap::new(),
            config,
        }
    }

    /// Get the classification for `rxcui` if present and not expired
    pub fn get(&self, rxcui: &str) -> Option<Classification> {
        self.get_at(rxcui, Utc::now())
    }

    /// Same as [`get`](Self::get) with an explicit reading time
    pub fn get_at(&self, rxcui: &str, now: DateTime<Utc>) -> Option<Classification> {
        if !self.config.enabled {
            return None;
        }

        // Clone out first so no shard guard is held while removing
        let cached = self.cache.get(rxcui).map(|entry| entry.value().clone());

        match cached {
            Some(classification) if !self.is_expired_at(&classification, now) => {
                log::debug!("Cache hit for rxcui: {}", rxcui);
                Some(classification)
            }
            Some(_) => {
                log::debug!("Cache expired for rxcui: {}", rxcui);
                self.cache
                    .remove_if(rxcui, |_, stored| self.is_expired_at(stored, now));
                None
            }
            None => {
                log::debug!("Cache miss for rxcui: {}", rxcui);
                None
            }
        }
    }

    /// Store a classification, replacing whatever was cached for `rxcui`
    pub fn put(&self, rxcui: &str, classification: Classification) {
        if !self.config.enabled {
            return;
        }

        self.cache.insert(rxcui.to_string(), classification);
        log::debug!("Stored classification for rxcui: {}", rxcui);
    }

    pub fn is_expired(&self, classification: &Classification) -> bool {
        self.is_expired_at(classification, Utc::now())
    }

    /// A classification resolved at T0 is expired from T0 + TTL onwards.
    /// A TTL reaching past the representable range never expires.
    pub fn is_expired_at(&self, classification: &Classification, now: DateTime<Utc>) -> bool {
        classification
            .resolved_at()
            .checked_add_signed(self.config.ttl)
            .map_or(false, |expires_at| now >= expires_at)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Clear all cache entries
    pub fn clear(&self) {
        self.cache.clear();
        log::info!("Classification cache cleared");
    }

    pub fn stats(&self) -> CacheStats {
        let now = Utc::now();
        let total_entries = self.cache.len();
        let expired_entries = self
            .cache
            .iter()
            .filter(|entry| self.is_expired_at(entry.value(), now))
            .count();

        CacheStats {
            total_entries,
            valid_entries: total_entries - expired_entries,
            expired_entries,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
}

/// Thread-safe handle shared between resolvers
pub type SharedClassificationCache = Arc<ClassificationCache>;
