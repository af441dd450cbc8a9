pub mod cache;
mod classification;
pub mod deduplication;
mod error;
pub mod rxclass;
mod source;

#[cfg(test)]
mod tests;

use cache::{CacheStats, SharedClassificationCache};
use chrono::Utc;
use deduplication::{FetchOutcome, RequestDeduplicator, SharedRequestDeduplicator};
use futures::future::join_all;
use rxclass::RxClassResponse;
use std::sync::Arc;
use std::time::Duration;

pub use cache::{CacheConfig, ClassificationCache};
pub use classification::{ClassEntry, ClassSource, Classification};
pub use deduplication::{DeduplicationConfig, DeduplicationStats};
pub use error::Error;
pub use error::ErrorKind;
pub use source::{ClassificationSource, RxNavSource, RXCLASS_BY_RXCUI_URL};

/// Settings for talking to the classification service
#[derive(Clone, Debug)]
pub struct ResolverConfig {
    pub base_url: String,
    /// Upper bound for a single lookup
    pub request_timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            base_url: RXCLASS_BY_RXCUI_URL.to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Resolves RxNorm codes to therapeutic classes, cache first
#[derive(Clone)]
pub struct ClassificationResolver {
    source: Arc<dyn ClassificationSource>,
    cache: SharedClassificationCache,
    deduplicator: Option<SharedRequestDeduplicator>,
    request_timeout: Duration,
}

impl ClassificationResolver {
    /// Create a resolver backed by RxNav with default settings
    pub fn new(cache: SharedClassificationCache) -> Self {
        Self::with_config(ResolverConfig::default(), cache)
    }

    pub fn with_config(config: ResolverConfig, cache: SharedClassificationCache) -> Self {
        Self::with_source(
            Arc::new(RxNavSource::new(config.base_url)),
            cache,
            config.request_timeout,
        )
    }

    /// Create a resolver over any classification source
    pub fn with_source(
        source: Arc<dyn ClassificationSource>,
        cache: SharedClassificationCache,
        request_timeout: Duration,
    ) -> Self {
        Self {
            source,
            cache,
            deduplicator: None,
            request_timeout,
        }
    }

    /// Share in-flight lookups of the same code between concurrent callers
    pub fn with_deduplication(mut self, config: DeduplicationConfig) -> Self {
        self.deduplicator = Some(Arc::new(RequestDeduplicator::new(config)));
        self
    }

    /// Resolve every code, keeping input order: `result[i]` belongs to `rxcuis[i]`.
    ///
    /// Cached classifications are served as is; everything else is fetched
    /// concurrently, one request per remaining position. A failed lookup
    /// leaves `None` at its position. Only a dispatch failure fails the call.
    pub async fn resolve_many(
        &self,
        rxcuis: &[String],
    ) -> Result<Vec<Option<Classification>>, Error> {
        let mut results: Vec<Option<Classification>> = vec![None; rxcuis.len()];
        let mut to_fetch = vec![];

        for (index, rxcui) in rxcuis.iter().enumerate() {
            match self.cache.get(rxcui) {
                Some(cached) => results[index] = Some(cached),
                None => to_fetch.push((index, rxcui.as_str())),
            }
        }

        if to_fetch.is_empty() {
            return Ok(results);
        }

        log::info!(
            "Fetching classifications for {} of {} rxcuis",
            to_fetch.len(),
            rxcuis.len()
        );

        let outcomes = join_all(to_fetch.iter().map(|(_, rxcui)| self.fetch_one(rxcui))).await;

        let mut dispatch_error = None;
        for ((index, rxcui), outcome) in to_fetch.into_iter().zip(outcomes) {
            match outcome {
                Ok(response) => {
                    let classification =
                        Classification::from_response(rxcui, &response, Utc::now());
                    self.cache.put(rxcui, classification.clone());
                    results[index] = Some(classification);
                }
                Err(err) if err.is_fatal() => {
                    log::error!("Could not dispatch RxClass lookup: {}", err);
                    dispatch_error.get_or_insert(err);
                }
                Err(err) => {
                    log::warn!("Failed to fetch RxClass data for rxcui {}: {}", rxcui, err);
                }
            }
        }

        match dispatch_error {
            Some(err) => Err(err),
            None => Ok(results),
        }
    }

    async fn fetch_one(&self, rxcui: &str) -> FetchOutcome {
        let fetch = fetch_with_timeout(self.source.as_ref(), rxcui, self.request_timeout);

        match &self.deduplicator {
            Some(deduplicator) => deduplicator
                .execute(rxcui, || fetch)
                .await
                .unwrap_or_else(|err| Err(Error::from_deduplication(rxcui, err))),
            None => fetch.await,
        }
    }

    pub fn cache(&self) -> &SharedClassificationCache {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Get deduplication statistics if deduplication is enabled
    pub fn deduplication_stats(&self) -> Option<DeduplicationStats> {
        self.deduplicator.as_ref().map(|deduplicator| deduplicator.stats())
    }
}

async fn fetch_with_timeout(
    source: &dyn ClassificationSource,
    rxcui: &str,
    timeout: Duration,
) -> Result<RxClassResponse, Error> {
    match tokio::time::timeout(timeout, source.fetch(rxcui)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(Error::timeout(
            rxcui,
            format!("no response within {:?}", timeout),
        )),
    }
}
