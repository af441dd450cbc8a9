use super::config::Config;
use duplicate_detection::DuplicateDetector;
use getset::Getters;
use log::info;
use rxclass_client::{ClassificationCache, ClassificationResolver};
use std::sync::Arc;

#[derive(Getters)]
#[get = "pub"]
pub struct Context {
    detector: DuplicateDetector,
    config: Config,
}

impl Context {
    pub fn new(config: Config) -> Self {
        // One cache for the whole process, handed to the resolver
        let cache = Arc::new(ClassificationCache::new(config.cache_config()));
        let mut resolver = ClassificationResolver::with_config(config.resolver_config(), cache);
        if *config.deduplicate_requests() {
            resolver = resolver.with_deduplication(config.deduplication_config());
        }

        info!(
            "Initialized classification resolver (TTL: {}h, timeout: {}s, deduplication: {})",
            config.cache_ttl_hours(),
            config.request_timeout_secs(),
            config.deduplicate_requests()
        );

        Self {
            detector: DuplicateDetector::new(resolver),
            config,
        }
    }
}
