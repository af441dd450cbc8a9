use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use getset::Getters;
use log::LevelFilter;
use rxclass_client::{CacheConfig, DeduplicationConfig, ResolverConfig, RXCLASS_BY_RXCUI_URL};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub const CONFIG_FILE: &str = "dup-checker.yaml";
pub const ENV_PREFIX: &str = "DUP_CHECKER_";
/// Ten years; anything longer is as good as never expiring
pub const MAX_CACHE_TTL_HOURS: i64 = 24 * 365 * 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not load configuration: {0}")]
    Figment(#[from] figment::Error),
    #[error("invalid log level '{0}'")]
    LogLevel(String),
    #[error("cache_ttl_hours must be between 0 and {max}, got {0}", max = MAX_CACHE_TTL_HOURS)]
    CacheTtl(i64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
#[get = "pub"]
pub struct Config {
    rxclass_url: String,
    request_timeout_secs: u64,
    cache_ttl_hours: i64,
    deduplicate_requests: bool,
    log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rxclass_url: RXCLASS_BY_RXCUI_URL.to_string(),
            request_timeout_secs: 10,
            cache_ttl_hours: 24,
            deduplicate_requests: false,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Defaults, then `dup-checker.yaml`, then `DUP_CHECKER_*` variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()?;

        config.level_filter()?;
        config.cache_ttl()?;
        Ok(config)
    }

    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        LevelFilter::from_str(&self.log_level)
            .map_err(|_| ConfigError::LogLevel(self.log_level.clone()))
    }

    pub fn cache_ttl(&self) -> Result<chrono::Duration, ConfigError> {
        if !(0..=MAX_CACHE_TTL_HOURS).contains(&self.cache_ttl_hours) {
            return Err(ConfigError::CacheTtl(self.cache_ttl_hours));
        }
        chrono::Duration::try_hours(self.cache_ttl_hours)
            .ok_or(ConfigError::CacheTtl(self.cache_ttl_hours))
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            base_url: self.rxclass_url.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn cache_config(&self) -> CacheConfig {
        let ttl = self.cache_ttl().unwrap_or_else(|_| {
            log::warn!(
                "cache_ttl_hours {} out of range, capping at {}",
                self.cache_ttl_hours,
                MAX_CACHE_TTL_HOURS
            );
            chrono::Duration::hours(MAX_CACHE_TTL_HOURS)
        });
        CacheConfig::new(ttl)
    }

    pub fn deduplication_config(&self) -> DeduplicationConfig {
        DeduplicationConfig {
            enabled: self.deduplicate_requests,
            ..DeduplicationConfig::default()
        }
    }
}
