use crate::error::Error;
use crate::rxclass::RxClassResponse;
use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::Future;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio::sync::oneshot;

/// Result of one RxClass lookup, shared with every waiter of that lookup
pub type FetchOutcome = Result<RxClassResponse, Error>;

/// Configuration for request deduplication
#[derive(Clone, Debug)]
pub struct DeduplicationConfig {
    /// How long a waiter sits on a pending request before giving up
    pub request_timeout: Duration,
    /// Whether deduplication is enabled
    pub enabled: bool,
}

impl Default for DeduplicationConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::seconds(30),
            enabled: false,
        }
    }
}

impl DeduplicationConfig {
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }
}

type PendingMap = DashMap<String, (DateTime<Utc>, Vec<oneshot::Sender<FetchOutcome>>)>;

enum Role {
    Leader(DateTime<Utc>),
    Follower(oneshot::Receiver<FetchOutcome>),
}

/// The pending entry owned by the caller running the fetch.
/// Dropped without `complete` (the caller was cancelled), it releases the
/// entry so waiters see `SenderDropped` and the next caller fetches afresh.
struct PendingFetch<'a> {
    pending: &'a PendingMap,
    rxcui: &'a str,
    started: DateTime<Utc>,
    finished: bool,
}

impl PendingFetch<'_> {
    /// Remove the entry only if it is still ours; an expired entry may have
    /// been replaced by a newer leader
    fn take_waiters(&self) -> Vec<oneshot::Sender<FetchOutcome>> {
        self.pending
            .remove_if(self.rxcui, |_, (started, _)| *started == self.started)
            .map(|(_, (_, waiters))| waiters)
            .unwrap_or_default()
    }

    fn complete(mut self, outcome: &FetchOutcome) {
        self.finished = true;
        let waiters = self.take_waiters();
        if !waiters.is_empty() {
            log::debug!("Notifying {} waiters for rxcui: {}", waiters.len(), self.rxcui);
        }
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
    }
}

impl Drop for PendingFetch<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let waiters = self.take_waiters();
        log::debug!(
            "Request for rxcui {} abandoned, releasing {} waiters",
            self.rxcui,
            waiters.len()
        );
    }
}

/// Coalesces concurrent lookups of the same RxNorm code.
/// The first caller performs the fetch, later callers wait for its outcome.
pub struct RequestDeduplicator {
    pending: PendingMap,
    config: DeduplicationConfig,
}

impl RequestDeduplicator {
    pub fn new(config: DeduplicationConfig) -> Self {
        Self {
            pending: DashMap::new(),
            config,
        }
    }

    /// Run `fetch` for `rxcui` unless a fetch for it is already in flight,
    /// in which case wait for that one instead
    pub async fn execute<F, Fut>(
        &self,
        rxcui: &str,
        fetch: F,
    ) -> Result<FetchOutcome, DeduplicationError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FetchOutcome>,
    {
        if !self.config.enabled {
            return Ok(fetch().await);
        }

        self.cleanup_expired();

        let role = match self.pending.entry(rxcui.to_string()) {
            Entry::Occupied(mut entry) => {
                log::debug!("Request already pending for rxcui: {}", rxcui);
                let (tx, rx) = oneshot::channel();
                entry.get_mut().1.push(tx);
                Role::Follower(rx)
            }
            Entry::Vacant(entry) => {
                let started = Utc::now();
                entry.insert((started, Vec::new()));
                Role::Leader(started)
            }
        };

        let started = match role {
            Role::Leader(started) => started,
            Role::Follower(rx) => return self.wait_for(rxcui, rx).await,
        };

        let guard = PendingFetch {
            pending: &self.pending,
            rxcui,
            started,
            finished: false,
        };

        log::debug!("Executing new request for rxcui: {}", rxcui);
        let outcome = fetch().await;
        guard.complete(&outcome);

        Ok(outcome)
    }

    async fn wait_for(
        &self,
        rxcui: &str,
        rx: oneshot::Receiver<FetchOutcome>,
    ) -> Result<FetchOutcome, DeduplicationError> {
        let wait = self.config.request_timeout.to_std().unwrap_or(StdDuration::ZERO);
        match tokio::time::timeout(wait, rx).await {
            Ok(Ok(outcome)) => {
                log::debug!("Received deduplicated result for rxcui: {}", rxcui);
                Ok(outcome)
            }
            Ok(Err(_)) => {
                log::warn!("Sender dropped for rxcui: {}", rxcui);
                Err(DeduplicationError::SenderDropped)
            }
            Err(_) => {
                log::warn!("Request timeout for rxcui: {}", rxcui);
                Err(DeduplicationError::Timeout)
            }
        }
    }

    /// Drop pending requests older than the timeout; their waiters see `SenderDropped`
    fn cleanup_expired(&self) {
        let now = Utc::now();
        let before = self.pending.len();
        self.pending
            .retain(|_, (started, _)| now - *started <= self.config.request_timeout);

        let removed = before.saturating_sub(self.pending.len());
        if removed > 0 {
            log::debug!("Cleaned up {} expired pending requests", removed);
        }
    }

    pub fn stats(&self) -> DeduplicationStats {
        let pending_requests = self.pending.len();
        let total_waiters = self.pending.iter().map(|entry| entry.value().1.len()).sum();

        DeduplicationStats {
            pending_requests,
            total_waiters,
        }
    }

    pub fn clear(&self) {
        self.pending.clear();
        log::info!("Request deduplicator cleared");
    }
}

/// Statistics for request deduplication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeduplicationStats {
    pub pending_requests: usize,
    pub total_waiters: usize,
}

/// Errors that can occur while waiting on a deduplicated request
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeduplicationError {
    #[error("Request timed out")]
    Timeout,
    #[error("Sender was dropped")]
    SenderDropped,
}

/// Thread-safe wrapper for the deduplicator
pub type SharedRequestDeduplicator = Arc<RequestDeduplicator>;
