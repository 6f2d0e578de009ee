use super::memory::InProcessKv;
use super::traits::{KvBackend, StorageFuture, WriteReceipt};
use crate::error::StorageError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 64;

/// Bounded retry with capped exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(3),
        }
    }
}

impl RetryPolicy {
    /// Pause before the attempt following `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_backoff
            .checked_mul(factor)
            .map_or(self.max_backoff, |delay| delay.min(self.max_backoff))
    }
}

/// Observable storage state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageEvent {
    Written { backend: String, key: String },
    Evicted { key: String },
    Demoted { from: String, reason: String },
}

/// Storage handle used by the rest of the application.
///
/// Operations go to the networked backend while it is healthy. Once an
/// operation exhausts its retries (or the startup ping fails) the handle
/// demotes itself to the in-process store for the rest of the process
/// lifetime and replays the failing operation there.
pub struct FailoverKv {
    primary: Option<Arc<dyn KvBackend>>,
    local: Arc<InProcessKv>,
    demoted: AtomicBool,
    policy: RetryPolicy,
    events: broadcast::Sender<StorageEvent>,
}

impl FailoverKv {
    /// In-process storage only; there is nothing to demote from.
    pub fn local_only(local: Arc<InProcessKv>) -> Self {
        Self::build(None, local, RetryPolicy::default(), false)
    }

    /// Networked storage in front of `local`, without a startup check.
    pub fn with_primary(
        primary: Arc<dyn KvBackend>,
        local: Arc<InProcessKv>,
        policy: RetryPolicy,
    ) -> Self {
        Self::build(Some(primary), local, policy, false)
    }

    /// Like [`FailoverKv::with_primary`], but pings the networked backend
    /// first and starts demoted when it never answers.
    pub async fn connect(
        primary: Arc<dyn KvBackend>,
        local: Arc<InProcessKv>,
        policy: RetryPolicy,
    ) -> Self {
        let kv = Self::with_primary(primary, local, policy);
        if let Some(primary) = kv.primary.as_deref() {
            match kv.retrying(primary.name(), "ping", "", || primary.ping()).await {
                Ok(()) => tracing::info!(backend = primary.name(), "storage backend connected"),
                Err(e) => kv.demote(primary.name(), &e),
            }
        }
        kv
    }

    fn build(
        primary: Option<Arc<dyn KvBackend>>,
        local: Arc<InProcessKv>,
        policy: RetryPolicy,
        demoted: bool,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            primary,
            local,
            demoted: AtomicBool::new(demoted),
            policy: RetryPolicy {
                max_attempts: policy.max_attempts.max(1),
                ..policy
            },
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }

    pub fn is_demoted(&self) -> bool {
        self.demoted.load(Ordering::SeqCst)
    }

    /// Name of the backend currently serving operations.
    pub fn active_backend(&self) -> &str {
        self.active_primary()
            .map_or_else(|| self.local.name(), |primary| primary.name())
    }

    pub fn local(&self) -> &Arc<InProcessKv> {
        &self.local
    }

    fn active_primary(&self) -> Option<&dyn KvBackend> {
        if self.is_demoted() {
            return None;
        }
        self.primary.as_deref()
    }

    fn demote(&self, from: &str, error: &StorageError) {
        if self.demoted.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::warn!(
            from,
            error = %error,
            "storage demoted to in-process backend for the rest of this process"
        );
        let _ = self.events.send(StorageEvent::Demoted {
            from: from.to_string(),
            reason: error.to_string(),
        });
    }

    fn emit(&self, event: StorageEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    async fn retrying<'a, T>(
        &self,
        backend: &str,
        op: &'static str,
        key: &str,
        mut call: impl FnMut() -> StorageFuture<'a, T>,
    ) -> Result<T, StorageError> {
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(backend, op, key, attempt, "storage recovered after retries");
                    }
                    return Ok(value);
                }
                Err(e) if !e.is_retryable() || attempt >= self.policy.max_attempts => {
                    return Err(e);
                }
                Err(e) => {
                    let delay = self.policy.delay_after(attempt);
                    tracing::warn!(
                        backend,
                        op,
                        key,
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        backoff_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "storage operation failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    fn record_write(&self, backend: &str, key: &str, receipt: &WriteReceipt) {
        tracing::debug!(backend, key, "session written");
        self.emit(StorageEvent::Written {
            backend: backend.to_string(),
            key: key.to_string(),
        });
        if let Some(evicted) = &receipt.evicted {
            self.emit(StorageEvent::Evicted {
                key: evicted.clone(),
            });
        }
    }
}

impl KvBackend for FailoverKv {
    fn name(&self) -> &str {
        "failover"
    }

    fn get<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Option<String>> {
        Box::pin(async move {
            if let Some(primary) = self.active_primary() {
                match self
                    .retrying(primary.name(), "get", key, || primary.get(key))
                    .await
                {
                    Ok(value) => return Ok(value),
                    Err(e) if e.is_retryable() => self.demote(primary.name(), &e),
                    Err(e) => return Err(e),
                }
            }
            self.local.get(key).await
        })
    }

    fn set_with_ttl<'a>(
        &'a self,
        key: &'a str,
        value: &'a str,
        ttl: Duration,
    ) -> StorageFuture<'a, WriteReceipt> {
        Box::pin(async move {
            if let Some(primary) = self.active_primary() {
                match self
                    .retrying(primary.name(), "set", key, || {
                        primary.set_with_ttl(key, value, ttl)
                    })
                    .await
                {
                    Ok(receipt) => {
                        self.record_write(primary.name(), key, &receipt);
                        return Ok(receipt);
                    }
                    Err(e) if e.is_retryable() => self.demote(primary.name(), &e),
                    Err(e) => return Err(e),
                }
            }
            let receipt = self.local.set_with_ttl(key, value, ttl).await?;
            self.record_write(self.local.name(), key, &receipt);
            Ok(receipt)
        })
    }

    /// Single probe of the active backend; never demotes.
    fn ping(&self) -> StorageFuture<'_, ()> {
        Box::pin(async move {
            match self.active_primary() {
                Some(primary) => primary.ping().await,
                None => self.local.ping().await,
            }
        })
    }
}
