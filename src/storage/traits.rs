use crate::error::StorageError;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

pub type StorageFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

/// What a successful write did besides storing the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReceipt {
    /// Key removed to stay within a capacity bound, if any.
    pub evicted: Option<String>,
}

/// Key/value store with per-key expiry.
///
/// Implementations must be safe to call concurrently for different keys.
/// Concurrent writes to the same key are last-write-wins.
pub trait KvBackend: Send + Sync {
    /// Backend identifier (e.g. "rest", "memory").
    fn name(&self) -> &str;

    /// Value under `key`, or `None` if absent or expired.
    fn get<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Option<String>>;

    /// Store `value` under `key`; the entry expires `ttl` after this write.
    fn set_with_ttl<'a>(
        &'a self,
        key: &'a str,
        value: &'a str,
        ttl: Duration,
    ) -> StorageFuture<'a, WriteReceipt>;

    /// `Ok(())` when the backend is reachable and answering.
    fn ping(&self) -> StorageFuture<'_, ()>;
}
