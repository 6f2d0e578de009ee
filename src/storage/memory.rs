//! Process-local key/value store with per-entry expiry.
//!
//! Expiry is enforced three ways:
//! - each write schedules a one-shot deletion `ttl` after the write;
//! - a background sweep removes entries older than their ttl every interval;
//! - reads treat an entry past its ttl as absent even if neither has fired yet.
//!
//! Each entry owns at most one pending deletion. A write to an existing key
//! aborts the old timer, schedules a new one and bumps the entry generation,
//! so a timer that already fired leaves the fresh value alone. The entry keeps
//! its original insertion position, which is what capacity eviction uses.

use super::traits::{KvBackend, StorageFuture, WriteReceipt};
use crate::error::StorageError;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

struct Entry {
    value: String,
    written_at: Instant,
    ttl: Duration,
    generation: u64,
    insertion: u64,
    timer: Option<AbortHandle>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.written_at) >= self.ttl
    }
}

#[derive(Default)]
struct Table {
    entries: HashMap<String, Entry>,
    /// Insertion sequence -> key, oldest first.
    insertion_order: BTreeMap<u64, String>,
    next_insertion: u64,
    next_generation: u64,
}

impl Table {
    /// Remove without touching the entry's timer.
    fn detach(&mut self, key: &str) -> Option<Entry> {
        let entry = self.entries.remove(key)?;
        self.insertion_order.remove(&entry.insertion);
        Some(entry)
    }

    fn remove(&mut self, key: &str) -> Option<Entry> {
        let entry = self.detach(key)?;
        if let Some(timer) = &entry.timer {
            timer.abort();
        }
        Some(entry)
    }

    fn pop_oldest(&mut self) -> Option<String> {
        let key = self.insertion_order.first_key_value()?.1.clone();
        self.remove(&key);
        Some(key)
    }

    fn remove_expired(&mut self, now: Instant) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            self.remove(key);
        }
        expired.len()
    }
}

fn lock_table(table: &Mutex<Table>) -> Result<MutexGuard<'_, Table>, StorageError> {
    table
        .lock()
        .map_err(|error| StorageError::Lock(error.to_string()))
}

/// In-process backend used directly or as the fallback of [`FailoverKv`](super::FailoverKv).
pub struct InProcessKv {
    table: Arc<Mutex<Table>>,
    max_entries: Option<usize>,
    shutdown: CancellationToken,
}

impl InProcessKv {
    /// Create the store and start its sweep task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(max_entries: Option<usize>, sweep_interval: Duration) -> Self {
        let table = Arc::new(Mutex::new(Table::default()));
        let shutdown = CancellationToken::new();
        spawn_sweeper(Arc::downgrade(&table), sweep_interval, shutdown.clone());
        Self {
            table,
            max_entries: max_entries.map(|max| max.max(1)),
            shutdown,
        }
    }

    pub fn max_entries(&self) -> Option<usize> {
        self.max_entries
    }

    pub fn lookup(&self, key: &str) -> Result<Option<String>, StorageError> {
        let table = lock_table(&self.table)?;
        let now = Instant::now();
        Ok(table
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value.clone()))
    }

    pub fn insert(&self, key: &str, value: &str, ttl: Duration) -> Result<WriteReceipt, StorageError> {
        let mut table = lock_table(&self.table)?;
        let now = Instant::now();
        table.next_generation += 1;
        let generation = table.next_generation;
        let mut receipt = WriteReceipt::default();
        let timer = self.schedule_expiry(key.to_string(), generation, ttl);

        if let Some(existing) = table.entries.get_mut(key) {
            existing.value = value.to_string();
            existing.written_at = now;
            existing.ttl = ttl;
            existing.generation = generation;
            if let Some(previous) = existing.timer.replace(timer) {
                previous.abort();
            }
        } else {
            if let Some(max) = self.max_entries
                && table.entries.len() >= max
            {
                receipt.evicted = table.pop_oldest();
                if let Some(evicted) = &receipt.evicted {
                    tracing::info!(evicted = evicted.as_str(), max, "in-process store at capacity, evicted oldest key");
                }
            }
            let insertion = table.next_insertion;
            table.next_insertion += 1;
            table.insertion_order.insert(insertion, key.to_string());
            table.entries.insert(
                key.to_string(),
                Entry {
                    value: value.to_string(),
                    written_at: now,
                    ttl,
                    generation,
                    insertion,
                    timer: Some(timer),
                },
            );
        }
        Ok(receipt)
    }

    /// Remove every entry older than its ttl; returns how many were removed.
    pub fn sweep_expired(&self) -> Result<usize, StorageError> {
        Ok(lock_table(&self.table)?.remove_expired(Instant::now()))
    }

    /// Raw entry count, including entries that expired but were not yet removed.
    pub fn len(&self) -> usize {
        lock_table(&self.table).map_or(0, |table| table.entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys in insertion order, oldest first.
    pub fn keys(&self) -> Vec<String> {
        lock_table(&self.table).map_or_else(
            |_| Vec::new(),
            |table| table.insertion_order.values().cloned().collect(),
        )
    }

    /// Stop the sweep task and every pending expiry timer.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    #[cfg(test)]
    fn pending_timer(&self, key: &str) -> Option<AbortHandle> {
        lock_table(&self.table)
            .ok()?
            .entries
            .get(key)
            .and_then(|entry| entry.timer.clone())
    }

    fn schedule_expiry(&self, key: String, generation: u64, ttl: Duration) -> AbortHandle {
        let table = Arc::downgrade(&self.table);
        let shutdown = self.shutdown.clone();
        let deadline = Instant::now() + ttl;
        let handle = tokio::spawn(async move {
            tokio::select! {
                () = shutdown.cancelled() => {}
                () = tokio::time::sleep_until(deadline) => {
                    let Some(table) = table.upgrade() else {
                        return;
                    };
                    let Ok(mut table) = table.lock() else {
                        return;
                    };
                    if table
                        .entries
                        .get(&key)
                        .is_some_and(|entry| entry.generation == generation)
                    {
                        table.detach(&key);
                        tracing::debug!(key = key.as_str(), "in-process entry expired");
                    }
                }
            }
        });
        handle.abort_handle()
    }
}

impl Drop for InProcessKv {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn spawn_sweeper(table: Weak<Mutex<Table>>, interval: Duration, shutdown: CancellationToken) {
    let interval = interval.max(Duration::from_millis(1));
    let first_tick = Instant::now() + interval;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(first_tick, interval);
        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let Some(table) = table.upgrade() else {
                        break;
                    };
                    let removed = match table.lock() {
                        Ok(mut table) => table.remove_expired(Instant::now()),
                        Err(_) => break,
                    };
                    if removed > 0 {
                        tracing::debug!(removed, "in-process sweep removed expired entries");
                    }
                }
            }
        }
    });
}

impl KvBackend for InProcessKv {
    fn name(&self) -> &str {
        "memory"
    }

    fn get<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Option<String>> {
        Box::pin(async move { self.lookup(key) })
    }

    fn set_with_ttl<'a>(
        &'a self,
        key: &'a str,
        value: &'a str,
        ttl: Duration,
    ) -> StorageFuture<'a, WriteReceipt> {
        Box::pin(async move { self.insert(key, value, ttl) })
    }

    fn ping(&self) -> StorageFuture<'_, ()> {
        Box::pin(async move { lock_table(&self.table).map(|_| ()) })
    }
}
