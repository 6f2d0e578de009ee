use super::types::ChatTurn;
use crate::utils::sanitize_content;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_MAX_TURNS: usize = 12;
pub const DEFAULT_MAX_TURN_CHARS: usize = 1000;

#[derive(Debug)]
struct Thread {
    turns: Vec<ChatTurn>,
    touched_at: Instant,
}

/// Bounded per-session turn log, process-local.
///
/// With an idle ttl, a session whose last append is older than the ttl reads
/// as empty and is dropped by [`DialogueHistory::prune_idle`].
#[derive(Debug)]
pub struct DialogueHistory {
    sessions: Mutex<HashMap<String, Thread>>,
    max_turns: usize,
    max_turn_chars: usize,
    idle_ttl: Option<Duration>,
}

impl Default for DialogueHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TURNS, DEFAULT_MAX_TURN_CHARS)
    }
}

impl DialogueHistory {
    pub fn new(max_turns: usize, max_turn_chars: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            max_turns: max_turns.max(1),
            max_turn_chars: max_turn_chars.max(1),
            idle_ttl: None,
        }
    }

    /// Expire sessions `ttl` after their last append.
    pub fn with_idle_ttl(mut self, ttl: Duration) -> Self {
        self.idle_ttl = Some(ttl);
        self
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    pub fn idle_ttl(&self) -> Option<Duration> {
        self.idle_ttl
    }

    // A panic while holding the lock cannot leave a half-written sequence:
    // every mutation is a single insert/remove.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Thread>> {
        self.sessions
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn is_idle(&self, thread: &Thread, now: Instant) -> bool {
        self.idle_ttl
            .is_some_and(|ttl| now.duration_since(thread.touched_at) >= ttl)
    }

    /// Sanitize `turns`, append them, keep the newest `max_turns`.
    /// Turns that sanitize to nothing are dropped.
    pub fn append(&self, session_id: &str, turns: impl IntoIterator<Item = ChatTurn>) {
        let incoming: Vec<ChatTurn> = turns
            .into_iter()
            .filter_map(|turn| {
                let content = sanitize_content(&turn.content, self.max_turn_chars);
                (!content.is_empty()).then(|| ChatTurn::new(turn.role, content))
            })
            .collect();
        if incoming.is_empty() {
            return;
        }

        let now = Instant::now();
        let mut sessions = self.lock();
        let mut combined = sessions
            .get(session_id)
            .filter(|thread| !self.is_idle(thread, now))
            .map(|thread| thread.turns.clone())
            .unwrap_or_default();
        combined.extend(incoming);
        let overflow = combined.len().saturating_sub(self.max_turns);
        combined.drain(..overflow);
        sessions.insert(
            session_id.to_string(),
            Thread {
                turns: combined,
                touched_at: now,
            },
        );
    }

    /// Current turns, oldest first; empty when the session has none.
    pub fn read(&self, session_id: &str) -> Vec<ChatTurn> {
        let now = Instant::now();
        self.lock()
            .get(session_id)
            .filter(|thread| !self.is_idle(thread, now))
            .map(|thread| thread.turns.clone())
            .unwrap_or_default()
    }

    pub fn clear(&self, session_id: &str) -> bool {
        self.lock().remove(session_id).is_some()
    }

    /// Raw session count, including idle sessions not yet pruned.
    pub fn session_count(&self) -> usize {
        self.lock().len()
    }

    /// Drop every idle session; returns how many were removed.
    pub fn prune_idle(&self) -> usize {
        if self.idle_ttl.is_none() {
            return 0;
        }
        let now = Instant::now();
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, thread| !self.is_idle(thread, now));
        before - sessions.len()
    }

    /// Prune idle sessions every `interval` until the history is dropped.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn_idle_sweeper(self: &Arc<Self>, interval: Duration) {
        let history = Arc::downgrade(self);
        let interval = interval.max(Duration::from_millis(1));
        let first_tick = Instant::now() + interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(first_tick, interval);
            loop {
                ticker.tick().await;
                let Some(history) = history.upgrade() else {
                    break;
                };
                let removed = history.prune_idle();
                if removed > 0 {
                    tracing::debug!(removed, "history sweep removed idle sessions");
                }
            }
        });
    }
}
