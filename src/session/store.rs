use super::types::SessionRecord;
use crate::error::StorageError;
use crate::storage::KvBackend;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const KEY_PREFIX: &str = "session:";

pub fn session_key(session_id: &str) -> String {
    format!("{KEY_PREFIX}{session_id}")
}

/// JSON value stored under `session:{id}`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSession {
    #[serde(default)]
    persona: Option<String>,
    #[serde(default)]
    student_name: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    last_touched_at: Option<DateTime<Utc>>,
}

/// Session records on top of a [`KvBackend`].
///
/// Reads fail open: a storage error or an unreadable value is logged and
/// treated as "no session". Writes fail closed. Every write restarts the
/// TTL; reads never extend it.
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn KvBackend>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn KvBackend>, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get(&self, session_id: &str) -> Option<SessionRecord> {
        match self.try_get(session_id).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(
                    session_id,
                    backend = self.backend.name(),
                    error = %e,
                    "session read failed; treating as new session"
                );
                None
            }
        }
    }

    /// Like [`SessionStore::get`] but surfaces storage and decode errors.
    pub async fn try_get(&self, session_id: &str) -> Result<Option<SessionRecord>, StorageError> {
        let key = session_key(session_id);
        let Some(raw) = self.backend.get(&key).await? else {
            return Ok(None);
        };
        let stored: StoredSession =
            serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt {
                key: key.clone(),
                message: e.to_string(),
            })?;
        Ok(Some(SessionRecord {
            session_id: session_id.to_string(),
            persona: stored.persona,
            student_name: stored.student_name,
            created_at: stored.created_at,
        }))
    }

    /// Persist `record` with a fresh TTL. Returns the id of a session evicted
    /// to make room, if any.
    pub async fn set(&self, record: &SessionRecord) -> Result<Option<String>, StorageError> {
        let key = session_key(&record.session_id);
        let now = Utc::now();
        let stored = StoredSession {
            persona: record.persona.clone(),
            student_name: record.student_name.clone(),
            created_at: Some(record.created_at.unwrap_or(now)),
            last_touched_at: Some(now),
        };
        let value = serde_json::to_string(&stored).map_err(|e| StorageError::Corrupt {
            key: key.clone(),
            message: e.to_string(),
        })?;

        let receipt = self.backend.set_with_ttl(&key, &value, self.ttl).await?;
        Ok(receipt
            .evicted
            .map(|evicted| match evicted.strip_prefix(KEY_PREFIX) {
                Some(id) => id.to_string(),
                None => evicted,
            }))
    }
}
