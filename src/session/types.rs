use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One role-tagged message. Content is sanitized on the way into history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }
}

const MAX_SESSION_ID_CHARS: usize = 128;

/// Session ids are opaque but must be non-empty, at most 128 chars, and use
/// only `[A-Za-z0-9_.:-]`.
pub fn validate_session_id(session_id: &str) -> Result<(), ValidationError> {
    if session_id.trim().is_empty() {
        return Err(ValidationError::MissingField("sessionId"));
    }
    if session_id.chars().count() > MAX_SESSION_ID_CHARS {
        return Err(ValidationError::InvalidSessionId(format!(
            "longer than {MAX_SESSION_ID_CHARS} characters"
        )));
    }
    if let Some(bad) = session_id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ':' | '.')))
    {
        return Err(ValidationError::InvalidSessionId(format!(
            "unsupported character {bad:?}"
        )));
    }
    Ok(())
}

/// Per-session persona state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub session_id: String,
    pub persona: Option<String>,
    pub student_name: Option<String>,
    pub(crate) created_at: Option<DateTime<Utc>>,
}

impl SessionRecord {
    pub fn new(session_id: impl Into<String>, persona: Option<String>) -> Self {
        Self {
            session_id: session_id.into(),
            persona,
            student_name: None,
            created_at: None,
        }
    }

    /// Store `name` unless one is already set. Returns whether it was stored.
    pub fn capture_student_name(&mut self, name: &str) -> bool {
        if self.student_name.is_some() {
            return false;
        }
        self.student_name = Some(name.to_string());
        true
    }

    /// Back to a fresh session on `default_persona`.
    pub fn reset(&mut self, default_persona: &str) {
        self.persona = Some(default_persona.to_string());
        self.student_name = None;
        self.created_at = None;
    }
}
