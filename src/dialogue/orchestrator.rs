//! Per-message dialogue state machine.
//!
//! For every inbound message the orchestrator settles the effective persona,
//! runs the tutor's name-capture flow when it applies, and otherwise hands
//! system context plus history to the dialogue API. History is only touched
//! after a reply exists, so an upstream failure leaves it unchanged.

use super::traits::DialogueClient;
use crate::config::Config;
use crate::error::ParleyError;
use crate::persona::{self, PersonaCatalog, PersonaProfile, prompts};
use crate::session::{
    ChatTurn, DialogueHistory, SessionRecord, SessionStore, validate_session_id,
};
use crate::utils::sanitize_input;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorSettings {
    /// Persona for new sessions and the fallback for unknown ids.
    pub default_persona: String,
    /// Persona that asks for and remembers the student's name.
    pub tutor_persona: String,
    /// Context identifier used when the persona does not set its own.
    pub bot: String,
    pub max_message_chars: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            default_persona: "tutor".into(),
            tutor_persona: "tutor".into(),
            bot: "gpt-4o-mini".into(),
            max_message_chars: 2000,
        }
    }
}

impl OrchestratorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            default_persona: config.personas.default_persona.clone(),
            tutor_persona: config.personas.tutor_persona.clone(),
            bot: config.dialogue.bot.clone(),
            max_message_chars: config.dialogue.max_message_chars,
        }
    }
}

/// Outcome of one `resolve_turn`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnReply {
    pub reply: String,
    pub persona: String,
}

pub struct Orchestrator {
    sessions: SessionStore,
    history: Arc<DialogueHistory>,
    dialogue: Arc<dyn DialogueClient>,
    catalog: Arc<PersonaCatalog>,
    settings: OrchestratorSettings,
}

impl Orchestrator {
    pub fn new(
        sessions: SessionStore,
        history: Arc<DialogueHistory>,
        dialogue: Arc<dyn DialogueClient>,
        catalog: Arc<PersonaCatalog>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            sessions,
            history,
            dialogue,
            catalog,
            settings,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn history(&self) -> &Arc<DialogueHistory> {
        &self.history
    }

    pub fn catalog(&self) -> &Arc<PersonaCatalog> {
        &self.catalog
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Handle one inbound message for `session_id`.
    pub async fn resolve_turn(
        &self,
        session_id: &str,
        raw_text: &str,
    ) -> Result<TurnReply, ParleyError> {
        validate_session_id(session_id)?;
        let message = sanitize_input("message", raw_text, self.settings.max_message_chars)?;

        let mut record = self.load_or_create(session_id).await?;
        let mut active = self.active_persona(&record);

        if let Some(candidate) = persona::resolve(&self.catalog, &message)
            && candidate != active
            && persona::is_switch_request(&message)
        {
            tracing::info!(session_id, from = %active, to = candidate, "persona switch");
            record.persona = Some(candidate.to_string());
            self.persist(&record).await?;
            active = candidate.to_string();
        }

        if active == self.settings.tutor_persona && record.student_name.is_none() {
            let reply = self.tutor_intake(&mut record, &message).await?;
            return Ok(TurnReply {
                reply,
                persona: active,
            });
        }

        let profile = self.profile(&active)?;
        let student_name = if active == self.settings.tutor_persona {
            record.student_name.as_deref()
        } else {
            None
        };
        let bot = profile.bot.as_deref().unwrap_or(&self.settings.bot);

        let mut turns = vec![ChatTurn::system(prompts::system_context(profile, student_name))];
        turns.extend(self.history.read(session_id));
        turns.push(ChatTurn::user(message.clone()));

        let reply = match self.dialogue.complete(bot, &turns).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(
                    session_id,
                    persona = %active,
                    client = self.dialogue.name(),
                    code = e.code(),
                    error = %e,
                    "dialogue request failed"
                );
                return Err(e.into());
            }
        };

        self.history.append(
            session_id,
            [ChatTurn::user(message), ChatTurn::assistant(reply.clone())],
        );
        Ok(TurnReply {
            reply,
            persona: active,
        })
    }

    /// Fresh record on the default persona, with history dropped.
    pub async fn reset_session(&self, session_id: &str) -> Result<SessionRecord, ParleyError> {
        validate_session_id(session_id)?;
        let mut record = SessionRecord::new(session_id, None);
        record.reset(&self.settings.default_persona);
        self.persist(&record).await?;
        self.history.clear(session_id);
        tracing::info!(session_id, "session reset");
        Ok(record)
    }

    /// Canned replies for the tutor before a name is known. Never calls the
    /// dialogue API.
    async fn tutor_intake(
        &self,
        record: &mut SessionRecord,
        message: &str,
    ) -> Result<String, ParleyError> {
        let session_id = record.session_id.clone();

        if self.history.read(&session_id).is_empty() {
            let reply = prompts::TUTOR_WELCOME.to_string();
            self.history
                .append(&session_id, [ChatTurn::assistant(reply.clone())]);
            return Ok(reply);
        }

        let reply = match persona::capture_name(message) {
            Some(name) if record.capture_student_name(&name) => {
                self.persist(record).await?;
                tracing::info!(session_id = %session_id, "student name captured");
                prompts::tutor_greeting(&name)
            }
            _ => prompts::TUTOR_NAME_REREQUEST.to_string(),
        };

        self.history.append(
            &session_id,
            [
                ChatTurn::user(message),
                ChatTurn::assistant(reply.clone()),
            ],
        );
        Ok(reply)
    }

    async fn load_or_create(&self, session_id: &str) -> Result<SessionRecord, ParleyError> {
        if let Some(record) = self.sessions.get(session_id).await {
            return Ok(record);
        }
        let record = SessionRecord::new(session_id, Some(self.settings.default_persona.clone()));
        self.persist(&record).await?;
        // Turns left over from an expired record belong to a conversation
        // that no longer exists.
        if self.history.clear(session_id) {
            tracing::debug!(session_id, "dropped history of expired session");
        }
        tracing::debug!(session_id, persona = %self.settings.default_persona, "session created");
        Ok(record)
    }

    /// Stored persona if the catalog still knows it, else the default.
    fn active_persona(&self, record: &SessionRecord) -> String {
        match record.persona.as_deref() {
            Some(id) if self.catalog.contains(id) => id.to_string(),
            _ => self.settings.default_persona.clone(),
        }
    }

    fn profile(&self, id: &str) -> Result<&PersonaProfile, ParleyError> {
        self.catalog
            .get(id)
            .or_else(|| self.catalog.get(&self.settings.default_persona))
            .ok_or_else(|| {
                anyhow::anyhow!("persona '{id}' and the default persona are missing from the catalog")
                    .into()
            })
    }

    /// Write `record`; if that evicted another session, drop its history too.
    async fn persist(&self, record: &SessionRecord) -> Result<(), ParleyError> {
        if let Some(evicted) = self.sessions.set(record).await?
            && evicted != record.session_id
        {
            self.history.clear(&evicted);
            tracing::info!(
                session_id = %record.session_id,
                evicted = %evicted,
                "session table at capacity; evicted oldest session"
            );
        }
        Ok(())
    }
}
