use super::client::{SpeechClient, SpeechRequest, SynthesizedAudio};
use crate::error::ParleyError;
use crate::persona::PersonaCatalog;
use crate::session::{SessionStore, validate_session_id};
use crate::utils::sanitize_input;
use std::sync::Arc;

/// Speaks text in the voice of the session's current persona.
///
/// Read-only with respect to session state: an unknown session is voiced by
/// the default persona and nothing is created.
pub struct SpeechService {
    sessions: SessionStore,
    client: Arc<dyn SpeechClient>,
    catalog: Arc<PersonaCatalog>,
    default_persona: String,
    max_chars: usize,
}

impl SpeechService {
    pub fn new(
        sessions: SessionStore,
        client: Arc<dyn SpeechClient>,
        catalog: Arc<PersonaCatalog>,
        default_persona: impl Into<String>,
        max_chars: usize,
    ) -> Self {
        Self {
            sessions,
            client,
            catalog,
            default_persona: default_persona.into(),
            max_chars,
        }
    }

    pub async fn synthesize_speech(
        &self,
        session_id: &str,
        text: &str,
    ) -> Result<SynthesizedAudio, ParleyError> {
        validate_session_id(session_id)?;
        let text = sanitize_input("text", text, self.max_chars)?;

        let persona = self
            .sessions
            .get(session_id)
            .await
            .and_then(|record| record.persona)
            .filter(|id| self.catalog.contains(id))
            .unwrap_or_else(|| self.default_persona.clone());
        let profile = self
            .catalog
            .get(&persona)
            .or_else(|| self.catalog.get(&self.default_persona))
            .ok_or_else(|| anyhow::anyhow!("no voice configured for persona '{persona}'"))?;

        let request = SpeechRequest {
            text,
            voice_id: profile.voice_id.clone(),
            stability: profile.stability,
            similarity: profile.similarity,
        };

        self.client.synthesize(&request).await.map_err(|e| {
            tracing::error!(
                session_id,
                persona = %persona,
                client = self.client.name(),
                code = e.code(),
                error = %e,
                "speech synthesis failed"
            );
            e.into()
        })
    }
}
