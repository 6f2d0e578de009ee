use crate::config::Config;
use crate::dialogue::{OpenAiCompatibleDialogue, Orchestrator, OrchestratorSettings};
use crate::gateway::AppState;
use crate::persona::PersonaCatalog;
use crate::session::{DialogueHistory, SessionStore};
use crate::speech::{HttpSpeechClient, SpeechService};
use crate::storage::{FailoverKv, create_backend};
use anyhow::Result;
use std::sync::Arc;

/// Everything a request needs, wired once from config.
pub struct Services {
    pub storage: Arc<FailoverKv>,
    pub catalog: Arc<PersonaCatalog>,
    pub orchestrator: Arc<Orchestrator>,
    pub speech: Arc<SpeechService>,
}

impl Services {
    pub async fn from_config(config: &Config) -> Result<Self> {
        if config.dialogue.api_key.is_none() {
            tracing::warn!("dialogue.api_key is not set; upstream calls will be unauthenticated");
        }
        if config.speech.api_key.is_none() {
            tracing::warn!("speech.api_key is not set; upstream calls will be unauthenticated");
        }

        let storage = create_backend(&config.storage).await?;
        let sessions = SessionStore::new(storage.clone(), config.storage.session_ttl());
        let history = Arc::new(
            DialogueHistory::new(config.history.max_turns, config.history.max_turn_chars)
                .with_idle_ttl(config.storage.session_ttl()),
        );
        history.spawn_idle_sweeper(config.storage.sweep_interval());
        let catalog = Arc::new(config.personas.build_catalog());

        let orchestrator = Orchestrator::new(
            sessions.clone(),
            history,
            Arc::new(OpenAiCompatibleDialogue::from_config(&config.dialogue)),
            catalog.clone(),
            OrchestratorSettings::from_config(config),
        );
        let speech = SpeechService::new(
            sessions,
            Arc::new(HttpSpeechClient::from_config(&config.speech)?),
            catalog.clone(),
            config.personas.default_persona.clone(),
            config.speech.max_chars,
        );

        Ok(Self {
            storage,
            catalog,
            orchestrator: Arc::new(orchestrator),
            speech: Arc::new(speech),
        })
    }

    pub fn app_state(&self) -> AppState {
        AppState {
            orchestrator: Arc::clone(&self.orchestrator),
            speech: Arc::clone(&self.speech),
            storage: Arc::clone(&self.storage),
        }
    }
}
