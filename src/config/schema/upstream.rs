use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueConfig {
    /// OpenAI-compatible API root, e.g. `https://api.openai.com/v1`.
    #[serde(default = "default_dialogue_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Context identifier sent as the `model` field unless the persona overrides it.
    #[serde(default = "default_bot")]
    pub bot: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,
}

fn default_dialogue_url() -> String {
    "https://api.openai.com/v1".into()
}

fn default_bot() -> String {
    "gpt-4o-mini".into()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_message_chars() -> usize {
    2000
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            base_url: default_dialogue_url(),
            api_key: None,
            bot: default_bot(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            max_message_chars: default_max_message_chars(),
        }
    }
}

impl DialogueConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(default = "default_speech_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model_id")]
    pub model_id: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Longest text accepted for synthesis.
    #[serde(default = "default_speech_max_chars")]
    pub max_chars: usize,
}

fn default_speech_url() -> String {
    "https://api.elevenlabs.io".into()
}

fn default_model_id() -> String {
    "eleven_multilingual_v2".into()
}

fn default_speech_max_chars() -> usize {
    1000
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            base_url: default_speech_url(),
            api_key: None,
            model_id: default_model_id(),
            timeout_secs: default_timeout_secs(),
            max_chars: default_speech_max_chars(),
        }
    }
}

impl SpeechConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
