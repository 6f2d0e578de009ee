use crate::persona::{PersonaCatalog, PersonaProfile};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Turns kept per session, newest last.
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
    #[serde(default = "default_max_turn_chars")]
    pub max_turn_chars: usize,
}

fn default_max_turns() -> usize {
    12
}

fn default_max_turn_chars() -> usize {
    1000
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            max_turn_chars: default_max_turn_chars(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonasConfig {
    /// Persona given to new sessions.
    #[serde(default = "default_tutor")]
    pub default_persona: String,
    /// Persona that runs the name-capture flow.
    #[serde(default = "default_tutor")]
    pub tutor_persona: String,
    /// Custom catalog; the built-in personas are used when empty.
    #[serde(default)]
    pub catalog: Vec<PersonaProfile>,
}

fn default_tutor() -> String {
    "tutor".into()
}

impl Default for PersonasConfig {
    fn default() -> Self {
        Self {
            default_persona: default_tutor(),
            tutor_persona: default_tutor(),
            catalog: Vec::new(),
        }
    }
}

impl PersonasConfig {
    pub fn build_catalog(&self) -> PersonaCatalog {
        if self.catalog.is_empty() {
            PersonaCatalog::builtin()
        } else {
            PersonaCatalog::new(self.catalog.clone())
        }
    }
}
