use super::Config;
use crate::error::ConfigError;
use std::collections::HashSet;

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation(message.into())
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history.max_turns == 0 {
            return Err(invalid("history.max_turns must be at least 1"));
        }
        if self.history.max_turn_chars == 0 {
            return Err(invalid("history.max_turn_chars must be at least 1"));
        }
        if self.storage.session_ttl_secs == 0 {
            return Err(invalid("storage.session_ttl_secs must be at least 1"));
        }
        if self.storage.max_sessions == 0 {
            return Err(invalid("storage.max_sessions must be at least 1"));
        }
        if self.storage.max_attempts == 0 {
            return Err(invalid("storage.max_attempts must be at least 1"));
        }
        match self.storage.backend.as_str() {
            "memory" | "none" => {}
            "remote" | "redis" => {
                if self.storage.url.as_deref().is_none_or(|url| url.trim().is_empty()) {
                    return Err(invalid("storage.url is required for the remote backend"));
                }
            }
            other => {
                return Err(invalid(format!(
                    "unknown storage.backend '{other}' (expected remote or memory)"
                )));
            }
        }
        if self.dialogue.max_message_chars == 0 {
            return Err(invalid("dialogue.max_message_chars must be at least 1"));
        }
        if !(0.0..=2.0).contains(&self.dialogue.temperature) {
            return Err(invalid("dialogue.temperature must be within [0, 2]"));
        }
        if self.speech.max_chars == 0 {
            return Err(invalid("speech.max_chars must be at least 1"));
        }

        self.validate_personas()
    }

    fn validate_personas(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for profile in &self.personas.catalog {
            if profile.id.trim().is_empty() {
                return Err(invalid("persona id must not be empty"));
            }
            if !seen.insert(profile.id.as_str()) {
                return Err(invalid(format!("duplicate persona id '{}'", profile.id)));
            }
            for (field, value) in [
                ("stability", profile.stability),
                ("similarity", profile.similarity),
            ] {
                if !(0.0..=1.0).contains(&value) {
                    return Err(invalid(format!(
                        "persona '{}' {field} must be within [0, 1]",
                        profile.id
                    )));
                }
            }
        }

        let catalog = self.personas.build_catalog();
        for (field, id) in [
            ("default_persona", &self.personas.default_persona),
            ("tutor_persona", &self.personas.tutor_persona),
        ] {
            if !catalog.contains(id) {
                return Err(invalid(format!("personas.{field} '{id}' is not in the catalog")));
            }
        }
        Ok(())
    }
}
