use super::Config;

impl Config {
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides read through `lookup`; empty values are ignored.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(url) = var("PARLEY_STORAGE_URL") {
            self.storage.url = Some(url);
            self.storage.backend = "remote".into();
        }

        if let Some(token) = var("PARLEY_STORAGE_TOKEN") {
            self.storage.token = Some(token);
        }

        if let Some(ttl) = var("PARLEY_SESSION_TTL_SECS")
            && let Ok(ttl) = ttl.parse::<u64>()
        {
            self.storage.session_ttl_secs = ttl;
        }

        if let Some(key) = var("PARLEY_DIALOGUE_API_KEY") {
            self.dialogue.api_key = Some(key);
        }

        if let Some(url) = var("PARLEY_DIALOGUE_URL") {
            self.dialogue.base_url = url;
        }

        if let Some(key) = var("PARLEY_SPEECH_API_KEY") {
            self.speech.api_key = Some(key);
        }

        if let Some(url) = var("PARLEY_SPEECH_URL") {
            self.speech.base_url = url;
        }

        if let Some(port) = var("PARLEY_GATEWAY_PORT").or_else(|| var("PORT"))
            && let Ok(port) = port.parse::<u16>()
        {
            self.gateway.port = port;
        }

        if let Some(host) = var("PARLEY_GATEWAY_HOST").or_else(|| var("HOST")) {
            self.gateway.host = host;
        }
    }
}
