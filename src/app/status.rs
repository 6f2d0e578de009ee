use crate::config::Config;

/// Storage probe results shown next to the config summary.
pub struct StorageHealth {
    pub backend: String,
    pub demoted: bool,
    pub healthy: bool,
}

pub fn render_status(config: &Config, storage: &StorageHealth) -> String {
    let personas = config.personas.build_catalog();
    let mut lines = vec![
        "◆ Parley status".to_string(),
        String::new(),
        format!("Version     {}", env!("CARGO_PKG_VERSION")),
        format!("Config      {}", config.config_path.display()),
        String::new(),
        format!(
            "  Gateway      {}:{}",
            config.gateway.host, config.gateway.port
        ),
        format!(
            "  Dialogue     {} (bot {})",
            config.dialogue.base_url, config.dialogue.bot
        ),
        format!(
            "   api key     {}",
            if config.dialogue.api_key.is_some() {
                "set"
            } else {
                "missing"
            }
        ),
        format!(
            "  Speech       {} (model {})",
            config.speech.base_url, config.speech.model_id
        ),
        format!(
            "   api key     {}",
            if config.speech.api_key.is_some() {
                "set"
            } else {
                "missing"
            }
        ),
        format!("  Personas     {}", personas.ids().collect::<Vec<_>>().join(", ")),
        format!(
            "   default     {} (tutor: {})",
            config.personas.default_persona, config.personas.tutor_persona
        ),
        format!(
            "  History      {} turns, {} chars per turn",
            config.history.max_turns, config.history.max_turn_chars
        ),
        String::new(),
        format!("  Storage      {}", config.storage.backend),
        format!(
            "   session ttl {}s, max {} sessions",
            config.storage.session_ttl_secs, config.storage.max_sessions
        ),
        format!("   active      {}", storage.backend),
    ];

    if storage.demoted {
        lines.push("   demoted     yes (remote store unreachable)".to_string());
    }
    lines.push(format!(
        "   healthy     {}",
        if storage.healthy { "yes" } else { "no" }
    ));

    lines.join("\n")
}
