use crate::app::services::Services;
use crate::app::status::{StorageHealth, render_status};
use crate::cli::commands::{Cli, Commands};
use crate::config::Config;
use crate::persona::{self, Detection, PersonaCatalog};
use crate::storage::{KvBackend, create_backend};
use anyhow::Result;
use std::io::{BufRead, Write};
use tracing::info;

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Serve { port, host } => {
            let port = port.unwrap_or(config.gateway.port);
            let host = host.unwrap_or_else(|| config.gateway.host.clone());
            if port == 0 {
                info!("Starting Parley gateway on {host} (random port)");
            } else {
                info!("Starting Parley gateway on {host}:{port}");
            }
            let services = Services::from_config(&config).await?;
            crate::gateway::run_gateway(
                &host,
                port,
                services.app_state(),
                &config.gateway.allowed_origins,
            )
            .await
        }

        Commands::Chat { session, message } => {
            let services = Services::from_config(&config).await?;
            let session_id = session.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            match message {
                Some(message) => {
                    let turn = services
                        .orchestrator
                        .resolve_turn(&session_id, &message)
                        .await?;
                    println!("[{}] {}", turn.persona, turn.reply);
                    Ok(())
                }
                None => run_interactive(&services, &session_id).await,
            }
        }

        Commands::Resolve { text } => {
            let catalog = config.personas.build_catalog();
            println!("{}", describe_resolution(&catalog, &text));
            Ok(())
        }

        Commands::Status => {
            let storage = create_backend(&config.storage).await?;
            let health = StorageHealth {
                backend: storage.active_backend().to_string(),
                demoted: storage.is_demoted(),
                healthy: storage.ping().await.is_ok(),
            };
            println!("{}", render_status(&config, &health));
            Ok(())
        }
    }
}

/// Read-eval loop over stdin until EOF or `/quit`.
async fn run_interactive(services: &Services, session_id: &str) -> Result<()> {
    println!("Session {session_id} (type /quit to exit)");
    let stdin = std::io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if message == "/quit" {
            break;
        }
        match services
            .orchestrator
            .resolve_turn(session_id, message)
            .await
        {
            Ok(turn) => println!("[{}] {}", turn.persona, turn.reply),
            Err(e) => println!("error [{}]: {}", e.code(), e.public_message()),
        }
    }
    Ok(())
}

fn describe_resolution(catalog: &PersonaCatalog, text: &str) -> String {
    let persona = match persona::detect(catalog, text) {
        Detection::Unique(id) => id.to_string(),
        Detection::Ambiguous(ids) => format!("ambiguous ({})", ids.join(", ")),
        Detection::None => "(none)".to_string(),
    };
    let switch = if persona::is_switch_request(text) {
        "yes"
    } else {
        "no"
    };
    format!("persona: {persona}\nswitch request: {switch}")
}
