use super::traits::{DialogueClient, DialogueFuture};
use crate::config::DialogueConfig;
use crate::error::{UpstreamError, UpstreamFailure, UpstreamService};
use crate::session::{ChatRole, ChatTurn};
use crate::utils::http::{build_upstream_client, status_error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SERVICE: UpstreamService = UpstreamService::Dialogue;

/// Client for any `/chat/completions` endpoint speaking the OpenAI wire format.
pub struct OpenAiCompatibleDialogue {
    endpoint: String,
    /// Pre-computed `"Bearer <key>"` header value (avoids `format!` per request).
    cached_auth_header: Option<String>,
    temperature: f64,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: ChatRole,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAiCompatibleDialogue {
    pub fn new(base_url: &str, api_key: Option<&str>, temperature: f64, timeout: Duration) -> Self {
        Self {
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            cached_auth_header: api_key
                .filter(|key| !key.trim().is_empty())
                .map(|key| format!("Bearer {}", key.trim())),
            temperature,
            client: build_upstream_client(timeout),
        }
    }

    pub fn from_config(config: &DialogueConfig) -> Self {
        Self::new(
            &config.base_url,
            config.api_key.as_deref(),
            config.temperature,
            config.timeout(),
        )
    }

    fn build_request<'a>(&self, bot: &'a str, turns: &'a [ChatTurn]) -> ChatRequest<'a> {
        ChatRequest {
            model: bot,
            messages: turns
                .iter()
                .map(|turn| Message {
                    role: turn.role,
                    content: &turn.content,
                })
                .collect(),
            temperature: self.temperature,
        }
    }

    fn extract_text(response: ChatResponse) -> Result<String, UpstreamError> {
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| {
                UpstreamError::new(
                    SERVICE,
                    UpstreamFailure::Malformed,
                    Some(200),
                    "response carried no reply text",
                )
            })
    }
}

impl DialogueClient for OpenAiCompatibleDialogue {
    fn name(&self) -> &str {
        "openai-compatible"
    }

    fn complete<'a>(&'a self, bot: &'a str, turns: &'a [ChatTurn]) -> DialogueFuture<'a> {
        Box::pin(async move {
            let request = self.client.post(&self.endpoint);
            let request = match &self.cached_auth_header {
                Some(auth) => request.header(reqwest::header::AUTHORIZATION, auth),
                None => request,
            };

            let response = request
                .json(&self.build_request(bot, turns))
                .send()
                .await
                .map_err(|e| UpstreamError::from_transport(SERVICE, &e))?;

            if !response.status().is_success() {
                return Err(status_error(SERVICE, response).await);
            }

            let status = response.status().as_u16();
            let body: ChatResponse = response.json().await.map_err(|e| {
                if e.is_timeout() {
                    UpstreamError::from_transport(SERVICE, &e)
                } else {
                    UpstreamError::new(
                        SERVICE,
                        UpstreamFailure::Malformed,
                        Some(status),
                        format!("response JSON decode failed: {e}"),
                    )
                }
            })?;
            Self::extract_text(body)
        })
    }
}
