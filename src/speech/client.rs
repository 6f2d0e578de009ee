use super::audio::audio_content_type;
use crate::config::SpeechConfig;
use crate::error::{UpstreamError, UpstreamFailure, UpstreamService};
use crate::utils::http::{build_upstream_client, status_error};
use reqwest::Client;
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use url::Url;

const SERVICE: UpstreamService = UpstreamService::Speech;

/// Text plus the voice parameters of the speaking persona.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
    pub voice_id: String,
    pub stability: f64,
    pub similarity: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedAudio {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

pub type SpeechFuture<'a> =
    Pin<Box<dyn Future<Output = Result<SynthesizedAudio, UpstreamError>> + Send + 'a>>;

/// External text-to-speech API.
pub trait SpeechClient: Send + Sync {
    fn name(&self) -> &str;

    fn synthesize<'a>(&'a self, request: &'a SpeechRequest) -> SpeechFuture<'a>;
}

#[derive(Debug, Serialize)]
struct TtsBody<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f64,
    similarity_boost: f64,
}

/// ElevenLabs-style `POST /v1/text-to-speech/{voice_id}` client.
pub struct HttpSpeechClient {
    base_url: Url,
    api_key: Option<String>,
    model_id: String,
    client: Client,
}

impl HttpSpeechClient {
    pub fn new(
        base_url: &str,
        api_key: Option<&str>,
        model_id: &str,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| anyhow::anyhow!("invalid speech base url '{base_url}': {e}"))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("speech base url cannot carry a path: {base_url}");
        }
        Ok(Self {
            base_url,
            api_key: api_key
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(ToString::to_string),
            model_id: model_id.to_string(),
            client: build_upstream_client(timeout),
        })
    }

    pub fn from_config(config: &SpeechConfig) -> anyhow::Result<Self> {
        Self::new(
            &config.base_url,
            config.api_key.as_deref(),
            &config.model_id,
            config.timeout(),
        )
    }

    fn endpoint(&self, voice_id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(["v1", "text-to-speech", voice_id]);
        }
        url
    }
}

impl SpeechClient for HttpSpeechClient {
    fn name(&self) -> &str {
        "http-tts"
    }

    fn synthesize<'a>(&'a self, request: &'a SpeechRequest) -> SpeechFuture<'a> {
        Box::pin(async move {
            let body = TtsBody {
                text: &request.text,
                model_id: &self.model_id,
                voice_settings: VoiceSettings {
                    stability: request.stability,
                    similarity_boost: request.similarity,
                },
            };

            let builder = self
                .client
                .post(self.endpoint(&request.voice_id))
                .header(reqwest::header::ACCEPT, "audio/mpeg")
                .json(&body);
            let builder = match &self.api_key {
                Some(key) => builder.header("xi-api-key", key),
                None => builder,
            };

            let response = builder
                .send()
                .await
                .map_err(|e| UpstreamError::from_transport(SERVICE, &e))?;

            let status = response.status();
            if !status.is_success() {
                return Err(status_error(SERVICE, response).await);
            }

            let declared = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(ToString::to_string);
            let bytes = response
                .bytes()
                .await
                .map_err(|e| UpstreamError::from_transport(SERVICE, &e))?;

            if bytes.is_empty() {
                return Err(UpstreamError::new(
                    SERVICE,
                    UpstreamFailure::Malformed,
                    Some(status.as_u16()),
                    "empty audio body",
                ));
            }

            let content_type =
                audio_content_type(declared.as_deref(), &bytes).ok_or_else(|| {
                    UpstreamError::new(
                        SERVICE,
                        UpstreamFailure::NonAudio,
                        Some(status.as_u16()),
                        format!(
                            "expected audio, got {}",
                            declared.as_deref().unwrap_or("no content type")
                        ),
                    )
                })?;

            Ok(SynthesizedAudio {
                bytes: bytes.to_vec(),
                content_type,
            })
        })
    }
}
