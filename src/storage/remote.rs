//! Networked backend speaking a Redis-compatible REST protocol.
//!
//! Commands map to `GET {base}/get/{key}`, `POST {base}/set/{key}?EX={secs}`
//! (value as the request body) and `GET {base}/ping`. Replies use the
//! `{"result": ...}` / `{"error": "..."}` envelope.

use super::traits::{KvBackend, StorageFuture, WriteReceipt};
use crate::error::StorageError;
use crate::utils::sanitize_api_error;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

const BACKEND_NAME: &str = "rest";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Deserialize)]
struct Reply {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

pub struct RestKv {
    base_url: Url,
    /// Pre-computed `"Bearer <token>"` header value.
    cached_auth_header: Option<String>,
    client: Client,
}

impl RestKv {
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self, StorageError> {
        let base_url = Url::parse(base_url.trim_end_matches('/')).map_err(|error| {
            StorageError::Rejected {
                backend: BACKEND_NAME.to_string(),
                message: format!("invalid base url: {error}"),
            }
        })?;
        if base_url.cannot_be_a_base() {
            return Err(StorageError::Rejected {
                backend: BACKEND_NAME.to_string(),
                message: format!("base url cannot carry a path: {base_url}"),
            });
        }

        Ok(Self {
            base_url,
            cached_auth_header: token
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(|token| format!("Bearer {token}")),
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .connect_timeout(CONNECT_TIMEOUT)
                .pool_max_idle_per_host(10)
                .build()
                .unwrap_or_else(|_| Client::new()),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn unavailable(message: impl Into<String>) -> StorageError {
        StorageError::Unavailable {
            backend: BACKEND_NAME.to_string(),
            message: message.into(),
        }
    }

    fn rejected(message: impl Into<String>) -> StorageError {
        StorageError::Rejected {
            backend: BACKEND_NAME.to_string(),
            message: message.into(),
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Option<Value>, StorageError> {
        let request = match &self.cached_auth_header {
            Some(auth) => request.header(reqwest::header::AUTHORIZATION, auth),
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|error| Self::unavailable(sanitize_api_error(&error.to_string())))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| Self::unavailable(format!("failed to read reply: {error}")))?;

        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Self::unavailable(format!(
                "{status}: {}",
                sanitize_api_error(&body)
            )));
        }

        let reply: Reply = serde_json::from_str(&body).map_err(|error| {
            Self::unavailable(format!("{status}: unreadable reply ({error})"))
        })?;

        if let Some(error) = reply.error {
            return Err(Self::rejected(format!("{status}: {}", sanitize_api_error(&error))));
        }
        if !status.is_success() {
            return Err(Self::rejected(status.to_string()));
        }
        Ok(reply.result)
    }
}

impl KvBackend for RestKv {
    fn name(&self) -> &str {
        BACKEND_NAME
    }

    fn get<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Option<String>> {
        Box::pin(async move {
            let result = self
                .send(self.client.get(self.endpoint(&["get", key])))
                .await?;
            Ok(match result {
                None | Some(Value::Null) => None,
                Some(Value::String(value)) => Some(value),
                Some(other) => Some(other.to_string()),
            })
        })
    }

    fn set_with_ttl<'a>(
        &'a self,
        key: &'a str,
        value: &'a str,
        ttl: Duration,
    ) -> StorageFuture<'a, WriteReceipt> {
        Box::pin(async move {
            let secs = ttl.as_secs().max(1);
            let result = self
                .send(
                    self.client
                        .post(self.endpoint(&["set", key]))
                        .query(&[("EX", secs)])
                        .body(value.to_string()),
                )
                .await?;
            match result {
                Some(Value::String(ok)) if ok.eq_ignore_ascii_case("ok") => {
                    Ok(WriteReceipt::default())
                }
                other => Err(Self::rejected(format!("unexpected set reply: {other:?}"))),
            }
        })
    }

    fn ping(&self) -> StorageFuture<'_, ()> {
        Box::pin(async move {
            match self.send(self.client.get(self.endpoint(&["ping"]))).await? {
                Some(Value::String(pong)) if pong.eq_ignore_ascii_case("pong") => Ok(()),
                other => Err(Self::unavailable(format!("unexpected ping reply: {other:?}"))),
            }
        })
    }
}
