use crate::error::{UpstreamError, UpstreamFailure, UpstreamService};
use crate::utils::sanitize_api_error;
use reqwest::Client;
use std::time::Duration;

pub fn build_upstream_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Typed error for a non-success upstream response, body scrubbed.
pub async fn status_error(service: UpstreamService, response: reqwest::Response) -> UpstreamError {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());
    UpstreamError::new(
        service,
        UpstreamFailure::Status,
        Some(status.as_u16()),
        sanitize_api_error(&body),
    )
}
