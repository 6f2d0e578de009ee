use parley::app::services::Services;
use parley::config::{Config, MAX_BODY_BYTES};
use parley::gateway::run_gateway_with_listener;
use reqwest::StatusCode;
use serde_json::{Value, json};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct GatewayTestServer {
    port: u16,
    handle: tokio::task::JoinHandle<anyhow::Result<()>>,
}

impl GatewayTestServer {
    async fn start(upstream: &MockServer) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("ephemeral gateway listener should bind");
        let port = listener
            .local_addr()
            .expect("ephemeral gateway listener should expose local address")
            .port();

        let mut config = Config::default();
        config.dialogue.base_url = upstream.uri();
        config.dialogue.api_key = Some("sk-test-key".to_string());
        config.speech.base_url = upstream.uri();
        config.speech.api_key = Some("xi-test-key".to_string());

        let services = Services::from_config(&config)
            .await
            .expect("services should wire");
        let state = services.app_state();
        let handle =
            tokio::spawn(async move { run_gateway_with_listener(listener, state, &[]).await });

        wait_until_gateway_ready(port).await;

        Self { port, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{path}", self.port)
    }
}

impl Drop for GatewayTestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn wait_until_gateway_ready(port: u16) {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(200))
        .build()
        .expect("reqwest client should be built");

    for _ in 0..80 {
        let health = client
            .get(format!("http://127.0.0.1:{port}/health"))
            .send()
            .await;
        if matches!(health, Ok(resp) if resp.status() == StatusCode::OK) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    panic!("gateway did not become ready on port {port}");
}

async fn mount_completion(upstream: &MockServer, reply: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": reply } }]
        })))
        .mount(upstream)
        .await;
}

#[tokio::test]
async fn chat_runs_the_full_stack_against_the_dialogue_upstream() {
    let upstream = MockServer::start().await;
    mount_completion(&upstream, "Ciao! Tell me about your day.").await;
    let server = GatewayTestServer::start(&upstream).await;
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/chat"))
        .json(&json!({ "sessionId": "web-1", "message": "hello, can I talk to sophia" }))
        .send()
        .await
        .expect("chat request should complete");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("chat response should be json");
    assert_eq!(body["persona"], "sophia");
    assert_eq!(body["reply"], "Ciao! Tell me about your day.");

    let requests = upstream
        .received_requests()
        .await
        .expect("request recording is enabled");
    let sent: Value = serde_json::from_slice(&requests[0].body).expect("upstream body is json");
    assert_eq!(sent["model"], "gpt-4o-mini");
    assert_eq!(sent["messages"][0]["role"], "system");
    assert_eq!(sent["messages"][1]["content"], "hello, can I talk to sophia");
}

#[tokio::test]
async fn chat_rejects_missing_fields_and_malformed_json() {
    let upstream = MockServer::start().await;
    let server = GatewayTestServer::start(&upstream).await;
    let client = reqwest::Client::new();

    let missing = client
        .post(server.url("/chat"))
        .json(&json!({ "sessionId": "web-2" }))
        .send()
        .await
        .expect("request should complete");
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    let body: Value = missing.json().await.expect("error body should be json");
    assert_eq!(body["code"], "MISSING_FIELD");

    let malformed = client
        .post(server.url("/chat"))
        .header("content-type", "application/json")
        .body("{\"sessionId\": ")
        .send()
        .await
        .expect("request should complete");
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
    let body: Value = malformed.json().await.expect("error body should be json");
    assert_eq!(body["code"], "MALFORMED_BODY");
}

#[tokio::test]
async fn dialogue_outage_maps_to_bad_gateway() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&upstream)
        .await;
    let server = GatewayTestServer::start(&upstream).await;

    let response = reqwest::Client::new()
        .post(server.url("/chat"))
        .json(&json!({ "sessionId": "web-3", "message": "talk to marco" }))
        .send()
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: Value = response.json().await.expect("error body should be json");
    assert_eq!(body["code"], "DIALOGUE_UPSTREAM_ERROR");
}

#[tokio::test]
async fn speech_uses_the_session_persona_voice() {
    let upstream = MockServer::start().await;
    mount_completion(&upstream, "Buongiorno!").await;
    Mock::given(method("POST"))
        .and(path("/v1/text-to-speech/EXAVITQu4vr4xnSDxMaL"))
        .and(header("xi-api-key", "xi-test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"ID3\x03audio".to_vec(), "audio/mpeg"))
        .expect(1)
        .mount(&upstream)
        .await;
    let server = GatewayTestServer::start(&upstream).await;
    let client = reqwest::Client::new();

    client
        .post(server.url("/chat"))
        .json(&json!({ "sessionId": "voice-1", "message": "talk to sophia" }))
        .send()
        .await
        .expect("chat request should complete");

    let response = client
        .post(server.url("/speech"))
        .json(&json!({ "sessionId": "voice-1", "text": "Buongiorno!" }))
        .send()
        .await
        .expect("speech request should complete");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("audio/mpeg")
    );
    let bytes = response.bytes().await.expect("audio body");
    assert!(bytes.starts_with(b"ID3"));
}

#[tokio::test]
async fn health_and_reset_round_out_the_surface() {
    let upstream = MockServer::start().await;
    let server = GatewayTestServer::start(&upstream).await;
    let client = reqwest::Client::new();

    let health: Value = client
        .get(server.url("/health"))
        .send()
        .await
        .expect("health request should complete")
        .json()
        .await
        .expect("health body should be json");
    assert_eq!(health["storage"]["backend"], "memory");
    assert_eq!(health["storage"]["healthy"], true);

    let reset = client
        .post(server.url("/session/reset"))
        .json(&json!({ "sessionId": "fresh" }))
        .send()
        .await
        .expect("reset request should complete");
    assert_eq!(reset.status(), StatusCode::OK);
    let body: Value = reset.json().await.expect("reset body should be json");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["persona"], "tutor");
}

#[tokio::test]
async fn oversized_body_is_rejected_with_a_structured_413() {
    let upstream = MockServer::start().await;
    let server = GatewayTestServer::start(&upstream).await;

    let response = reqwest::Client::new()
        .post(server.url("/chat"))
        .json(&json!({ "sessionId": "big", "message": "x".repeat(MAX_BODY_BYTES) }))
        .send()
        .await
        .expect("oversized request should still get a response");
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value = response.json().await.expect("413 body should be json");
    assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
    assert!(
        body["error"]
            .as_str()
            .expect("error message")
            .contains(&MAX_BODY_BYTES.to_string())
    );
    assert!(
        upstream
            .received_requests()
            .await
            .expect("request recording is on")
            .is_empty()
    );
}
