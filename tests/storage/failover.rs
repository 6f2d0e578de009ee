use parley::config::StorageConfig;
use parley::session::{SessionRecord, SessionStore};
use parley::storage::{
    FailoverKv, InProcessKv, KvBackend, RestKv, RetryPolicy, StorageEvent, create_backend,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(5),
    }
}

fn local() -> Arc<InProcessKv> {
    Arc::new(InProcessKv::new(Some(100), Duration::from_secs(60)))
}

async fn mount_pong(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": "PONG" })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn healthy_remote_serves_session_writes() {
    let server = MockServer::start().await;
    mount_pong(&server).await;
    Mock::given(method("POST"))
        .and(path("/set/session:remote"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": "OK" })))
        .expect(1)
        .mount(&server)
        .await;

    let primary = Arc::new(RestKv::new(&server.uri(), Some("token")).expect("valid url"));
    let kv = Arc::new(FailoverKv::connect(primary, local(), fast_policy()).await);
    let mut events = kv.subscribe();
    assert_eq!(kv.active_backend(), "rest");

    let sessions = SessionStore::new(kv.clone(), Duration::from_secs(60));
    sessions
        .set(&SessionRecord::new("remote", Some("sophia".into())))
        .await
        .expect("write should succeed");

    assert_eq!(
        events.try_recv().expect("write event"),
        StorageEvent::Written {
            backend: "rest".into(),
            key: "session:remote".into(),
        }
    );
    assert!(kv.local().is_empty());
}

#[tokio::test]
async fn remote_outage_demotes_and_keeps_the_session() {
    let server = MockServer::start().await;
    mount_pong(&server).await;
    Mock::given(method("POST"))
        .and(path_regex("^/set/"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(3)
        .mount(&server)
        .await;

    let primary = Arc::new(RestKv::new(&server.uri(), None).expect("valid url"));
    let kv = Arc::new(FailoverKv::connect(primary, local(), fast_policy()).await);
    let mut events = kv.subscribe();
    let sessions = SessionStore::new(kv.clone(), Duration::from_secs(60));

    sessions
        .set(&SessionRecord::new("outage", Some("marco".into())))
        .await
        .expect("write is redirected to the in-process store");

    assert!(kv.is_demoted());
    assert_eq!(kv.active_backend(), "memory");
    assert!(matches!(
        events.try_recv().expect("demotion event"),
        StorageEvent::Demoted { ref from, .. } if from == "rest"
    ));

    let record = sessions.get("outage").await.expect("served from memory");
    assert_eq!(record.persona.as_deref(), Some("marco"));
}

#[tokio::test]
async fn demotion_is_permanent() {
    let server = MockServer::start().await;
    mount_pong(&server).await;
    Mock::given(method("GET"))
        .and(path_regex("^/get/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let primary = Arc::new(RestKv::new(&server.uri(), None).expect("valid url"));
    let kv = FailoverKv::connect(primary, local(), fast_policy()).await;

    assert_eq!(kv.get("session:x").await.expect("falls back"), None);
    assert!(kv.is_demoted());

    let before = server
        .received_requests()
        .await
        .map_or(0, |requests| requests.len());
    kv.set_with_ttl("session:x", "{}", Duration::from_secs(5))
        .await
        .expect("write goes to memory");
    kv.ping().await.expect("memory answers pings");
    let after = server
        .received_requests()
        .await
        .map_or(0, |requests| requests.len());
    assert_eq!(before, after, "no traffic to the remote after demotion");
}

#[tokio::test]
async fn factory_demotes_when_remote_is_unreachable_at_startup() {
    let config = StorageConfig {
        backend: "remote".into(),
        url: Some("http://127.0.0.1:1".into()),
        base_backoff_ms: 1,
        max_backoff_ms: 5,
        ..StorageConfig::default()
    };

    let kv = create_backend(&config).await.expect("startup still succeeds");
    assert!(kv.is_demoted());
    assert_eq!(kv.active_backend(), "memory");
    kv.ping().await.expect("memory answers pings");
}
