use crate::parley_harness::{BrokenKv, Harness};
use std::sync::Arc;

#[tokio::test]
async fn upstream_failure_leaves_history_untouched() {
    let harness = Harness::new();
    harness
        .orchestrator
        .resolve_turn("upstream", "talk to sophia")
        .await
        .expect("switch turn should succeed");
    let before = harness.history("upstream");

    harness.dialogue.set_failing(true);
    let err = harness
        .orchestrator
        .resolve_turn("upstream", "how are you?")
        .await
        .expect_err("upstream failure should surface");

    assert_eq!(err.code(), "DIALOGUE_UPSTREAM_ERROR");
    assert_eq!(err.http_status(), 502);
    assert_eq!(harness.history("upstream"), before);
}

#[tokio::test]
async fn persona_switch_survives_a_failed_reply() {
    let harness = Harness::new();
    harness.dialogue.set_failing(true);

    let result = harness
        .orchestrator
        .resolve_turn("switch-fail", "connect me to marco")
        .await;

    assert!(result.is_err());
    let record = harness.record("switch-fail").await.expect("session persisted");
    assert_eq!(record.persona.as_deref(), Some("marco"));
    assert!(harness.history("switch-fail").is_empty());
}

#[tokio::test]
async fn validation_failures_touch_no_state() {
    let harness = Harness::new();

    let empty = harness
        .orchestrator
        .resolve_turn("valid-id", "<b></b>")
        .await
        .expect_err("markup-only message should be rejected");
    assert_eq!(empty.code(), "EMPTY_MESSAGE");

    let bad_id = harness
        .orchestrator
        .resolve_turn("not a valid id", "hello")
        .await
        .expect_err("bad id should be rejected");
    assert_eq!(bad_id.code(), "INVALID_SESSION_ID");

    let too_long = harness
        .orchestrator
        .resolve_turn("valid-id", &"a".repeat(2001))
        .await
        .expect_err("long message should be rejected");
    assert_eq!(too_long.code(), "MESSAGE_TOO_LONG");

    assert!(harness.record("valid-id").await.is_none());
    assert!(harness.history("valid-id").is_empty());
    assert_eq!(harness.dialogue.call_count(), 0);
}

#[tokio::test]
async fn storage_write_failure_fails_closed() {
    let harness = Harness::over_backend(Arc::new(BrokenKv));

    let err = harness
        .orchestrator
        .resolve_turn("closed", "hello")
        .await
        .expect_err("write failure should surface");

    assert_eq!(err.code(), "STORAGE_UNAVAILABLE");
    assert_eq!(err.http_status(), 503);
    assert!(harness.history("closed").is_empty());
}

#[tokio::test]
async fn reset_returns_session_to_default_persona() {
    let harness = Harness::new();
    harness.introduce("reset", "Maria").await;
    harness
        .orchestrator
        .resolve_turn("reset", "talk to sophia")
        .await
        .expect("switch turn should succeed");

    let record = harness
        .orchestrator
        .reset_session("reset")
        .await
        .expect("reset should succeed");

    assert_eq!(record.persona.as_deref(), Some("tutor"));
    assert_eq!(record.student_name, None);
    assert!(harness.history("reset").is_empty());

    let turn = harness
        .orchestrator
        .resolve_turn("reset", "hello again")
        .await
        .expect("turn should succeed");
    assert_eq!(turn.reply, parley::persona::prompts::TUTOR_WELCOME);
}
