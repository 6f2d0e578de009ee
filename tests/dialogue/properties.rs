use crate::parley_harness::Harness;
use parley::persona::prompts::TUTOR_WELCOME;
use parley::session::ChatRole;
use std::time::Duration;

#[tokio::test]
async fn history_keeps_only_the_latest_twelve_turns_in_order() {
    let harness = Harness::new();
    harness
        .orchestrator
        .resolve_turn("cap", "talk to sophia")
        .await
        .expect("switch turn should succeed");

    for i in 0..10 {
        harness
            .orchestrator
            .resolve_turn("cap", &format!("message {i}"))
            .await
            .expect("turn should succeed");

        assert!(harness.history("cap").len() <= 12);
    }

    let history = harness.history("cap");
    assert_eq!(history.len(), 12);
    let users: Vec<&str> = history
        .iter()
        .filter(|t| t.role == ChatRole::User)
        .map(|t| t.content.as_str())
        .collect();
    assert_eq!(users.first(), Some(&"message 4"));
    assert_eq!(users.last(), Some(&"message 9"));
    assert_eq!(history.last().map(|t| t.role), Some(ChatRole::Assistant));
}

#[tokio::test]
async fn captured_name_is_never_overwritten() {
    let harness = Harness::new();
    harness.introduce("idem", "Maria").await;

    harness
        .orchestrator
        .resolve_turn("idem", "Juan")
        .await
        .expect("turn should succeed");

    let record = harness.record("idem").await.expect("session persisted");
    assert_eq!(record.student_name.as_deref(), Some("Maria"));
    assert_eq!(harness.dialogue.call_count(), 1);
}

#[tokio::test]
async fn mentioning_a_persona_without_a_switch_phrase_changes_nothing() {
    let harness = Harness::new();
    harness
        .orchestrator
        .resolve_turn("mention", "talk to marco")
        .await
        .expect("switch turn should succeed");

    let turn = harness
        .orchestrator
        .resolve_turn("mention", "yesterday I read a book about sophia and her travels")
        .await
        .expect("turn should succeed");

    assert_eq!(turn.persona, "marco");
}

#[tokio::test]
async fn ambiguous_request_keeps_the_current_persona() {
    let harness = Harness::new();
    harness
        .orchestrator
        .resolve_turn("ambiguous", "talk to marco")
        .await
        .expect("switch turn should succeed");

    let turn = harness
        .orchestrator
        .resolve_turn("ambiguous", "can I talk to sophia or leonardo")
        .await
        .expect("turn should succeed");

    assert_eq!(turn.persona, "marco");
    let record = harness.record("ambiguous").await.expect("session persisted");
    assert_eq!(record.persona.as_deref(), Some("marco"));
}

#[tokio::test]
async fn evicting_a_session_also_drops_its_history() {
    let harness = Harness::with_capacity(2);

    for id in ["first", "second"] {
        harness
            .orchestrator
            .resolve_turn(id, "talk to sophia")
            .await
            .expect("turn should succeed");
    }
    assert_eq!(harness.history("first").len(), 2);

    harness
        .orchestrator
        .resolve_turn("third", "talk to sophia")
        .await
        .expect("turn should succeed");

    assert!(harness.record("first").await.is_none());
    assert!(harness.history("first").is_empty());
    assert!(harness.record("second").await.is_some());
    assert_eq!(harness.history("second").len(), 2);
    assert_eq!(harness.storage.local().len(), 2);
}

#[tokio::test]
async fn rewriting_an_existing_session_does_not_evict() {
    let harness = Harness::with_capacity(2);
    for id in ["first", "second"] {
        harness
            .orchestrator
            .resolve_turn(id, "talk to sophia")
            .await
            .expect("turn should succeed");
    }

    harness
        .orchestrator
        .resolve_turn("first", "switch to marco")
        .await
        .expect("turn should succeed");

    assert!(harness.record("first").await.is_some());
    assert!(harness.record("second").await.is_some());
}

/// Same-session writes race without compare-and-swap: whichever switch is
/// persisted last wins, and the record always holds one of the two.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_switches_on_one_session_are_last_write_wins() {
    let harness = Harness::new();
    harness
        .orchestrator
        .resolve_turn("race", "talk to leonardo")
        .await
        .expect("switch turn should succeed");

    let a = harness.orchestrator.clone();
    let b = harness.orchestrator.clone();
    let (ra, rb) = tokio::join!(
        tokio::spawn(async move { a.resolve_turn("race", "talk to sophia").await }),
        tokio::spawn(async move { b.resolve_turn("race", "talk to marco").await }),
    );
    let ra = ra.expect("task should not panic").expect("turn should succeed");
    let rb = rb.expect("task should not panic").expect("turn should succeed");
    assert_eq!(ra.persona, "sophia");
    assert_eq!(rb.persona, "marco");

    let stored = harness
        .record("race")
        .await
        .and_then(|r| r.persona)
        .expect("persona persisted");
    assert!(stored == "sophia" || stored == "marco");
}

#[tokio::test(start_paused = true)]
async fn expired_sessions_take_their_history_with_them() {
    let harness = Harness::with_ttl(Duration::from_secs(5), Duration::from_secs(60));
    for i in 0..200 {
        harness
            .orchestrator
            .resolve_turn(&format!("s{i}"), "hi")
            .await
            .expect("welcome turn should succeed");
    }
    assert_eq!(harness.orchestrator.history().session_count(), 200);

    tokio::time::sleep(Duration::from_secs(120)).await;

    assert!(harness.record("s0").await.is_none());
    assert_eq!(harness.storage.local().len(), 0);
    assert_eq!(harness.orchestrator.history().session_count(), 0);

    let turn = harness
        .orchestrator
        .resolve_turn("s0", "Pedro")
        .await
        .expect("turn should succeed");
    assert_eq!(turn.reply, TUTOR_WELCOME);
    let record = harness.record("s0").await.expect("session recreated");
    assert_eq!(record.student_name, None);
}
