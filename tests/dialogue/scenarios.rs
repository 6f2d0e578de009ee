use crate::parley_harness::Harness;
use parley::persona::prompts::{TUTOR_NAME_REREQUEST, TUTOR_WELCOME};
use parley::session::ChatRole;

#[tokio::test]
async fn switch_phrase_moves_new_session_to_sophia() {
    let harness = Harness::new();

    let turn = harness
        .orchestrator
        .resolve_turn("scenario-a", "hello, can I talk to sophia")
        .await
        .expect("turn should succeed");

    assert_eq!(turn.persona, "sophia");
    let record = harness.record("scenario-a").await.expect("session persisted");
    assert_eq!(record.persona.as_deref(), Some("sophia"));
    assert_eq!(harness.dialogue.call_count(), 1);
}

#[tokio::test]
async fn tutor_opens_with_canned_welcome_without_calling_upstream() {
    let harness = Harness::new();

    let turn = harness
        .orchestrator
        .resolve_turn("scenario-b", "what are we doing today?")
        .await
        .expect("turn should succeed");

    assert_eq!(turn.persona, "tutor");
    assert_eq!(turn.reply, TUTOR_WELCOME);
    let history = harness.history("scenario-b");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].role, ChatRole::Assistant);
    assert_eq!(harness.dialogue.call_count(), 0);
}

#[tokio::test]
async fn tutor_captures_plausible_name_and_greets() {
    let harness = Harness::new();
    harness.introduce("scenario-c", "Maria").await;

    let record = harness.record("scenario-c").await.expect("session persisted");
    assert_eq!(record.student_name.as_deref(), Some("Maria"));

    let history = harness.history("scenario-c");
    let greeting = &history.last().expect("greeting recorded").content;
    assert!(greeting.contains("Maria"));
    assert_eq!(harness.dialogue.call_count(), 0);
}

#[tokio::test]
async fn tutor_rerequests_when_message_is_not_a_name() {
    let harness = Harness::new();
    harness
        .orchestrator
        .resolve_turn("scenario-d", "hi")
        .await
        .expect("welcome turn should succeed");

    let turn = harness
        .orchestrator
        .resolve_turn("scenario-d", "123")
        .await
        .expect("turn should succeed");

    assert_eq!(turn.reply, TUTOR_NAME_REREQUEST);
    let record = harness.record("scenario-d").await.expect("session persisted");
    assert_eq!(record.student_name, None);
    assert_eq!(harness.history("scenario-d").len(), 3);
}

#[tokio::test]
async fn named_student_is_addressed_through_the_dialogue_api() {
    let harness = Harness::new();
    harness.introduce("named", "Maria").await;
    harness.dialogue.push_reply("Let's practice verbs, Maria.");

    let turn = harness
        .orchestrator
        .resolve_turn("named", "Can we practice verbs?")
        .await
        .expect("turn should succeed");

    assert_eq!(turn.reply, "Let's practice verbs, Maria.");
    let requests = harness.dialogue.requests();
    assert_eq!(requests.len(), 1);
    let turns = &requests[0];
    assert_eq!(turns[0].role, ChatRole::System);
    assert!(turns[0].content.contains("Maria"));
    assert_eq!(turns.last().map(|t| t.content.as_str()), Some("Can we practice verbs?"));
    assert_eq!(turns.len(), 1 + 3 + 1);
}

#[tokio::test]
async fn non_tutor_personas_never_see_the_student_name() {
    let harness = Harness::new();
    harness.introduce("travel", "Maria").await;

    harness
        .orchestrator
        .resolve_turn("travel", "please let me talk to marco")
        .await
        .expect("switch turn should succeed");

    let requests = harness.dialogue.requests();
    let system = &requests.last().expect("upstream called")[0];
    assert!(system.content.starts_with("You are Marco"));
    assert!(!system.content.contains("Maria"));
}
