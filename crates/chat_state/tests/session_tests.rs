//! Tests for the session controller: turns, branching and conversation
//! replacement

use chat_state::{ChatConfig, Effect, ModelSettings, Session, SessionError, StreamEvent};
use chat_tree::{MessageTree, Role, TreeError, WireMessage};
use tokio::time::Instant;

fn answer(session: &mut Session, text: &str) -> Vec<Effect> {
    let now = Instant::now();
    let settings = ModelSettings::default();
    let event = StreamEvent::Chunk { data: text.into() };
    let mut effects = session.apply_event(&event, &settings, now);
    effects.extend(session.apply_event(&StreamEvent::Final, &settings, now));
    effects.extend(session.apply_event(&StreamEvent::Finish, &settings, now));
    effects
}

fn last_request(effects: &[Effect]) -> Vec<WireMessage> {
    effects
        .iter()
        .rev()
        .find_map(|effect| match effect {
            Effect::RequestCompletion { messages } => Some(messages.clone()),
            _ => None,
        })
        .expect("no completion request")
}

#[test]
fn test_send_user_message_requests_completion() {
    let mut session = Session::fresh(ChatConfig::default());
    let effects = session.send_user_message("  hi there  ", Instant::now()).unwrap();

    assert_eq!(effects[0], Effect::GenerationChanged { generating: true });
    let messages = last_request(&effects);
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[2], WireMessage::user("hi there"));
    assert!(session.is_generating());
}

#[test]
fn test_full_turn_commits_answer_and_requests_title() {
    let mut session = Session::fresh(ChatConfig::default());
    session.send_user_message("hi", Instant::now()).unwrap();
    let effects = answer(&mut session, "Hello!");

    assert!(!session.is_generating());
    assert_eq!(session.messages().last(), Some(&WireMessage::assistant("Hello!")));
    assert!(effects
        .iter()
        .any(|effect| matches!(effect, Effect::GenerateTitle { .. })));

    let effects = session.apply_generated_title("  Greeting ");
    assert_eq!(effects, vec![Effect::PersistHistory { title: "Greeting".into() }]);
    assert_eq!(session.title(), Some("Greeting"));

    session.send_user_message("more", Instant::now()).unwrap();
    let effects = answer(&mut session, "Sure.");
    assert!(effects.contains(&Effect::PersistHistory { title: "Greeting".into() }));
}

#[test]
fn test_edit_creates_active_sibling_branch() {
    let mut session = Session::fresh(ChatConfig::default());
    session.send_user_message("first", Instant::now()).unwrap();
    answer(&mut session, "one");
    let first_user = 2;

    let effects = session
        .edit_user_message(first_user, "second", Instant::now())
        .unwrap();
    assert_eq!(effects[0], Effect::TranscriptReplaced);
    let messages = last_request(&effects);
    assert_eq!(messages.last(), Some(&WireMessage::user("second")));
    assert_eq!(messages.len(), 3);

    answer(&mut session, "two");
    let edited = session.tree().active_path()[2];
    let info = session.tree().branch_info(edited).unwrap();
    assert_eq!((info.position, info.total), (2, 2));

    session.previous_branch(edited).unwrap();
    let contents: Vec<_> = session
        .messages()
        .iter()
        .map(|message| message.content().to_string())
        .collect();
    assert_eq!(contents[2..], ["first".to_string(), "one".to_string()]);

    let err = session.previous_branch(first_user).unwrap_err();
    assert!(matches!(err, SessionError::Tree(TreeError::BranchOutOfRange { .. })));
}

#[test]
fn test_regenerate_repeats_user_message() {
    let mut session = Session::fresh(ChatConfig::default());
    session.send_user_message("again?", Instant::now()).unwrap();
    answer(&mut session, "yes");

    let effects = session.regenerate(2, Instant::now()).unwrap();
    assert_eq!(last_request(&effects).last(), Some(&WireMessage::user("again?")));
    assert_eq!(session.tree().node(2).unwrap().children().len(), 1);
    assert_eq!(session.tree().node(1).unwrap().children().len(), 2);
}

#[test]
fn test_edit_rejects_non_user_and_unknown_nodes() {
    let mut session = Session::fresh(ChatConfig::default());
    assert_eq!(
        session.edit_user_message(1, "x", Instant::now()).unwrap_err(),
        SessionError::NotAUserMessage(1)
    );
    assert!(matches!(
        session.regenerate(99, Instant::now()).unwrap_err(),
        SessionError::Tree(TreeError::NodeOutOfBounds { .. })
    ));
}

#[test]
fn test_error_event_leaves_session_ready_for_next_turn() {
    let mut session = Session::fresh(ChatConfig::default());
    let nodes = session.tree().node_count();
    session.send_user_message("hi", Instant::now()).unwrap();
    session.apply_event(
        &StreamEvent::Error { data: "rate limited".into() },
        &ModelSettings::default(),
        Instant::now(),
    );

    assert!(!session.is_generating());
    assert_eq!(session.tree().node_count(), nodes + 1);
    assert!(session.send_user_message("retry", Instant::now()).is_ok());
}

#[test]
fn test_stop_allows_new_input() {
    let mut session = Session::fresh(ChatConfig::default());
    session.send_user_message("long question", Instant::now()).unwrap();
    let effects = session.stop();
    assert!(effects.contains(&Effect::StopRequested));
    assert!(!session.is_generating());
    assert!(session.send_user_message("next", Instant::now()).is_ok());
}

#[test]
fn test_clear_resets_title_and_tree() {
    let mut session = Session::fresh(ChatConfig::default());
    session.send_user_message("hi", Instant::now()).unwrap();
    answer(&mut session, "hello");
    session.apply_generated_title("Chat");

    let effects = session.clear(Instant::now());
    assert!(effects.contains(&Effect::TranscriptReplaced));
    assert_eq!(session.title(), None);
    assert_eq!(session.tree().node_count(), 2);
    assert!(!session.reducer().title_requested());

    session.send_user_message("hi again", Instant::now()).unwrap();
    let effects = answer(&mut session, "hello again");
    assert!(effects
        .iter()
        .any(|effect| matches!(effect, Effect::GenerateTitle { .. })));
}

#[test]
fn test_load_and_delete_history() {
    let mut session = Session::fresh(ChatConfig::default());
    let loaded = MessageTree::from_messages(vec![
        WireMessage::system("s"),
        WireMessage::user("old question"),
        WireMessage::assistant("old answer"),
    ])
    .unwrap();

    session.load_history("Old chat", loaded, Instant::now());
    assert_eq!(session.title(), Some("Old chat"));
    assert_eq!(session.messages()[1].role(), Role::User);

    assert!(session.history_deleted("Other", Instant::now()).is_empty());
    assert_eq!(session.title(), Some("Old chat"));

    session.history_renamed("Old chat", "Renamed");
    assert_eq!(session.title(), Some("Renamed"));

    let effects = session.history_deleted("Renamed", Instant::now());
    assert!(effects.contains(&Effect::TranscriptReplaced));
    assert_eq!(session.title(), None);
    assert_eq!(session.tree().node_count(), 2);
}

#[test]
fn test_load_during_generation_stops_turn() {
    let mut session = Session::fresh(ChatConfig::default());
    session.send_user_message("hi", Instant::now()).unwrap();
    let tree = MessageTree::new(None, WireMessage::system("s"));
    let effects = session.load_history("Other", tree, Instant::now());
    assert_eq!(effects[0], Effect::StopRequested);
    assert!(!session.is_generating());
}
