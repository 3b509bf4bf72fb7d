//! Tests for event replay and history commands

use std::io::Write as _;

use chat_cli::history::{run_history, HistoryCommand};
use chat_cli::replay::{parse_events, run_replay, ReplayArgs};
use chat_state::{ChatConfig, StreamEvent, ThinkingMode};
use chat_tree::{MessageTree, Role, WireMessage};
use history_manager::{HistoryStore, MemoryHistoryStore};
use tempfile::NamedTempFile;

fn events_file(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file
}

fn args(file: &NamedTempFile, message: Option<&str>, history: Option<&str>) -> ReplayArgs {
    ReplayArgs {
        events: file.path().to_path_buf(),
        message: message.map(str::to_string),
        history: history.map(str::to_string),
        thinking_mode: ThinkingMode::Enabled,
        thinking_capable: true,
        local: false,
        json: false,
        no_save: false,
    }
}

#[test]
fn test_parse_events_accepts_delays_and_unknown_tags() {
    let lines = parse_events(
        "{\"type\":\"chunk\",\"data\":\"hi\",\"delay_ms\":20}\n\n{\"type\":\"ping\"}\n{\"type\":\"finish\"}\n",
    )
    .unwrap();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0].delay_ms, 20);
    assert_eq!(lines[0].event, StreamEvent::Chunk { data: "hi".into() });
    assert_eq!(lines[1].event, StreamEvent::Unknown);
    assert_eq!(lines[2].delay_ms, 0);
    assert_eq!(lines[2].event, StreamEvent::Finish);
}

#[test]
fn test_parse_events_reports_line_number() {
    let err = parse_events("{\"type\":\"final\"}\nnot json\n").unwrap_err();
    assert!(err.to_string().contains("line 2"));
}

#[tokio::test]
async fn test_replay_titles_and_saves_new_conversation() {
    colored::control::set_override(false);
    let file = events_file(&[
        r#"{"type":"reasoning","data":"Gravity..."}"#,
        r#"{"type":"chunk","data":"Tides come from the Moon."}"#,
        r#"{"type":"tool_call","data":"{\"height\":2}","tool_call_id":"call_9"}"#,
        r#"{"type":"final"}"#,
        r#"{"type":"finish"}"#,
    ]);
    let store = MemoryHistoryStore::new();

    let outcome = run_replay(
        &args(&file, Some("How do tides work?"), None),
        ChatConfig::default(),
        &store,
        Vec::new(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.saved_as.as_deref(), Some("How do tides work?"));
    let output = String::from_utf8(outcome.output).unwrap();
    assert!(output.contains("assistant: Tides come from the Moon."));
    assert!(output.contains("[tool called]"));

    let roles: Vec<_> = outcome
        .session
        .messages()
        .iter()
        .map(|message| message.role())
        .collect();
    assert_eq!(
        roles,
        [Role::System, Role::Assistant, Role::User, Role::Tool, Role::Assistant]
    );

    let saved = store.load("How do tides work?").await.unwrap().unwrap();
    assert_eq!(saved.get_messages(), outcome.session.messages());
}

#[tokio::test]
async fn test_replay_continues_saved_conversation() {
    let store = MemoryHistoryStore::new();
    let tree = MessageTree::from_messages(vec![
        WireMessage::system("s"),
        WireMessage::user("first"),
        WireMessage::assistant("one"),
    ])
    .unwrap();
    store.save("Numbers", &tree).await.unwrap();

    let file = events_file(&[
        r#"{"type":"chunk","data":"two"}"#,
        r#"{"type":"final"}"#,
        r#"{"type":"finish"}"#,
    ]);
    let outcome = run_replay(
        &args(&file, Some("second"), Some("Numbers")),
        ChatConfig::default(),
        &store,
        Vec::new(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.saved_as.as_deref(), Some("Numbers"));
    assert_eq!(store.list().await.unwrap(), ["Numbers"]);
    let saved = store.load("Numbers").await.unwrap().unwrap();
    let last = saved.get_messages().pop().unwrap();
    assert_eq!(last, WireMessage::assistant("two"));
}

#[tokio::test]
async fn test_replay_unknown_history_fails() {
    let file = events_file(&[r#"{"type":"finish"}"#]);
    let store = MemoryHistoryStore::new();
    let result = run_replay(
        &args(&file, None, Some("missing")),
        ChatConfig::default(),
        &store,
        Vec::new(),
    )
    .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_history_commands() {
    colored::control::set_override(false);
    let store = MemoryHistoryStore::new();
    let mut tree = MessageTree::from_messages(vec![
        WireMessage::system("s"),
        WireMessage::user("v1"),
    ])
    .unwrap();
    tree.edit_message(1, WireMessage::user("v2")).unwrap();
    store.save("alpha", &tree).await.unwrap();
    store.save("beta", &tree).await.unwrap();

    let mut out = Vec::new();
    run_history(&HistoryCommand::List, &store, &mut out).await.unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "  1  beta\n  2  alpha\n");

    let mut out = Vec::new();
    run_history(&HistoryCommand::Show { name: "alpha".into() }, &store, &mut out)
        .await
        .unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "system: s\nuser: [2/2] v2\n");

    let mut out = Vec::new();
    run_history(
        &HistoryCommand::Rename {
            old: "alpha".into(),
            new: "gamma".into(),
        },
        &store,
        &mut out,
    )
    .await
    .unwrap();
    assert_eq!(store.list().await.unwrap(), ["beta", "gamma"]);

    let err = run_history(
        &HistoryCommand::Rename {
            old: "beta".into(),
            new: "gamma".into(),
        },
        &store,
        &mut Vec::new(),
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("already exists"));

    let mut out = Vec::new();
    run_history(&HistoryCommand::Delete { name: "beta".into() }, &store, &mut out)
        .await
        .unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "deleted \"beta\"\n");
    assert_eq!(store.list().await.unwrap(), ["gamma"]);
}
