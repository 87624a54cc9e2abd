use chrono::Utc;
use session_monitor::bridge::UpdateEvent;
use session_monitor::{
    Conversation, Message, MessageType, Session, SessionStatus, SessionStore, ipc, server,
};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::{sleep, timeout};

fn make_session(id: &str, status: SessionStatus) -> Session {
    Session {
        id: id.into(),
        pid: 4242,
        project_name: "api-server".into(),
        project_path: "/home/dev/api-server".into(),
        git_branch: "main".into(),
        first_prompt: "Fix the flaky test".into(),
        summary: "Flaky test fix".into(),
        message_count: 3,
        modified: Utc::now(),
        status,
        latest_message: "Running the suite".into(),
    }
}

/// Retry until the server has bound the socket
async fn send(path: &Path, event: &UpdateEvent) {
    for _ in 0..100 {
        if ipc::send_event(path, event).await.is_ok() {
            return;
        }
        sleep(Duration::from_millis(20)).await;
    }
    panic!("server never accepted a connection at {}", path.display());
}

async fn wait_for(mut ready: impl FnMut() -> bool) {
    timeout(Duration::from_secs(5), async {
        while !ready() {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn pushed_sessions_replace_store() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("monitor.sock");
    let store = SessionStore::new();
    store.replace_all(vec![make_session("stale", SessionStatus::Working)]);

    let server_path = path.clone();
    let server_store = store.clone();
    let server = tokio::spawn(async move { server::start_at(&server_path, server_store).await });

    let event = UpdateEvent::SessionsUpdated(vec![
        make_session("a", SessionStatus::NeedsPermission),
        make_session("b", SessionStatus::Connecting),
    ]);
    send(&path, &event).await;

    wait_for(|| store.get("a").is_some()).await;
    assert_eq!(store.len(), 2);
    assert!(store.get("stale").is_none());
    server.abort();
}

#[tokio::test]
async fn pushed_conversation_is_set() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("monitor.sock");
    let store = SessionStore::new();

    let server_path = path.clone();
    let server_store = store.clone();
    let server = tokio::spawn(async move { server::start_at(&server_path, server_store).await });

    let conversation = Conversation {
        session_id: "not-in-store".into(),
        messages: vec![Message {
            timestamp: Utc::now(),
            message_type: MessageType::User,
            content: "hello".into(),
        }],
    };
    send(&path, &UpdateEvent::ConversationUpdated(conversation.clone())).await;

    wait_for(|| store.conversation().is_some()).await;
    assert_eq!(store.conversation(), Some(conversation));
    assert!(store.is_empty());
    server.abort();
}

#[tokio::test]
async fn malformed_lines_are_skipped() {
    use tokio::io::AsyncWriteExt;
    use tokio::net::UnixStream;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("monitor.sock");
    let store = SessionStore::new();

    let server_path = path.clone();
    let server_store = store.clone();
    let server = tokio::spawn(async move { server::start_at(&server_path, server_store).await });

    // Wait for the listener with a harmless push
    send(&path, &UpdateEvent::SessionsUpdated(Vec::new())).await;

    let valid = serde_json::to_string(&UpdateEvent::SessionsUpdated(vec![make_session(
        "after-garbage",
        SessionStatus::WaitingForInput,
    )]))
    .unwrap();
    let mut stream = UnixStream::connect(&path).await.unwrap();
    stream
        .write_all(format!("not json\n\n{{\"event\":\"unknown\"}}\n{valid}\n").as_bytes())
        .await
        .unwrap();
    stream.shutdown().await.unwrap();

    wait_for(|| store.get("after-garbage").is_some()).await;
    assert_eq!(store.len(), 1);
    server.abort();
}
