//! Tests for push channel implementations

use prometheus_notify::core::{Destination, PushChannel, PushMessage};
use prometheus_notify::infra::{FilePushChannel, InMemoryPushChannel, SessionPushChannel};

fn event(text: &str) -> PushMessage {
    PushMessage::Event {
        message: text.to_string(),
    }
}

#[tokio::test]
async fn test_in_memory_channel_deliver_and_fetch() {
    let channel = InMemoryPushChannel::new();
    let dest = Destination::user(1);

    channel.send(&dest, event("first")).await.unwrap();
    let before_second = prometheus_notify::util::now_ms();
    channel.send(&dest, event("second")).await.unwrap();

    let all = channel.fetch(&dest, None, 10);
    assert_eq!(all.len(), 2);
    let recent = channel.fetch(&dest, Some(before_second), 10);
    assert_eq!(recent.last().unwrap().message.text(), "second");
}

#[tokio::test]
async fn test_file_channel_writes_lines() {
    let dir = std::env::temp_dir().join(format!("notify-push-{}", uuid::Uuid::new_v4()));
    let channel = FilePushChannel::open(&dir, "push").unwrap();
    channel.send(&Destination::user(2), event("a")).await.unwrap();
    channel.send(&Destination::user(3), event("b")).await.unwrap();

    let contents = std::fs::read_to_string(channel.path()).unwrap();
    assert_eq!(contents.lines().count(), 2);
    assert!(contents.contains(r#""type":"event""#));
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_session_channel_receives_only_own_messages() {
    let channel = SessionPushChannel::new();
    let mut mine = channel.subscribe(10);
    let mut theirs = channel.subscribe(11);

    channel.send(&Destination::user(10), event("for 10")).await.unwrap();

    assert_eq!(mine.recv().await.unwrap(), event("for 10"));
    assert!(theirs.try_recv().is_err());
    assert_eq!(channel.session_count(10), 1);
}

#[tokio::test]
async fn test_session_channel_fans_out_to_every_session() {
    let channel = SessionPushChannel::new();
    let mut sessions: Vec<_> = (0..3).map(|_| channel.subscribe(20)).collect();

    channel.send(&Destination::user(20), event("broadcast")).await.unwrap();

    let received = futures::future::join_all(sessions.iter_mut().map(|rx| rx.recv())).await;
    assert!(received.iter().all(|m| m.as_ref() == Some(&event("broadcast"))));
    assert_eq!(channel.session_count(20), 3);
}
