//! Integration tests for mirroring a session to the remote script endpoint.
//!
//! A local mock server stands in for the endpoint. Pushes are fire-and-forget,
//! so tests poll the mock until the request shows up.

use std::time::Duration;

use chrono::NaiveDate;
use focusflow_core::countdown::{self, Command, Exit, RunOptions};
use focusflow_core::{
    Event, FixedClock, FocusSession, MemoryStore, Mode, Persistence, RemoteClient, TimerSettings,
};
use mockito::{Matcher, Mock, ServerGuard};
use tokio::sync::mpsc;

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn session_with(server: &ServerGuard) -> FocusSession<MemoryStore> {
    let remote =
        RemoteClient::new(&format!("{}/exec", server.url()), Duration::from_secs(5)).unwrap();
    FocusSession::load(Persistence::new(MemoryStore::new()))
        .with_clock(FixedClock(day("2024-01-01")))
        .with_remote(remote)
}

async fn wait_for(mock: &Mock) {
    for _ in 0..100 {
        if mock.matched_async().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_pull_applies_remote_settings_and_history() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/exec")
        .match_query(Matcher::UrlEncoded("action".into(), "getAllDurations".into()))
        .with_status(200)
        .with_body(r#"{"focus": 50, "shortBreak": 10, "longBreak": 30}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/exec")
        .match_query(Matcher::UrlEncoded("action".into(), "getHistory".into()))
        .with_status(200)
        .with_body(r#"{"2023-12-30": 75, "bogus": 3}"#)
        .create_async()
        .await;

    let mut session = session_with(&server);
    let (events, errors) = session.pull_remote().await.unwrap();

    assert!(errors.is_empty());
    assert!(matches!(events.as_slice(), [Event::SettingsChanged { .. }]));
    assert_eq!(session.settings(), &TimerSettings::new(50, 10, 30).unwrap());
    assert_eq!(session.state().seconds_remaining, 50 * 60);
    assert_eq!(session.history().minutes_on(day("2023-12-30")), 75);
    assert_eq!(session.history().active_days(), 1);
}

#[tokio::test]
async fn test_pull_keeps_local_state_on_failure() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/exec")
        .match_query(Matcher::UrlEncoded("action".into(), "getAllDurations".into()))
        .with_status(503)
        .create_async()
        .await;
    server
        .mock("GET", "/exec")
        .match_query(Matcher::UrlEncoded("action".into(), "getHistory".into()))
        .with_status(200)
        .with_body("not json")
        .create_async()
        .await;

    let mut session = session_with(&server);
    session.skip(true);
    let before = session.history().clone();

    let (events, errors) = session.pull_remote().await.unwrap();
    assert!(events.is_empty());
    assert_eq!(errors.len(), 2);
    assert_eq!(session.settings(), &TimerSettings::default());
    assert_eq!(session.history(), &before);
}

#[tokio::test]
async fn test_focus_completion_pushes_increment() {
    let mut server = mockito::Server::new_async().await;
    let increment = server
        .mock("GET", "/exec")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("action".into(), "incrementHistory".into()),
            Matcher::UrlEncoded("key".into(), "2024-01-01".into()),
            Matcher::UrlEncoded("value".into(), "25".into()),
        ]))
        .with_status(200)
        .create_async()
        .await;

    let mut session = session_with(&server);
    session.skip(true);
    wait_for(&increment).await;
    assert_eq!(session.history().minutes_on(day("2024-01-01")), 25);
}

#[tokio::test]
async fn test_settings_change_pushes_each_duration() {
    let mut server = mockito::Server::new_async().await;
    let mut mocks = Vec::new();
    for (key, value) in [("focus", "40"), ("shortBreak", "8"), ("longBreak", "25")] {
        let mock = server
            .mock("GET", "/exec")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("action".into(), "updateDuration".into()),
                Matcher::UrlEncoded("key".into(), key.into()),
                Matcher::UrlEncoded("value".into(), value.into()),
            ]))
            .with_status(200)
            .create_async()
            .await;
        mocks.push(mock);
    }

    let mut session = session_with(&server);
    session
        .apply_settings(TimerSettings::new(40, 8, 25).unwrap())
        .unwrap();
    for mock in &mocks {
        wait_for(mock).await;
    }
}

#[tokio::test]
async fn test_unreachable_endpoint_does_not_block_session() {
    let remote = RemoteClient::new("http://127.0.0.1:9/exec", Duration::from_millis(200)).unwrap();
    let mut session = FocusSession::load(Persistence::new(MemoryStore::new()))
        .with_clock(FixedClock(day("2024-01-01")))
        .with_remote(remote);

    let events = session.skip(true);
    assert_eq!(events.len(), 2);
    assert_eq!(session.state().mode, Mode::ShortBreak);

    let (_, errors) = session.pull_remote().await.unwrap();
    assert_eq!(errors.len(), 2);
    assert_eq!(session.history().minutes_on(day("2024-01-01")), 25);
}

#[test]
fn test_completion_push_lands_before_runtime_shutdown() {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    let delivered = rt.block_on(async {
        let mut server = mockito::Server::new_async().await;
        let increment = server
            .mock("GET", "/exec")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("action".into(), "incrementHistory".into()),
                Matcher::UrlEncoded("key".into(), "2024-01-01".into()),
                Matcher::UrlEncoded("value".into(), "25".into()),
            ]))
            .with_status(200)
            .create_async()
            .await;

        let mut session = session_with(&server);
        let (cmd_tx, cmd_rx) = mpsc::channel(4);
        let (_remote_tx, remote_rx) = mpsc::channel(1);
        cmd_tx.send(Command::Skip { confirmed: true }).await.unwrap();

        let exit = countdown::run(
            &mut session,
            cmd_rx,
            remote_rx,
            std::future::pending(),
            RunOptions { exit_on_completion: true },
            |_, _| {},
        )
        .await;
        assert_eq!(exit, Exit::Completed);
        assert_eq!(session.history().minutes_on(day("2024-01-01")), 25);

        // Nothing else is awaited after this; the runtime is dropped right away.
        assert_eq!(session.flush_remote(Duration::from_secs(5)).await, 0);
        assert_eq!(session.pending_pushes(), 0);
        increment.matched_async().await
    });
    rt.shutdown_background();

    assert!(delivered, "incrementHistory must reach the endpoint before exit");
}

#[tokio::test]
async fn test_flush_gives_up_after_timeout() {
    // Accepts the connection but never answers.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = format!("http://{}/exec", listener.local_addr().unwrap());
    let remote = RemoteClient::new(&endpoint, Duration::from_secs(30)).unwrap();
    let mut session = FocusSession::load(Persistence::new(MemoryStore::new()))
        .with_clock(FixedClock(day("2024-01-01")))
        .with_remote(remote);

    session.skip(true);
    assert_eq!(session.flush_remote(Duration::from_millis(100)).await, 1);
    drop(listener);
}
