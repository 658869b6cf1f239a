//! Unit tests for the per-target evaluation loop.
//!
//! The loop is driven with scripted [`SnapshotEvent`] streams instead of a
//! live watch, and the tokio clock is paused so backoff sleeps and deadlines
//! advance instantly and deterministically.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use statematch::{TreeValue, from_yaml_str};
use tokio::time::Instant;

use crate::error::WaitError;
use crate::watcher::{FailureReason, MatchState, SnapshotEvent, run_target};

fn parse(input: &str) -> TreeValue {
    from_yaml_str(input).unwrap_or_else(|e| panic!("test document failed to parse: {e}"))
}

fn replica_pattern() -> TreeValue {
    parse("status:\n  availableReplicas: 4\nspec:\n  replicas: 4\n")
}

fn snapshot(available: u32) -> SnapshotEvent {
    SnapshotEvent::Snapshot(parse(&format!(
        "status:\n  availableReplicas: {available}\nspec:\n  replicas: 4\n"
    )))
}

/// A finite script followed by silence, like a healthy watch that simply has
/// nothing more to report.
fn scripted(
    events: Vec<SnapshotEvent>,
) -> impl futures::Stream<Item = SnapshotEvent> + Unpin {
    stream::iter(events).chain(stream::pending())
}

#[tokio::test(start_paused = true)]
async fn test_first_matching_snapshot_wins() {
    let deadline = Instant::now() + Duration::from_secs(300);
    let events = scripted(vec![snapshot(3), snapshot(4), snapshot(0)]);

    let state = run_target(events, &replica_pattern(), deadline).await;
    let MatchState::Matched(matched) = state else {
        panic!("expected Matched, got {state:?}");
    };
    // The matching snapshot is the one carried out; later drift is ignored
    assert!(statematch::matches(&replica_pattern(), &matched));
}

#[tokio::test(start_paused = true)]
async fn test_stays_pending_until_deadline_without_match() {
    let start = Instant::now();
    let deadline = start + Duration::from_secs(30);
    let events = scripted(vec![snapshot(3), snapshot(2)]);

    let state = run_target(events, &replica_pattern(), deadline).await;
    assert!(matches!(state, MatchState::Failed(FailureReason::Timeout)));
    // With a paused clock the loop lands exactly on the deadline
    assert_eq!(Instant::now(), deadline);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_then_match_recovers() {
    let deadline = Instant::now() + Duration::from_secs(300);
    let events = scripted(vec![
        snapshot(3),
        SnapshotEvent::Disconnected("connection reset".to_string()),
        snapshot(4),
    ]);

    let state = run_target(events, &replica_pattern(), deadline).await;
    assert!(matches!(state, MatchState::Matched(_)));
}

#[tokio::test(start_paused = true)]
async fn test_deadline_preempts_backoff_wait() {
    let start = Instant::now();
    let deadline = start + Duration::from_millis(500);
    // The backoff after the disconnect wants a full second; the deadline
    // must cut it short rather than wait it out
    let events = scripted(vec![SnapshotEvent::Disconnected("gone".to_string())]);

    let state = run_target(events, &replica_pattern(), deadline).await;
    assert!(matches!(state, MatchState::Failed(FailureReason::Timeout)));
    assert_eq!(Instant::now(), deadline);
}

#[tokio::test(start_paused = true)]
async fn test_fatal_error_fails_immediately_without_retry() {
    let start = Instant::now();
    let deadline = start + Duration::from_secs(300);
    let events = scripted(vec![SnapshotEvent::Fatal(WaitError::Watch {
        code: 404,
        message: "the server could not find the requested resource".to_string(),
    })]);

    let state = run_target(events, &replica_pattern(), deadline).await;
    let MatchState::Failed(FailureReason::Fatal(error)) = state else {
        panic!("expected fatal failure, got {state:?}");
    };
    assert!(matches!(error, WaitError::Watch { code: 404, .. }));
    // No backoff was taken: the clock never advanced
    assert_eq!(Instant::now(), start);
}

#[tokio::test(start_paused = true)]
async fn test_repeated_disconnects_back_off_but_still_match() {
    let deadline = Instant::now() + Duration::from_secs(300);
    let events = scripted(vec![
        SnapshotEvent::Disconnected("reset".to_string()),
        SnapshotEvent::Disconnected("reset".to_string()),
        SnapshotEvent::Disconnected("reset".to_string()),
        snapshot(4),
    ]);

    let start = Instant::now();
    let state = run_target(events, &replica_pattern(), deadline).await;
    assert!(matches!(state, MatchState::Matched(_)));
    // Three backoffs: 1s + 2s + 4s
    assert_eq!(Instant::now() - start, Duration::from_secs(7));
}

#[tokio::test(start_paused = true)]
async fn test_stream_end_is_fatal() {
    let deadline = Instant::now() + Duration::from_secs(300);
    let events = stream::iter(vec![snapshot(3)]);

    let state = run_target(events, &replica_pattern(), deadline).await;
    let MatchState::Failed(FailureReason::Fatal(error)) = state else {
        panic!("expected fatal failure, got {state:?}");
    };
    assert!(matches!(error, WaitError::StreamEnded));
}
