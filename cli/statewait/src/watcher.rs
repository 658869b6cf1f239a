//! Per-target watch and evaluation loop.
//!
//! Each target runs one instance of [`run_target`]: a state machine that
//! starts `Pending`, consumes snapshot events in emission order, and ends
//! `Matched` on the first satisfying snapshot or `Failed` on deadline expiry
//! or a fatal source error. Recoverable stream disruptions are waited out
//! with capped exponential backoff; the shared deadline preempts both event
//! waits and backoff sleeps.
//!
//! The Kubernetes watch stream is adapted into a plain [`SnapshotEvent`]
//! stream first, so the loop itself can be driven by scripted streams in
//! tests without a cluster.

use std::time::Duration;

use futures::{Stream, StreamExt, stream};
use kube::Api;
use kube::api::DynamicObject;
use kube_runtime::watcher::{self, Event};
use statematch::TreeValue;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::args::{Target, TargetSelector};
use crate::backoff::ExponentialBackoff;
use crate::error::WaitError;

/// First retry interval after a stream disruption.
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
/// Cap on the retry interval.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// One event from a target's snapshot source.
#[derive(Debug)]
pub enum SnapshotEvent {
    /// A fresh observed snapshot, superseding any previous one
    Snapshot(TreeValue),
    /// Recoverable stream disruption; the source will re-subscribe
    Disconnected(String),
    /// Unrecoverable source error; no retry
    Fatal(WaitError),
}

/// Terminal state of one target's evaluation loop.
#[derive(Debug)]
pub enum MatchState {
    /// Still waiting for a satisfying snapshot
    #[allow(dead_code)] // Mid-run state; the loop itself only returns terminal states
    Pending,
    /// A snapshot satisfied the pattern; carries that snapshot
    Matched(TreeValue),
    /// The target can no longer match
    Failed(FailureReason),
}

/// Why a target stopped without matching.
#[derive(Debug)]
pub enum FailureReason {
    /// The shared deadline elapsed while still pending
    Timeout,
    /// A fatal source error
    Fatal(WaitError),
}

/// Adapt a Kubernetes watch on `target` into a [`SnapshotEvent`] stream.
///
/// Name targets watch with a `metadata.name` field selector, label targets
/// with the label selector. Delete events are dropped: absence is simply
/// not-yet-matched, and the watcher re-subscribes on its own after errors.
pub fn snapshot_stream(
    api: Api<DynamicObject>,
    target: &Target,
) -> impl Stream<Item = SnapshotEvent> + use<> {
    let config = match &target.selector {
        TargetSelector::Name(name) => {
            watcher::Config::default().fields(&format!("metadata.name={name}"))
        }
        TargetSelector::Labels(labels) => watcher::Config::default().labels(labels),
    };
    let target = target.to_string();

    watcher::watcher(api, config).flat_map(move |item| stream::iter(flatten_event(item, &target)))
}

/// Map one raw watcher item to zero or more snapshot events.
fn flatten_event(
    item: Result<Event<DynamicObject>, watcher::Error>,
    target: &str,
) -> Vec<SnapshotEvent> {
    match item {
        Ok(Event::Apply(object) | Event::InitApply(object)) => {
            to_snapshot(&object, target).into_iter().collect()
        }
        Ok(Event::Delete(_) | Event::Init | Event::InitDone) => Vec::new(),
        Err(error) => vec![classify_watch_error(error)],
    }
}

/// Serialize a watched object into the tree form the matcher understands.
fn to_snapshot(object: &DynamicObject, target: &str) -> Option<SnapshotEvent> {
    let converted = serde_yaml::to_value(object)
        .map_err(statematch::ParseError::from)
        .and_then(TreeValue::try_from);
    match converted {
        Ok(snapshot) => Some(SnapshotEvent::Snapshot(snapshot)),
        Err(error) => {
            warn!("skipping snapshot for {target} that could not be converted: {error}");
            None
        }
    }
}

/// Split watcher errors into fatal rejections and recoverable disruptions.
///
/// Permission denied and not-found responses will not get better on retry;
/// everything else (connection resets, expired resource versions, transient
/// API errors) is a disconnect the loop waits out.
fn classify_watch_error(error: watcher::Error) -> SnapshotEvent {
    match &error {
        watcher::Error::InitialListFailed(source)
        | watcher::Error::WatchStartFailed(source)
        | watcher::Error::WatchFailed(source) => {
            if let kube::Error::Api(response) = source {
                if is_fatal_status(response.code) {
                    return SnapshotEvent::Fatal(WaitError::Watch {
                        code: response.code,
                        message: response.message.clone(),
                    });
                }
            }
            if matches!(source, kube::Error::Auth(_)) {
                return SnapshotEvent::Fatal(WaitError::Watch {
                    code: 401,
                    message: source.to_string(),
                });
            }
            SnapshotEvent::Disconnected(error.to_string())
        }
        watcher::Error::WatchError(response) if is_fatal_status(response.code) => {
            SnapshotEvent::Fatal(WaitError::Watch {
                code: response.code,
                message: response.message.clone(),
            })
        }
        _ => SnapshotEvent::Disconnected(error.to_string()),
    }
}

fn is_fatal_status(code: u16) -> bool {
    matches!(code, 401 | 403 | 404)
}

/// Run one target's evaluation loop to a terminal state.
///
/// Consumes snapshot events in order, invoking the matcher per snapshot.
/// The first satisfying snapshot wins; later drift never un-matches. The
/// shared `deadline` interrupts event waits and backoff sleeps alike, so a
/// timeout fires within a bounded margin even mid-retry.
pub async fn run_target<S>(mut events: S, pattern: &TreeValue, deadline: Instant) -> MatchState
where
    S: Stream<Item = SnapshotEvent> + Unpin,
{
    let mut backoff = ExponentialBackoff::new(INITIAL_BACKOFF, MAX_BACKOFF);

    // The loop body runs while the target is Pending; every exit below is a
    // terminal state.
    loop {
        let event = tokio::select! {
            () = tokio::time::sleep_until(deadline) => {
                return MatchState::Failed(FailureReason::Timeout);
            }
            event = events.next() => event,
        };

        match event {
            Some(SnapshotEvent::Snapshot(observed)) => {
                // The stream is healthy again
                backoff.reset();
                if statematch::matches(pattern, &observed) {
                    return MatchState::Matched(observed);
                }
                debug!("snapshot did not satisfy the pattern, staying pending");
            }
            Some(SnapshotEvent::Disconnected(reason)) => {
                let delay = backoff.next_backoff();
                warn!("watch stream disconnected, retrying in {delay:?}: {reason}");
                tokio::select! {
                    () = tokio::time::sleep_until(deadline) => {
                        return MatchState::Failed(FailureReason::Timeout);
                    }
                    () = tokio::time::sleep(delay) => {}
                }
            }
            Some(SnapshotEvent::Fatal(error)) => {
                return MatchState::Failed(FailureReason::Fatal(error));
            }
            None => {
                return MatchState::Failed(FailureReason::Fatal(WaitError::StreamEnded));
            }
        }
    }
}
