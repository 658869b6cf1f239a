//! Run orchestration.
//!
//! Spawns one evaluation loop per target, all sharing a single deadline, and
//! collects their terminal states into the run outcome. Targets never block
//! one another; a fatal failure on any target aborts the rest immediately
//! instead of letting them run out the clock.

use kube::Api;
use kube::api::DynamicObject;
use statematch::TreeValue;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{error, info};

use crate::aggregate::{RunResult, aggregate};
use crate::args::Target;
use crate::watcher::{FailureReason, MatchState, run_target, snapshot_stream};

/// Drives the evaluation loops for one run.
pub struct WaitController {
    api: Api<DynamicObject>,
    pattern: TreeValue,
    targets: Vec<Target>,
    deadline: Instant,
}

impl std::fmt::Debug for WaitController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaitController")
            .field("targets", &self.targets)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

impl WaitController {
    /// Create a controller for the given targets, pattern and deadline.
    #[must_use]
    pub fn new(
        api: Api<DynamicObject>,
        pattern: TreeValue,
        targets: Vec<Target>,
        deadline: Instant,
    ) -> Self {
        Self {
            api,
            pattern,
            targets,
            deadline,
        }
    }

    /// Run every target's loop to a terminal state and aggregate.
    pub async fn run(self) -> RunResult {
        let mut tasks = JoinSet::new();
        for target in self.targets {
            info!("watching {target}");
            let api = self.api.clone();
            let pattern = self.pattern.clone();
            let deadline = self.deadline;
            tasks.spawn(async move {
                let events = std::pin::pin!(snapshot_stream(api, &target));
                let state = run_target(events, &pattern, deadline).await;
                (target, state)
            });
        }

        let mut states = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((target, state)) => {
                    let fatal = matches!(state, MatchState::Failed(FailureReason::Fatal(_)));
                    states.push((target, state));
                    if fatal {
                        // Fatal errors short-circuit the whole run
                        tasks.abort_all();
                        while let Some(rest) = tasks.join_next().await {
                            if let Ok(pair) = rest {
                                states.push(pair);
                            }
                        }
                        break;
                    }
                }
                Err(join_error) if join_error.is_cancelled() => {}
                Err(join_error) => {
                    error!("evaluation loop task failed: {join_error}");
                }
            }
        }

        aggregate(states)
    }
}
