//! Run-level aggregation across targets.
//!
//! Combines the per-target terminal states into the single outcome that
//! decides the process exit code.

use statematch::TreeValue;

use crate::args::Target;
use crate::error::WaitError;
use crate::watcher::{FailureReason, MatchState};

/// Aggregate outcome of a run across all targets.
#[derive(Debug)]
pub enum RunResult {
    /// Every target matched; carries each target's matching snapshot.
    /// Exit code 0.
    AllMatched(Vec<(Target, TreeValue)>),
    /// The deadline elapsed with at least one target unmatched and no fatal
    /// error; carries the unmatched targets. Exit code 1.
    TimedOut(Vec<Target>),
    /// A target hit a fatal source error. Exit code 2.
    Error {
        /// The target that failed
        target: Target,
        /// The fatal error
        error: WaitError,
    },
}

/// Combine per-target states into the run outcome.
///
/// A fatal failure on any target wins over everything else; otherwise the
/// run succeeded iff every target matched, and timed out if any did not.
pub fn aggregate(states: Vec<(Target, MatchState)>) -> RunResult {
    let mut matched = Vec::new();
    let mut unmatched = Vec::new();
    let mut fatal = None;

    for (target, state) in states {
        match state {
            MatchState::Matched(snapshot) => matched.push((target, snapshot)),
            MatchState::Pending | MatchState::Failed(FailureReason::Timeout) => {
                unmatched.push(target);
            }
            MatchState::Failed(FailureReason::Fatal(error)) => {
                if fatal.is_none() {
                    fatal = Some((target, error));
                }
            }
        }
    }

    if let Some((target, error)) = fatal {
        return RunResult::Error { target, error };
    }
    if unmatched.is_empty() {
        RunResult::AllMatched(matched)
    } else {
        RunResult::TimedOut(unmatched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::TargetSelector;

    fn target(name: &str) -> Target {
        Target {
            kind: "Deployment".to_string(),
            selector: TargetSelector::Name(name.to_string()),
        }
    }

    fn snapshot() -> TreeValue {
        statematch::from_yaml_str("status:\n  availableReplicas: 4\n")
            .unwrap_or_else(|e| panic!("test document failed to parse: {e}"))
    }

    #[test]
    fn test_all_matched_when_every_target_matched() {
        let states = vec![
            (target("web"), MatchState::Matched(snapshot())),
            (target("api"), MatchState::Matched(snapshot())),
        ];
        let result = aggregate(states);
        assert!(matches!(result, RunResult::AllMatched(matched) if matched.len() == 2));
    }

    #[test]
    fn test_timed_out_when_any_target_pending() {
        let states = vec![
            (target("web"), MatchState::Matched(snapshot())),
            (target("api"), MatchState::Failed(FailureReason::Timeout)),
            (target("worker"), MatchState::Pending),
        ];
        let result = aggregate(states);
        let RunResult::TimedOut(unmatched) = result else {
            panic!("expected TimedOut, got {result:?}");
        };
        assert_eq!(unmatched.len(), 2);
    }

    #[test]
    fn test_fatal_error_wins_over_timeout() {
        let states = vec![
            (target("web"), MatchState::Failed(FailureReason::Timeout)),
            (
                target("api"),
                MatchState::Failed(FailureReason::Fatal(WaitError::Watch {
                    code: 404,
                    message: "namespace not found".to_string(),
                })),
            ),
        ];
        let result = aggregate(states);
        let RunResult::Error { target, error } = result else {
            panic!("expected Error, got {result:?}");
        };
        assert_eq!(target.to_string(), "Deployment/api");
        assert!(matches!(error, WaitError::Watch { code: 404, .. }));
    }

    #[test]
    fn test_empty_run_is_all_matched() {
        // clap guarantees at least one target, but the aggregate must not
        // invent a failure for an empty table
        assert!(matches!(aggregate(Vec::new()), RunResult::AllMatched(_)));
    }
}
