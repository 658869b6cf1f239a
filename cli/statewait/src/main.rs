//! statewait
//!
//! Blocks until the live state of one or more Kubernetes resources satisfies
//! a caller-supplied partial document (the "pattern"), then exits 0. Used in
//! deployment pipelines to wait for a rollout to reach a desired condition
//! without spelling out the full resource.
//!
//! Exit codes: 0 all targets matched, 1 deadline elapsed, 2 fatal error
//! (malformed pattern, unknown kind, permission denied).

mod aggregate;
mod args;
mod backoff;
mod controller;
mod discovery;
mod error;
mod watcher;
#[cfg(test)]
mod watcher_test;

use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use kube::Client;
use statematch::TreeValue;
use tokio::io::AsyncReadExt;
use tokio::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::aggregate::RunResult;
use crate::args::Args;
use crate::controller::WaitController;
use crate::error::WaitError;

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so stdout carries only the matched resource state
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args).await {
        Ok(RunResult::AllMatched(matched)) => {
            for (target, snapshot) in matched {
                info!("{target} matched");
                match serde_yaml::to_string(&snapshot) {
                    Ok(document) => println!("{document}"),
                    Err(render_error) => {
                        warn!("failed to render matched state for {target}: {render_error}");
                    }
                }
            }
            ExitCode::SUCCESS
        }
        Ok(RunResult::TimedOut(unmatched)) => {
            let names: Vec<String> = unmatched.iter().map(ToString::to_string).collect();
            error!("deadline elapsed waiting for: {}", names.join(", "));
            ExitCode::from(1)
        }
        Ok(RunResult::Error { target, error }) => {
            error!("{target}: {error}");
            ExitCode::from(2)
        }
        Err(fatal) => {
            error!("{fatal}");
            ExitCode::from(2)
        }
    }
}

/// Parse the pattern, resolve the kind, and drive the run to its outcome.
async fn run(args: Args) -> Result<RunResult, WaitError> {
    let pattern = read_pattern(args.file.as_deref()).await?;

    let client = Client::try_default().await?;
    let api = discovery::resolve_api(&client, &args).await?;

    let deadline = Instant::now() + Duration::from_secs(args.timeout);
    let controller = WaitController::new(api, pattern, args.targets(), deadline);
    Ok(controller.run().await)
}

/// Read and parse the pattern document from a file or standard input.
///
/// Malformed input is fatal before any watching begins.
async fn read_pattern(path: Option<&Path>) -> Result<TreeValue, WaitError> {
    let raw_bytes = match path {
        Some(path) if path != Path::new("-") => tokio::fs::read(path).await?,
        _ => {
            let mut buf = Vec::new();
            tokio::io::stdin().read_to_end(&mut buf).await?;
            buf
        }
    };
    Ok(statematch::from_yaml_slice(&raw_bytes)?)
}
