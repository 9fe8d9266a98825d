//! Claude CLI invocation: process spawn, stream drain, and timeout.
//!
//! Spawns one headless `claude` process per run with:
//! - `kill_on_drop(true)` so abandoned processes are cleaned up.
//! - `env_clear()` + a safe variable allowlist so Slack tokens and other
//!   relay secrets never leak into the child's environment.
//! - An optional wall-clock limit: when the run exceeds it the process
//!   is killed and `AppError::ExecutorTimeout` is returned.

use std::future::Future;
use std::io::ErrorKind;
use std::pin::Pin;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::process::{ChildStdout, Command};
use tokio_util::codec::FramedRead;
use tracing::{debug, info};

use crate::config::AgentConfig;
use crate::runner::codec::StreamCodec;
use crate::runner::event::{OutcomeBuilder, StreamEvent};
use crate::runner::{AgentRunner, RunOutcome, RunRequest};
use crate::{AppError, Result};

/// Environment variables inherited by the spawned agent process.
///
/// Every other variable is stripped via `env_clear()` before the child
/// is launched, so the relay's Slack tokens are never visible to it.
pub const ALLOWED_ENV_VARS: &[&str] = &[
    "PATH",
    "HOME",
    "USER",
    "SHELL",
    "LANG",
    "TERM",
    "RUST_LOG",
    // Agent credentials and configuration.
    "ANTHROPIC_API_KEY",
    "CLAUDE_CONFIG_DIR",
    // Windows-specific variables.
    "USERPROFILE",
    "SystemRoot",
    "TEMP",
    "TMP",
    "USERNAME",
    "APPDATA",
    "LOCALAPPDATA",
    "COMSPEC",
];

/// [`AgentRunner`] implementation that shells out to the Claude CLI.
///
/// Each run invokes `claude --print --output-format stream-json` and
/// decodes the NDJSON stdout stream into a [`RunOutcome`]. Session
/// continuity is the caller's concern: pass the previous token in
/// [`RunRequest::resume`] and store the token returned in the outcome.
#[derive(Debug, Clone)]
pub struct CliRunner {
    cli_path: String,
    run_timeout: Option<Duration>,
}

impl CliRunner {
    /// Build a runner from agent configuration.
    #[must_use]
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            cli_path: config.cli_path.clone(),
            run_timeout: (config.run_timeout_seconds > 0)
                .then(|| Duration::from_secs(config.run_timeout_seconds)),
        }
    }

    async fn run_inner(&self, request: RunRequest) -> Result<RunOutcome> {
        info!(
            workspace = %request.workspace_root.display(),
            resuming = request.resume.is_some(),
            "starting agent run"
        );

        let mut cmd = Command::new(&self.cli_path);
        cmd.arg("--print")
            .args(["--output-format", "stream-json"])
            .arg("--verbose")
            .args(["--permission-mode", "bypassPermissions"]);

        if let Some(ref model) = request.model {
            cmd.args(["--model", model]);
        }
        if request.max_turns > 0 {
            cmd.args(["--max-turns", &request.max_turns.to_string()]);
        }
        if let Some(ref token) = request.resume {
            cmd.args(["--resume", token]);
        }
        cmd.arg(&request.prompt);

        // Strip inherited environment, then inject only the safe allowlist.
        cmd.env_clear();
        for &key in ALLOWED_ENV_VARS {
            if let Ok(val) = std::env::var(key) {
                cmd.env(key, val);
            }
        }

        cmd.current_dir(&request.workspace_root)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                AppError::ExecutorUnavailable(format!(
                    "agent CLI `{}` not found: {err}",
                    self.cli_path
                ))
            } else {
                AppError::Executor(format!("failed to spawn agent CLI: {err}"))
            }
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AppError::Executor("failed to capture agent stdout".into()))?;

        let outcome = match self.run_timeout {
            Some(limit) => match tokio::time::timeout(limit, drain_stream(stdout)).await {
                Ok(result) => result?,
                Err(_elapsed) => {
                    child.kill().await.ok();
                    return Err(AppError::ExecutorTimeout(limit.as_secs()));
                }
            },
            None => drain_stream(stdout).await?,
        };

        // Reap the child; it exits once stdout closes.
        child
            .wait()
            .await
            .map_err(|err| AppError::Executor(format!("failed to await agent exit: {err}")))?;

        info!(
            turns = outcome.num_turns,
            duration_ms = outcome.duration_ms,
            is_error = outcome.is_error,
            "agent run finished"
        );
        Ok(outcome)
    }
}

impl AgentRunner for CliRunner {
    fn run(
        &self,
        request: RunRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RunOutcome>> + Send + '_>> {
        Box::pin(self.run_inner(request))
    }
}

/// Decode the NDJSON stream line by line and fold it into an outcome.
async fn drain_stream(stdout: ChildStdout) -> Result<RunOutcome> {
    let mut frames = FramedRead::new(stdout, StreamCodec::new());
    let mut builder = OutcomeBuilder::new();

    while let Some(line) = frames.next().await {
        let line = line?;
        let event: StreamEvent = serde_json::from_str(&line)
            .map_err(|err| AppError::ExecutorProtocol(format!("unparseable agent event: {err}")))?;
        debug!(?event, "agent stream event");
        builder.observe(event);
    }

    Ok(builder.finish())
}
