#![forbid(unsafe_code)]

//! `claude-relay` — Slack bridge binary.
//!
//! Bootstraps configuration, loads Slack credentials, and starts the
//! Socket Mode listener that relays thread messages to Claude Code
//! agent sessions.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use claude_relay::config::GlobalConfig;
use claude_relay::runner::executor::CliRunner;
use claude_relay::runner::AgentRunner;
use claude_relay::session::directory::SessionDirectory;
use claude_relay::session::queue::SessionQueue;
use claude_relay::slack::client::SlackService;
use claude_relay::slack::dispatch::{Dispatcher, Responder};
use claude_relay::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "claude-relay", about = "Slack bridge for Claude Code sessions", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Override the configured workspace root for the agent.
    #[arg(long)]
    workspace: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("claude-relay bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = GlobalConfig::load_from_path(&args.config)?;

    // Override workspace root from CLI if provided.
    if let Some(ws) = args.workspace {
        let canonical = ws
            .canonicalize()
            .map_err(|err| AppError::Config(format!("invalid workspace override: {err}")))?;
        config.default_workspace_root = canonical;
    }

    // Load Slack credentials from keyring / env vars.
    config.load_credentials().await?;

    let config = Arc::new(config);
    info!(
        workspace = %config.default_workspace_root.display(),
        authorized_users = config.authorized_user_ids.len(),
        "configuration loaded"
    );

    // ── Wire the core ───────────────────────────────────
    let directory = Arc::new(SessionDirectory::new());
    let queue = Arc::new(SessionQueue::new());
    let runner: Arc<dyn AgentRunner> = Arc::new(CliRunner::new(&config.agent));

    let service = Arc::new(SlackService::new(&config.slack)?);
    let responder: Arc<dyn Responder> = service.clone();

    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&config),
        directory,
        queue,
        runner,
        responder,
    ));

    // ── Start the Socket Mode listener ──────────────────
    let socket_task = service.spawn_socket_mode(dispatcher);
    info!("relay is running, waiting for mentions");

    // ── Wait for shutdown signal ────────────────────────
    shutdown_signal().await;
    info!("shutdown signal received");

    // In-flight jobs are abandoned by design; the session mapping is
    // volatile and rebuilt from scratch on the next start.
    socket_task.abort();
    info!("claude-relay shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
