//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Slack API or Socket Mode failure.
    Slack(String),
    /// Sender is not in the configured allow-set.
    Unauthorized(String),
    /// Inbound message carried no prompt text after stripping the mention.
    EmptyPrompt(String),
    /// Agent CLI binary is missing or not installed.
    ExecutorUnavailable(String),
    /// Agent run exceeded the configured time limit (seconds).
    ExecutorTimeout(u64),
    /// Agent stream emitted data the decoder cannot understand.
    ExecutorProtocol(String),
    /// Agent process spawn or lifecycle failure.
    Executor(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Slack(msg) => write!(f, "slack: {msg}"),
            Self::Unauthorized(msg) => write!(f, "unauthorized: {msg}"),
            Self::EmptyPrompt(msg) => write!(f, "empty prompt: {msg}"),
            Self::ExecutorUnavailable(msg) => write!(f, "executor unavailable: {msg}"),
            Self::ExecutorTimeout(secs) => write!(f, "executor timeout: run exceeded {secs}s"),
            Self::ExecutorProtocol(msg) => write!(f, "executor protocol: {msg}"),
            Self::Executor(msg) => write!(f, "executor: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

// Required by `tokio_util::codec::Decoder`, whose error type must absorb
// underlying I/O failures.
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
