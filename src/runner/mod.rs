//! Agent executor boundary: request/outcome types, the [`AgentRunner`]
//! trait, and the Claude CLI implementation.

pub mod codec;
pub mod event;
pub mod executor;

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use crate::Result;

/// One agent invocation: prompt plus the context it runs in.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// User prompt to pass to the agent.
    pub prompt: String,
    /// Working directory for the agent process.
    pub workspace_root: PathBuf,
    /// Optional model override.
    pub model: Option<String>,
    /// Maximum agentic turns; 0 means unlimited.
    pub max_turns: u32,
    /// Session token from a prior turn to resume, if any.
    pub resume: Option<String>,
}

/// Result of one agent invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// Final text output from the agent.
    pub output: String,
    /// Whether the agent reported the run as failed.
    pub is_error: bool,
    /// Number of agentic turns taken.
    pub num_turns: u32,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
    /// Session token for resuming this conversation; empty when the
    /// stream never surfaced one.
    pub session_id: String,
}

/// Interface between the dispatch layer and an agent implementation.
///
/// Implementations run one prompt to completion and return the final
/// outcome. Serialization of concurrent calls for the same conversation
/// is the caller's responsibility, not the runner's.
pub trait AgentRunner: Send + Sync {
    /// Run the agent for one prompt and return the final outcome.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ExecutorUnavailable`](crate::AppError::ExecutorUnavailable)
    /// when the agent CLI is not installed,
    /// [`AppError::ExecutorTimeout`](crate::AppError::ExecutorTimeout) when the
    /// run exceeds the configured limit, and
    /// [`AppError::ExecutorProtocol`](crate::AppError::ExecutorProtocol) or
    /// [`AppError::Executor`](crate::AppError::Executor) for stream or process
    /// failures.
    fn run(&self, request: RunRequest)
        -> Pin<Box<dyn Future<Output = Result<RunOutcome>> + Send + '_>>;
}
