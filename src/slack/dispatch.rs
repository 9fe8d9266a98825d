//! Dispatch coordinator: validates inbound messages, derives the
//! conversation key, and queues agent jobs for serial execution.
//!
//! Authorization and prompt checks reply immediately without enqueuing
//! anything. Accepted messages get a best-effort acknowledgement
//! reaction and a job that runs the agent, records the returned session
//! token, and posts the formatted reply in the originating thread.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::GlobalConfig;
use crate::runner::{AgentRunner, RunRequest};
use crate::session::directory::SessionDirectory;
use crate::session::queue::SessionQueue;
use crate::session::ConversationKey;
use crate::slack::format;
use crate::{AppError, Result};

/// Reaction added to a message the relay accepted.
pub const ACK_REACTION: &str = "eyes";

const NOT_AUTHORIZED_NOTICE: &str = "Sorry, you're not authorized to use this bot.";
const EMPTY_PROMPT_NOTICE: &str = "Please provide a prompt after mentioning me.";
const CLI_NOT_FOUND_NOTICE: &str =
    "❌ Claude CLI not found. Is Claude Code installed and on PATH?";
const UNEXPECTED_ERROR_NOTICE: &str = "❌ An unexpected error occurred. Check the bot logs.";

/// Normalized inbound message from the event source.
///
/// Platform-internal noise (edits, bot echoes, subtyped messages) is
/// filtered out before one of these is built, and the platform's
/// addressing prefix has already been stripped from `text`.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Sender's user ID.
    pub sender: String,
    /// Channel the message was posted in.
    pub channel: String,
    /// Timestamp of the message itself.
    pub message_ts: String,
    /// Timestamp of the enclosing thread, when the message is a reply.
    pub thread_ts: Option<String>,
    /// Message text with any addressing prefix removed.
    pub text: String,
}

/// Delivery of text and reactions back to the chat platform.
///
/// Both operations are best-effort from the dispatcher's point of view:
/// failures are logged by the caller and never retried or surfaced to
/// the sender.
pub trait Responder: Send + Sync {
    /// Post `text` into a channel thread.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Slack`](crate::AppError::Slack) if delivery fails.
    fn post_message(
        &self,
        channel: &str,
        thread_ts: &str,
        text: &str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Add an emoji reaction to a message.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Slack`](crate::AppError::Slack) if delivery fails.
    fn add_reaction(
        &self,
        channel: &str,
        ts: &str,
        name: &str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Coordinates inbound messages across the session directory, the
/// per-conversation queue, the agent runner, and the responder.
pub struct Dispatcher {
    config: Arc<GlobalConfig>,
    directory: Arc<SessionDirectory>,
    queue: Arc<SessionQueue>,
    runner: Arc<dyn AgentRunner>,
    responder: Arc<dyn Responder>,
}

impl Dispatcher {
    /// Wire a dispatcher from its collaborators.
    #[must_use]
    pub fn new(
        config: Arc<GlobalConfig>,
        directory: Arc<SessionDirectory>,
        queue: Arc<SessionQueue>,
        runner: Arc<dyn AgentRunner>,
        responder: Arc<dyn Responder>,
    ) -> Self {
        Self {
            config,
            directory,
            queue,
            runner,
            responder,
        }
    }

    /// Validate an inbound message and enqueue an agent job for it.
    ///
    /// Returns once the job is queued; the agent run itself happens on
    /// the conversation's consumer task, strictly after every earlier
    /// job for the same conversation.
    pub async fn handle(&self, message: InboundMessage) {
        let key = ConversationKey::from_message(
            &message.channel,
            &message.message_ts,
            message.thread_ts.as_deref(),
        );

        if let Err(err) = self.config.ensure_authorized(&message.sender) {
            warn!(sender = %message.sender, %err, "rejected message");
            self.notify(&key, NOT_AUTHORIZED_NOTICE).await;
            return;
        }

        let prompt = match extract_prompt(&message.text) {
            Ok(prompt) => prompt,
            Err(err) => {
                info!(sender = %message.sender, %err, "rejected message");
                self.notify(&key, EMPTY_PROMPT_NOTICE).await;
                return;
            }
        };

        info!(sender = %message.sender, %key, "accepted prompt");

        // Best-effort acknowledgement on the triggering message.
        if let Err(err) = self
            .responder
            .add_reaction(&message.channel, &message.message_ts, ACK_REACTION)
            .await
        {
            warn!(%err, %key, "failed to add acknowledgement reaction");
        }

        let config = Arc::clone(&self.config);
        let directory = Arc::clone(&self.directory);
        let runner = Arc::clone(&self.runner);
        let responder = Arc::clone(&self.responder);
        let job_key = key.clone();

        self.queue
            .submit(key, async move {
                run_job(
                    &config,
                    &directory,
                    runner.as_ref(),
                    responder.as_ref(),
                    &job_key,
                    prompt,
                )
                .await
            })
            .await;
    }

    async fn notify(&self, key: &ConversationKey, text: &str) {
        if let Err(err) = self
            .responder
            .post_message(&key.channel, &key.thread_ts, text)
            .await
        {
            warn!(%err, %key, "failed to post notice");
        }
    }
}

/// Trimmed prompt text, or `EmptyPrompt` when nothing is left.
fn extract_prompt(text: &str) -> Result<String> {
    let prompt = text.trim();
    if prompt.is_empty() {
        return Err(AppError::EmptyPrompt("no text after the mention".into()));
    }
    Ok(prompt.to_owned())
}

/// Run the agent for one conversation turn and relay the result.
///
/// Executor-level failures post a fixed user-facing notice and are then
/// propagated so the queue's consumer logs them; the consumer carries on
/// with the next job either way.
async fn run_job(
    config: &GlobalConfig,
    directory: &SessionDirectory,
    runner: &dyn AgentRunner,
    responder: &dyn Responder,
    key: &ConversationKey,
    prompt: String,
) -> Result<()> {
    let resume = directory.lookup(key).await;
    let request = RunRequest {
        prompt,
        workspace_root: config.default_workspace_root.clone(),
        model: config.agent.model.clone(),
        max_turns: config.agent.max_turns,
        resume,
    };

    match runner.run(request).await {
        Ok(outcome) => {
            if !outcome.session_id.is_empty() {
                directory.record(key, outcome.session_id.clone()).await;
            }

            let reply = format::render_outcome(&outcome, config.max_message_length);
            info!(
                %key,
                turns = outcome.num_turns,
                duration_ms = outcome.duration_ms,
                is_error = outcome.is_error,
                "relaying agent result"
            );

            if let Err(err) = responder
                .post_message(&key.channel, &key.thread_ts, &reply)
                .await
            {
                warn!(%err, %key, "failed to post agent result");
            }
            Ok(())
        }
        Err(err) => {
            let notice = match &err {
                AppError::ExecutorUnavailable(_) => CLI_NOT_FOUND_NOTICE.to_owned(),
                AppError::ExecutorTimeout(secs) => {
                    format!("❌ The agent run timed out after {secs}s.")
                }
                _ => UNEXPECTED_ERROR_NOTICE.to_owned(),
            };

            if let Err(post_err) = responder
                .post_message(&key.channel, &key.thread_ts, &notice)
                .await
            {
                warn!(%post_err, %key, "failed to post error notice");
            }

            Err(err)
        }
    }
}
