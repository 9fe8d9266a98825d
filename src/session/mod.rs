//! Per-conversation session state: directory and serial queue.

pub mod directory;
pub mod queue;

use std::fmt::{Display, Formatter};

/// Key identifying one logical multi-turn conversation.
///
/// A Slack thread is addressed by its channel and the timestamp of the
/// thread's root message. A message outside any thread starts a new
/// thread rooted at itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversationKey {
    /// Channel the conversation lives in.
    pub channel: String,
    /// Timestamp of the thread's root message.
    pub thread_ts: String,
}

impl ConversationKey {
    /// Build a key from explicit channel and thread identifiers.
    #[must_use]
    pub fn new(channel: impl Into<String>, thread_ts: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            thread_ts: thread_ts.into(),
        }
    }

    /// Derive the key for an inbound message: the explicit thread
    /// timestamp when present, otherwise the message's own timestamp.
    #[must_use]
    pub fn from_message(channel: &str, message_ts: &str, thread_ts: Option<&str>) -> Self {
        Self::new(channel, thread_ts.unwrap_or(message_ts))
    }
}

impl Display for ConversationKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.channel, self.thread_ts)
    }
}
