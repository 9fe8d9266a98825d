//! In-memory directory mapping conversations to agent session tokens.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::debug;

use crate::session::ConversationKey;

/// Volatile mapping of conversation keys to agent session tokens.
///
/// Each conversation maps to at most one session token, allowing the
/// agent to resume a thread's context on the next turn. Entries live
/// for the process lifetime; nothing is persisted. The map is guarded
/// by an explicit `RwLock` so lookups and writes are safe from any
/// worker thread of the runtime.
#[derive(Debug, Default)]
pub struct SessionDirectory {
    sessions: RwLock<HashMap<ConversationKey, String>>,
}

impl SessionDirectory {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the session token recorded for a conversation.
    pub async fn lookup(&self, key: &ConversationKey) -> Option<String> {
        self.sessions.read().await.get(key).cloned()
    }

    /// Record the session token for a conversation, overwriting any
    /// previous entry. Last writer wins; tokens may rotate per turn.
    pub async fn record(&self, key: &ConversationKey, token: impl Into<String>) {
        let token = token.into();
        debug!(%key, "recording session token");
        self.sessions.write().await.insert(key.clone(), token);
    }
}
