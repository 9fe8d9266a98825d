//! Decoded events from the agent CLI's `stream-json` output.
//!
//! The agent emits one JSON object per line. Only the `system` startup
//! event (which carries the session token) and the final `result` event
//! matter to the relay; every other type, including types introduced by
//! newer CLI versions, falls through to [`StreamEvent::Unknown`] and is
//! skipped without failing the stream.

use serde::Deserialize;

use crate::runner::RunOutcome;

/// Subtype of the `system` event that announces a fresh session.
pub const INIT_SUBTYPE: &str = "init";

/// One line of agent stream output.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Startup and housekeeping events; `init` carries the session token.
    System {
        /// Event subtype, e.g. `init`.
        #[serde(default)]
        subtype: Option<String>,
        /// Agent session token for `--resume`.
        #[serde(default)]
        session_id: Option<String>,
    },
    /// Final result of the run.
    Result {
        /// Final text output; absent when the agent produced none.
        #[serde(default)]
        result: Option<String>,
        /// Whether the run ended in error.
        #[serde(default)]
        is_error: Option<bool>,
        /// Number of agentic turns taken.
        #[serde(default)]
        num_turns: Option<u32>,
        /// Wall-clock duration in milliseconds.
        #[serde(default)]
        duration_ms: Option<u64>,
        /// Session token, possibly rotated since the init event.
        #[serde(default)]
        session_id: Option<String>,
    },
    /// Any event type the relay does not consume.
    #[serde(other)]
    Unknown,
}

/// Folds stream events into the final [`RunOutcome`].
///
/// The `system/init` event's session token is kept as a fallback; a
/// token surfaced on the `result` event wins because the agent may
/// rotate sessions mid-run.
#[derive(Debug, Default)]
pub struct OutcomeBuilder {
    session_id: String,
    outcome: Option<RunOutcome>,
}

impl OutcomeBuilder {
    /// Create a builder with no observed events.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one stream event into the builder.
    pub fn observe(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::System {
                subtype,
                session_id,
            } => {
                if subtype.as_deref() == Some(INIT_SUBTYPE) {
                    if let Some(sid) = session_id.filter(|sid| !sid.is_empty()) {
                        self.session_id = sid;
                    }
                }
            }
            StreamEvent::Result {
                result,
                is_error,
                num_turns,
                duration_ms,
                session_id,
            } => {
                if let Some(sid) = session_id.filter(|sid| !sid.is_empty()) {
                    self.session_id = sid;
                }
                self.outcome = Some(RunOutcome {
                    output: result
                        .filter(|text| !text.is_empty())
                        .unwrap_or_else(|| "Done, no output.".into()),
                    is_error: is_error.unwrap_or(false),
                    num_turns: num_turns.unwrap_or(0),
                    duration_ms: duration_ms.unwrap_or(0),
                    session_id: self.session_id.clone(),
                });
            }
            StreamEvent::Unknown => {}
        }
    }

    /// Final outcome after the stream ends.
    ///
    /// A stream that closed without a `result` event yields an
    /// error-flagged outcome so the failure is visible to the caller.
    #[must_use]
    pub fn finish(self) -> RunOutcome {
        self.outcome.unwrap_or_else(|| RunOutcome {
            output: "No result received from the agent.".into(),
            is_error: true,
            num_turns: 0,
            duration_ms: 0,
            session_id: self.session_id,
        })
    }
}
