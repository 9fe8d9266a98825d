//! Reply rendering: truncation policy and Slack mrkdwn conversion.

use std::sync::LazyLock;

use regex::Regex;

use crate::runner::RunOutcome;

/// Marker appended when a reply was cut at the configured length.
pub const TRUNCATION_MARKER: &str = "\n… (truncated)";

#[allow(clippy::unwrap_used)] // patterns are constants and known-valid
static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());
#[allow(clippy::unwrap_used)] // patterns are constants and known-valid
static HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#{1,6}\s+(.+)$").unwrap());
#[allow(clippy::unwrap_used)] // patterns are constants and known-valid
static LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").unwrap());

/// Render a run outcome as the Slack reply text.
///
/// Success output is cut at `max_chars` characters; when the original
/// exceeded the limit the [`TRUNCATION_MARKER`] is appended before
/// mrkdwn conversion. Error-flagged outcomes are wrapped in an error
/// code block instead and never carry the truncation marker.
#[must_use]
pub fn render_outcome(outcome: &RunOutcome, max_chars: usize) -> String {
    let clipped: String = outcome.output.chars().take(max_chars).collect();

    if outcome.is_error {
        return format!("⚠️ The agent reported an error:\n```{clipped}```");
    }

    let mut text = clipped;
    if outcome.output.chars().count() > max_chars {
        text.push_str(TRUNCATION_MARKER);
    }

    to_mrkdwn(&text)
}

/// Convert common markdown constructs to Slack mrkdwn.
///
/// Handles bold, headings, and links line by line; fenced code blocks
/// pass through untouched.
#[must_use]
pub fn to_mrkdwn(text: &str) -> String {
    let mut out = Vec::new();
    let mut in_fence = false;

    for line in text.split('\n') {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            out.push(line.to_owned());
            continue;
        }
        if in_fence {
            out.push(line.to_owned());
            continue;
        }

        let line = HEADING.replace(line, "*$1*");
        let line = BOLD.replace_all(&line, "*$1*");
        let line = LINK.replace_all(&line, "<$2|$1>");
        out.push(line.into_owned());
    }

    out.join("\n")
}
