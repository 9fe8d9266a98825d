//! Unit tests for reply rendering: truncation policy and mrkdwn.

use claude_relay::runner::RunOutcome;
use claude_relay::slack::format::{render_outcome, to_mrkdwn, TRUNCATION_MARKER};

fn success(output: &str) -> RunOutcome {
    RunOutcome {
        output: output.to_owned(),
        is_error: false,
        num_turns: 1,
        duration_ms: 10,
        session_id: "sess-1".into(),
    }
}

fn failure(output: &str) -> RunOutcome {
    RunOutcome {
        is_error: true,
        ..success(output)
    }
}

// ── Truncation ────────────────────────────────────────────────────────────────

/// Output beyond the limit is cut at exactly the configured number of
/// characters and the truncation marker is appended.
#[test]
fn long_output_is_cut_at_limit_with_marker() {
    let outcome = success(&"a".repeat(5000));
    let text = render_outcome(&outcome, 100);
    assert_eq!(text, format!("{}{}", "a".repeat(100), TRUNCATION_MARKER));
}

#[test]
fn short_output_is_untouched() {
    let outcome = success("all done");
    assert_eq!(render_outcome(&outcome, 100), "all done");
}

#[test]
fn output_exactly_at_limit_has_no_marker() {
    let outcome = success(&"a".repeat(100));
    assert_eq!(render_outcome(&outcome, 100), "a".repeat(100));
}

/// The limit counts characters, not bytes: multi-byte output must not
/// split inside a code point.
#[test]
fn truncation_is_character_based() {
    let outcome = success(&"é".repeat(10));
    let text = render_outcome(&outcome, 4);
    assert_eq!(text, format!("{}{}", "é".repeat(4), TRUNCATION_MARKER));
}

// ── Error styling ─────────────────────────────────────────────────────────────

/// Error-flagged outcomes are wrapped in an error code block and never
/// carry the truncation marker, regardless of length.
#[test]
fn error_outcome_is_wrapped_without_marker() {
    let outcome = failure(&"x".repeat(5000));
    let text = render_outcome(&outcome, 100);

    assert!(text.starts_with("⚠️ The agent reported an error:\n```"));
    assert!(text.ends_with("```"));
    assert!(text.contains(&"x".repeat(100)));
    assert!(!text.contains("truncated"));
}

#[test]
fn short_error_outcome_keeps_full_output() {
    let outcome = failure("boom");
    assert_eq!(
        render_outcome(&outcome, 100),
        "⚠️ The agent reported an error:\n```boom```"
    );
}

// ── mrkdwn conversion ─────────────────────────────────────────────────────────

#[test]
fn bold_markers_convert() {
    assert_eq!(to_mrkdwn("this is **bold** text"), "this is *bold* text");
}

#[test]
fn headings_convert_to_bold_lines() {
    assert_eq!(to_mrkdwn("# Title\nbody"), "*Title*\nbody");
    assert_eq!(to_mrkdwn("### Sub heading"), "*Sub heading*");
}

#[test]
fn links_convert_to_slack_form() {
    assert_eq!(
        to_mrkdwn("see [the docs](https://example.com)"),
        "see <https://example.com|the docs>"
    );
}

#[test]
fn fenced_code_blocks_pass_through() {
    let input = "before\n```\n# not a heading\n**not bold**\n```\nafter **bold**";
    let expected = "before\n```\n# not a heading\n**not bold**\n```\nafter *bold*";
    assert_eq!(to_mrkdwn(input), expected);
}

/// Conversion happens after truncation, so plain output is exactly the
/// clipped prefix plus the marker.
#[test]
fn conversion_applies_to_truncated_text() {
    let outcome = success(&format!("**lead** {}", "a".repeat(5000)));
    let text = render_outcome(&outcome, 8);
    assert_eq!(text, format!("*lead*{TRUNCATION_MARKER}"));
}
