//! Unit tests for agent stream decoding and outcome folding.
//!
//! The decoder must tolerate event types it does not recognise (newer
//! CLI versions add them freely) while rejecting lines that are not
//! JSON at all. Token precedence: a session token on the final result
//! event wins over the one announced at init.

use claude_relay::runner::event::{OutcomeBuilder, StreamEvent};

fn decode(line: &str) -> StreamEvent {
    serde_json::from_str(line).expect("line should decode")
}

// ── Decode ────────────────────────────────────────────────────────────────────

#[test]
fn init_event_decodes_with_session_id() {
    let event = decode(r#"{"type":"system","subtype":"init","session_id":"sess-1"}"#);
    match event {
        StreamEvent::System {
            subtype,
            session_id,
        } => {
            assert_eq!(subtype.as_deref(), Some("init"));
            assert_eq!(session_id.as_deref(), Some("sess-1"));
        }
        other => panic!("expected system event, got {other:?}"),
    }
}

#[test]
fn result_event_decodes_all_fields() {
    let event = decode(
        r#"{"type":"result","subtype":"success","result":"done","is_error":false,"num_turns":3,"duration_ms":1200,"session_id":"sess-2"}"#,
    );
    match event {
        StreamEvent::Result {
            result,
            is_error,
            num_turns,
            duration_ms,
            session_id,
        } => {
            assert_eq!(result.as_deref(), Some("done"));
            assert_eq!(is_error, Some(false));
            assert_eq!(num_turns, Some(3));
            assert_eq!(duration_ms, Some(1200));
            assert_eq!(session_id.as_deref(), Some("sess-2"));
        }
        other => panic!("expected result event, got {other:?}"),
    }
}

#[test]
fn unrecognised_event_type_falls_back_to_unknown() {
    let event = decode(r#"{"type":"rate_limit_event","retry_after":30}"#);
    assert!(matches!(event, StreamEvent::Unknown));
}

#[test]
fn assistant_event_is_not_consumed() {
    let event = decode(r#"{"type":"assistant","message":{"role":"assistant","content":[]}}"#);
    assert!(matches!(event, StreamEvent::Unknown));
}

#[test]
fn non_json_line_is_a_decode_error() {
    let result = serde_json::from_str::<StreamEvent>("claude: command output");
    assert!(result.is_err());
}

// ── Outcome folding ───────────────────────────────────────────────────────────

#[test]
fn result_token_wins_over_init_token() {
    let mut builder = OutcomeBuilder::new();
    builder.observe(decode(
        r#"{"type":"system","subtype":"init","session_id":"sess-init"}"#,
    ));
    builder.observe(decode(
        r#"{"type":"result","result":"done","session_id":"sess-final"}"#,
    ));

    let outcome = builder.finish();
    assert_eq!(outcome.session_id, "sess-final");
    assert_eq!(outcome.output, "done");
}

#[test]
fn init_token_is_kept_when_result_has_none() {
    let mut builder = OutcomeBuilder::new();
    builder.observe(decode(
        r#"{"type":"system","subtype":"init","session_id":"sess-init"}"#,
    ));
    builder.observe(decode(r#"{"type":"result","result":"done"}"#));

    let outcome = builder.finish();
    assert_eq!(outcome.session_id, "sess-init");
}

#[test]
fn non_init_system_events_do_not_set_the_token() {
    let mut builder = OutcomeBuilder::new();
    builder.observe(decode(
        r#"{"type":"system","subtype":"compact","session_id":"sess-other"}"#,
    ));
    builder.observe(decode(r#"{"type":"result","result":"done"}"#));

    assert_eq!(builder.finish().session_id, "");
}

#[test]
fn unknown_events_between_init_and_result_are_skipped() {
    let mut builder = OutcomeBuilder::new();
    builder.observe(decode(
        r#"{"type":"system","subtype":"init","session_id":"sess-1"}"#,
    ));
    builder.observe(decode(r#"{"type":"tool_use","name":"bash"}"#));
    builder.observe(decode(
        r#"{"type":"result","result":"done","is_error":false,"num_turns":2}"#,
    ));

    let outcome = builder.finish();
    assert!(!outcome.is_error);
    assert_eq!(outcome.num_turns, 2);
}

#[test]
fn empty_result_text_becomes_placeholder() {
    let mut builder = OutcomeBuilder::new();
    builder.observe(decode(r#"{"type":"result","result":""}"#));
    assert_eq!(builder.finish().output, "Done, no output.");
}

#[test]
fn stream_without_result_yields_error_outcome() {
    let mut builder = OutcomeBuilder::new();
    builder.observe(decode(
        r#"{"type":"system","subtype":"init","session_id":"sess-1"}"#,
    ));

    let outcome = builder.finish();
    assert!(outcome.is_error);
    assert_eq!(outcome.output, "No result received from the agent.");
    assert_eq!(outcome.session_id, "sess-1");
}
