//! Dispatcher-level serialization tests: one conversation's runs never
//! overlap, while separate conversations proceed concurrently.

use std::time::Duration;

use super::test_helpers::{
    build_harness, message, outcome, test_config, wait_for_drain, MockRunner, RecordingResponder,
};

/// Three messages racing into the same thread run the agent strictly
/// in arrival order; each reply is posted before the next run starts.
#[tokio::test]
async fn same_thread_messages_run_in_arrival_order() {
    let runner = MockRunner::with_delay(Duration::from_millis(20));
    runner.push(Ok(outcome("reply-1", "sess-1"))).await;
    runner.push(Ok(outcome("reply-2", "sess-1"))).await;
    runner.push(Ok(outcome("reply-3", "sess-1"))).await;
    let harness = build_harness(test_config(2900), runner, RecordingResponder::new());

    for (ts, prompt) in [("110.0", "one"), ("120.0", "two"), ("130.0", "three")] {
        harness
            .dispatcher
            .handle(message("C1", ts, Some("100.0"), prompt))
            .await;
    }
    wait_for_drain(&harness.queue).await;

    let calls = harness.runner.calls.lock().await;
    let prompts: Vec<&str> = calls.iter().map(|call| call.prompt.as_str()).collect();
    assert_eq!(prompts, vec!["one", "two", "three"]);

    let messages = harness.responder.messages.lock().await;
    let replies: Vec<&str> = messages.iter().map(|entry| entry.2.as_str()).collect();
    assert_eq!(replies, vec!["reply-1", "reply-2", "reply-3"]);
}

/// Each turn of a serialized thread sees the token its predecessor
/// recorded, even when all messages were enqueued before the first run
/// began.
#[tokio::test]
async fn queued_turns_observe_predecessors_session_token() {
    let runner = MockRunner::with_delay(Duration::from_millis(10));
    runner.push(Ok(outcome("reply-1", "sess-1"))).await;
    runner.push(Ok(outcome("reply-2", "sess-2"))).await;
    let harness = build_harness(test_config(2900), runner, RecordingResponder::new());

    harness
        .dispatcher
        .handle(message("C1", "100.0", None, "start"))
        .await;
    harness
        .dispatcher
        .handle(message("C1", "110.0", Some("100.0"), "follow up"))
        .await;
    wait_for_drain(&harness.queue).await;

    let calls = harness.runner.calls.lock().await;
    assert_eq!(calls[0].resume, None);
    assert_eq!(
        calls[1].resume.as_deref(),
        Some("sess-1"),
        "the queued turn must see the token written by the turn before it"
    );
}

/// Runs in separate threads proceed concurrently: two 150ms runs in
/// distinct conversations drain in well under the 300ms a serial
/// schedule would need.
#[tokio::test]
async fn separate_threads_run_concurrently() {
    let runner = MockRunner::with_delay(Duration::from_millis(150));
    let harness = build_harness(test_config(2900), runner, RecordingResponder::new());

    let started = std::time::Instant::now();
    harness
        .dispatcher
        .handle(message("C_SLOW", "100.0", None, "slow work"))
        .await;
    harness
        .dispatcher
        .handle(message("C_FAST", "200.0", None, "fast work"))
        .await;
    wait_for_drain(&harness.queue).await;
    let elapsed = started.elapsed();

    assert_eq!(harness.runner.call_count().await, 2);
    assert_eq!(harness.responder.message_count().await, 2);
    assert!(
        elapsed < Duration::from_millis(280),
        "distinct conversations must not serialize; drained in {elapsed:?}"
    );
}
