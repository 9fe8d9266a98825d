//! Unit tests for the session directory and conversation-key derivation.

use claude_relay::session::directory::SessionDirectory;
use claude_relay::session::ConversationKey;

// ── Key derivation ────────────────────────────────────────────────────────────

#[test]
fn threaded_message_uses_thread_timestamp() {
    let key = ConversationKey::from_message("C1", "200.0", Some("100.0"));
    assert_eq!(key, ConversationKey::new("C1", "100.0"));
}

#[test]
fn unthreaded_message_roots_a_new_thread_at_itself() {
    let key = ConversationKey::from_message("C1", "200.0", None);
    assert_eq!(key, ConversationKey::new("C1", "200.0"));
}

#[test]
fn same_thread_in_different_channels_is_distinct() {
    let a = ConversationKey::new("C1", "100.0");
    let b = ConversationKey::new("C2", "100.0");
    assert_ne!(a, b);
}

// ── Directory semantics ───────────────────────────────────────────────────────

#[tokio::test]
async fn record_then_lookup_round_trips() {
    let directory = SessionDirectory::new();
    let key = ConversationKey::new("C1", "100.0");

    directory.record(&key, "tok-1").await;
    assert_eq!(directory.lookup(&key).await.as_deref(), Some("tok-1"));
}

#[tokio::test]
async fn lookup_of_unknown_key_is_absent() {
    let directory = SessionDirectory::new();
    let key = ConversationKey::new("C1", "100.0");
    assert!(directory.lookup(&key).await.is_none());
}

#[tokio::test]
async fn later_record_overwrites_earlier_token() {
    let directory = SessionDirectory::new();
    let key = ConversationKey::new("C1", "100.0");

    directory.record(&key, "tok-1").await;
    directory.record(&key, "tok-2").await;
    assert_eq!(directory.lookup(&key).await.as_deref(), Some("tok-2"));
}

#[tokio::test]
async fn distinct_keys_never_observe_each_others_tokens() {
    let directory = SessionDirectory::new();
    let a = ConversationKey::new("C1", "100.0");
    let b = ConversationKey::new("C1", "200.0");

    directory.record(&a, "tok-a").await;
    directory.record(&b, "tok-b").await;

    assert_eq!(directory.lookup(&a).await.as_deref(), Some("tok-a"));
    assert_eq!(directory.lookup(&b).await.as_deref(), Some("tok-b"));
}
