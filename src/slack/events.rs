//! Slack push-event decoding and filtering.
//!
//! Receives `app_mention` and `message` events via Socket Mode and
//! normalizes them into [`InboundMessage`]s for the dispatcher.
//! Platform-internal noise is dropped here, before authorization:
//! messages carrying any subtype (edits, joins, bot posts), messages
//! without a sending user, and bot echoes never reach the dispatcher.

use std::sync::Arc;

use slack_morphism::prelude::{
    SlackClient, SlackClientEventsUserState, SlackClientHyperHttpsConnector,
    SlackEventCallbackBody, SlackPushEventCallback,
};
use tracing::{debug, warn};

use crate::slack::dispatch::{Dispatcher, InboundMessage};

/// Handle a push event delivered via Socket Mode.
///
/// Extracts the shared [`Dispatcher`] from the listener's user state,
/// normalizes the event, and hands it off. Events that do not concern
/// the relay are dropped silently.
///
/// # Errors
///
/// Never fails; the signature matches the Socket Mode callback contract.
pub async fn handle_push_event(
    event: SlackPushEventCallback,
    _client: Arc<SlackClient<SlackClientHyperHttpsConnector>>,
    state: SlackClientEventsUserState,
) -> slack_morphism::UserCallbackResult<()> {
    let dispatcher: Option<Arc<Dispatcher>> = {
        let guard = state.read().await;
        guard.get_user_state::<Arc<Dispatcher>>().cloned()
    };

    let Some(dispatcher) = dispatcher else {
        warn!("dispatcher not available; ignoring push event");
        return Ok(());
    };

    if let Some(message) = normalize(event.event) {
        dispatcher.handle(message).await;
    }

    Ok(())
}

/// Normalize a push-event body into an inbound message, or drop it.
fn normalize(body: SlackEventCallbackBody) -> Option<InboundMessage> {
    match body {
        SlackEventCallbackBody::AppMention(mention) => {
            let text = mention.content.text.unwrap_or_default();
            Some(InboundMessage {
                sender: mention.user.to_string(),
                channel: mention.channel.to_string(),
                message_ts: mention.origin.ts.to_string(),
                thread_ts: mention.origin.thread_ts.map(|ts| ts.to_string()),
                text: strip_mention(&text).to_owned(),
            })
        }
        SlackEventCallbackBody::Message(message) => {
            // Direct messages only; channel traffic arrives as app_mention.
            let is_im = message
                .origin
                .channel_type
                .as_ref()
                .is_some_and(|ct| ct.0 == "im");
            if !is_im {
                return None;
            }
            // Any subtype marks a platform-internal edit or echo.
            if message.subtype.is_some() {
                debug!("ignoring subtyped message event");
                return None;
            }
            if message.sender.bot_id.is_some() {
                return None;
            }

            let user = message.sender.user?;
            let channel = message.origin.channel?;
            let text = message.content.and_then(|content| content.text)?;

            Some(InboundMessage {
                sender: user.to_string(),
                channel: channel.to_string(),
                message_ts: message.origin.ts.to_string(),
                thread_ts: message.origin.thread_ts.map(|ts| ts.to_string()),
                text,
            })
        }
        _ => None,
    }
}

/// Strip the leading `<@…>` mention token from an `app_mention` text.
fn strip_mention(text: &str) -> &str {
    text.split_once('>').map_or(text, |(_, rest)| rest).trim()
}
