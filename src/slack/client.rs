//! Slack Socket Mode client and responder implementation.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use slack_morphism::prelude::{
    SlackApiChatPostMessageRequest, SlackApiReactionsAddRequest, SlackApiToken, SlackApiTokenType,
    SlackApiTokenValue, SlackChannelId, SlackClient, SlackClientEventsListenerEnvironment,
    SlackClientHyperHttpsConnector, SlackClientSocketModeConfig, SlackClientSocketModeListener,
    SlackMessageContent, SlackReactionName, SlackSocketModeListenerCallbacks, SlackTs,
};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::SlackConfig;
use crate::slack::dispatch::{Dispatcher, Responder};
use crate::slack::events;
use crate::{AppError, Result};

/// Slack client wrapper owning the bot and app tokens.
///
/// Outbound delivery is direct and best-effort: one `chat.postMessage`
/// or `reactions.add` call per request, no retry queue. Callers log
/// failures and move on.
pub struct SlackService {
    client: Arc<SlackClient<SlackClientHyperHttpsConnector>>,
    bot_token: SlackApiToken,
    app_token: SlackApiToken,
}

impl SlackService {
    /// Create the Slack client from loaded credentials.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` if the HTTPS connector cannot be created.
    pub fn new(config: &SlackConfig) -> Result<Self> {
        let connector = SlackClientHyperHttpsConnector::new()
            .map_err(|err| AppError::Slack(format!("failed to init slack connector: {err}")))?;
        let client = Arc::new(SlackClient::new(connector));
        let bot_token = SlackApiToken {
            token_value: SlackApiTokenValue(config.bot_token.clone()),
            cookie: None,
            team_id: None,
            scope: None,
            token_type: Some(SlackApiTokenType::Bot),
        };
        let app_token = SlackApiToken {
            token_value: SlackApiTokenValue(config.app_token.clone()),
            cookie: None,
            team_id: None,
            scope: None,
            token_type: Some(SlackApiTokenType::App),
        };

        Ok(Self {
            client,
            bot_token,
            app_token,
        })
    }

    /// Spawn the Socket Mode listener wired to the push-event handler.
    ///
    /// The dispatcher is injected into the listener's user state so
    /// [`events::handle_push_event`] can reach it.
    #[must_use]
    pub fn spawn_socket_mode(&self, dispatcher: Arc<Dispatcher>) -> JoinHandle<()> {
        let listener_env = Arc::new(
            SlackClientEventsListenerEnvironment::new(Arc::clone(&self.client))
                .with_error_handler(|err, _client, _state| {
                    error!(?err, "socket mode error");
                    http::StatusCode::INTERNAL_SERVER_ERROR
                })
                .with_user_state(dispatcher),
        );
        let callbacks = SlackSocketModeListenerCallbacks::new()
            .with_hello_events(|event, _client, _state| async move {
                info!(?event, "socket hello");
            })
            .with_push_events(events::handle_push_event);
        let config = SlackClientSocketModeConfig {
            max_connections_count: SlackClientSocketModeConfig::DEFAULT_CONNECTIONS_COUNT,
            debug_connections: SlackClientSocketModeConfig::DEFAULT_DEBUG_CONNECTIONS,
            initial_backoff_in_seconds:
                SlackClientSocketModeConfig::DEFAULT_INITIAL_BACKOFF_IN_SECONDS,
            reconnect_timeout_in_seconds:
                SlackClientSocketModeConfig::DEFAULT_RECONNECT_TIMEOUT_IN_SECONDS,
            ping_interval_in_seconds: SlackClientSocketModeConfig::DEFAULT_PING_INTERVAL_IN_SECONDS,
            ping_failure_threshold_times:
                SlackClientSocketModeConfig::DEFAULT_PING_FAILURE_THRESHOLD_TIMES,
        };

        let listener = SlackClientSocketModeListener::new(&config, listener_env, callbacks);
        let app_token = self.app_token.clone();
        tokio::spawn(async move {
            if let Err(error) = listener.listen_for(&app_token).await {
                error!(?error, "socket mode listen failed");
                return;
            }

            listener.serve().await;
            info!("socket mode listener exited");
        })
    }
}

impl Responder for SlackService {
    fn post_message(
        &self,
        channel: &str,
        thread_ts: &str,
        text: &str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let request = SlackApiChatPostMessageRequest {
            channel: SlackChannelId(channel.to_owned()),
            content: SlackMessageContent {
                text: Some(text.to_owned()),
                blocks: None,
                attachments: None,
                upload: None,
                files: None,
                reactions: None,
                metadata: None,
            },
            as_user: None,
            icon_emoji: None,
            icon_url: None,
            link_names: Some(true),
            parse: None,
            thread_ts: Some(SlackTs(thread_ts.to_owned())),
            username: None,
            reply_broadcast: None,
            unfurl_links: None,
            unfurl_media: None,
        };

        Box::pin(async move {
            self.client
                .open_session(&self.bot_token)
                .chat_post_message(&request)
                .await
                .map_err(|err| AppError::Slack(format!("failed to post message: {err}")))?;
            Ok(())
        })
    }

    fn add_reaction(
        &self,
        channel: &str,
        ts: &str,
        name: &str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let request = SlackApiReactionsAddRequest::new(
            SlackChannelId(channel.to_owned()),
            SlackReactionName(name.to_owned()),
            SlackTs(ts.to_owned()),
        );

        Box::pin(async move {
            self.client
                .open_session(&self.bot_token)
                .reactions_add(&request)
                .await
                .map_err(|err| AppError::Slack(format!("failed to add reaction: {err}")))?;
            Ok(())
        })
    }
}
