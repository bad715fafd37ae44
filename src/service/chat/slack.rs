//! Slack chat client for event-scout.
//!
//! Socket-mode listener wiring the two inbound interaction kinds to the core:
//! - `/events` command invocations, carrying the free-text query.
//! - Block-action clicks on the shared navigation control pair.
//!
//! Slack's block kit has no disabled attribute on buttons, so a disabled
//! control is rendered by omitting the button from the actions block.

use crate::{
    base::{
        config::Config,
        types::{BotError, ControlState, MessageRef, Res, Void},
    },
    interaction,
    provider::EventProvider,
    session::SessionContext,
};
use async_trait::async_trait;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use slack_morphism::prelude::*;
use tracing::{info, instrument, warn};

use std::{ops::Deref, sync::Arc, time::Duration};

use super::{ChatClient, GenericChatClient};

// Type aliases.

type FullClient = slack_morphism::SlackClient<SlackClientHyperConnector<HttpsConnector<HttpConnector>>>;

/// Slash command the bot answers to.
const EVENTS_COMMAND: &str = "/events";

// Extra methods on `ChatClient` applied by the slack implementation.

impl ChatClient {
    /// Creates a new Slack chat client.
    pub fn slack(config: &Config, providers: Vec<EventProvider>, session: SessionContext) -> Res<Self> {
        let client = SlackChatClient::new(config, providers, session)?;
        Ok(Self { inner: Arc::new(client) })
    }
}

impl From<SlackChatClient> for ChatClient {
    fn from(client: SlackChatClient) -> Self {
        Self { inner: Arc::new(client) }
    }
}

// Structs.

/// User state for the slack socket client.
struct SlackUserState {
    providers: Vec<EventProvider>,
    session: SessionContext,
    chat: ChatClient,
    controls_expiry: Duration,
}

/// Slack client implementation.
#[derive(Clone)]
struct SlackChatClient {
    app_token: SlackApiToken,
    bot_token: SlackApiToken,
    client: Arc<FullClient>,
    providers: Vec<EventProvider>,
    session: SessionContext,
    controls_expiry: Duration,
}

impl Deref for SlackChatClient {
    type Target = FullClient;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}

impl SlackChatClient {
    /// Create a new Slack chat client.
    #[instrument(name = "SlackChatClient::new", skip_all)]
    fn new(config: &Config, providers: Vec<EventProvider>, session: SessionContext) -> Res<Self> {
        // Initialize tokens.

        let app_token = SlackApiToken::new(SlackApiTokenValue(config.slack_app_token.clone()));
        let bot_token = SlackApiToken::new(SlackApiTokenValue(config.slack_bot_token.clone()));

        // Initialize the Slack client.

        let https_connector = HttpsConnector::<HttpConnector>::builder().with_native_roots()?.https_only().enable_all_versions().build();
        let connector = SlackClientHyperConnector::with_connector(https_connector);
        let client = Arc::new(slack_morphism::SlackClient::new(connector));

        Ok(Self {
            app_token,
            bot_token,
            client,
            providers,
            session,
            controls_expiry: Duration::from_secs(config.controls_expiry_secs),
        })
    }
}

#[async_trait]
impl GenericChatClient for SlackChatClient {
    async fn start(&self) -> Void {
        // Initialize the socket mode listener.

        let socket_mode_callbacks = SlackSocketModeListenerCallbacks::new()
            .with_command_events(handle_command_event)
            .with_interaction_events(handle_interaction_event);

        // Initialize the socket mode listener environment.

        let listener_environment = Arc::new(SlackClientEventsListenerEnvironment::new(self.client.clone()).with_user_state(SlackUserState {
            providers: self.providers.clone(),
            session: self.session.clone(),
            chat: ChatClient::from(self.clone()),
            controls_expiry: self.controls_expiry,
        }));

        let socket_mode_listener = Arc::new(SlackClientSocketModeListener::new(
            &SlackClientSocketModeConfig::new(),
            listener_environment.clone(),
            socket_mode_callbacks,
        ));

        // Register an app token to listen for events.
        socket_mode_listener.listen_for(&self.app_token).await?;

        // Start WS connections calling Slack API to get WS url for the token,
        // and wait for Ctrl-C to shutdown.
        socket_mode_listener.serve().await;

        Ok(())
    }

    #[instrument(skip(self, text))]
    async fn send_message(&self, channel_id: &str, text: &str) -> Res<MessageRef> {
        let content = SlackMessageContent::new().with_text(text.to_string());
        let request = SlackApiChatPostMessageRequest::new(SlackChannelId(channel_id.to_string()), content);

        let session = self.client.open_session(&self.bot_token);

        let response = session.chat_post_message(&request).await.map_err(|e| BotError::Send {
            channel_id: channel_id.to_string(),
            reason: e.to_string(),
        })?;

        Ok(MessageRef {
            channel_id: channel_id.to_string(),
            message_ts: response.ts.0,
        })
    }

    #[instrument(skip(self, text))]
    async fn edit_message(&self, message: &MessageRef, text: &str) -> Void {
        let content = SlackMessageContent::new().with_text(text.to_string());
        let request = SlackApiChatUpdateRequest::new(SlackChannelId(message.channel_id.clone()), content, SlackTs(message.message_ts.clone()));

        let session = self.client.open_session(&self.bot_token);

        session.chat_update(&request).await.map_err(|e| BotError::Edit {
            message_ts: message.message_ts.clone(),
            reason: e.to_string(),
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn send_controls(&self, channel_id: &str, controls: ControlState) -> Res<MessageRef> {
        let content = controls_content(controls);
        let request = SlackApiChatPostMessageRequest::new(SlackChannelId(channel_id.to_string()), content);

        let session = self.client.open_session(&self.bot_token);

        let response = session.chat_post_message(&request).await.map_err(|e| BotError::Send {
            channel_id: channel_id.to_string(),
            reason: e.to_string(),
        })?;

        Ok(MessageRef {
            channel_id: channel_id.to_string(),
            message_ts: response.ts.0,
        })
    }

    #[instrument(skip(self))]
    async fn update_controls(&self, message: &MessageRef, controls: ControlState) -> Void {
        let content = controls_content(controls);
        let request = SlackApiChatUpdateRequest::new(SlackChannelId(message.channel_id.clone()), content, SlackTs(message.message_ts.clone()));

        let session = self.client.open_session(&self.bot_token);

        session.chat_update(&request).await.map_err(|e| BotError::Edit {
            message_ts: message.message_ts.clone(),
            reason: e.to_string(),
        })?;

        Ok(())
    }

    #[instrument(skip(self, text))]
    async fn post_error(&self, channel_id: &str, text: &str) -> Void {
        self.send_message(channel_id, text).await?;
        Ok(())
    }
}

/// Builds the navigation controls message content.
///
/// Enabled buttons become block-kit buttons whose action ids are the control
/// identities; with both buttons disabled (post-expiry) the actions block is
/// replaced by a plain notice, which also makes the expiry edit idempotent.
fn controls_content(controls: ControlState) -> SlackMessageContent {
    let mut buttons: Vec<SlackActionBlockElement> = Vec::new();

    if controls.previous_enabled {
        buttons.push(SlackActionBlockElement::Button(SlackBlockButtonElement::new(
            SlackActionId(interaction::PREVIOUS_PAGE_CONTROL_ID.to_string()),
            pt!("⬅️ Previous"),
        )));
    }

    if controls.next_enabled {
        buttons.push(SlackActionBlockElement::Button(SlackBlockButtonElement::new(
            SlackActionId(interaction::NEXT_PAGE_CONTROL_ID.to_string()),
            pt!("Next ➡️"),
        )));
    }

    if buttons.is_empty() {
        return SlackMessageContent::new()
            .with_text("Event navigation".to_string())
            .with_blocks(vec![SlackBlock::Section(SlackSectionBlock::new().with_text(md!("_These navigation buttons have expired. Run the command again._")))]);
    }

    SlackMessageContent::new()
        .with_text("Event navigation".to_string())
        .with_blocks(vec![SlackBlock::Actions(SlackActionsBlock::new(buttons))])
}

// Socket mode listener callbacks for Slack.

/// Handles command events from Slack.
async fn handle_command_event(
    event: SlackCommandEvent,
    _client: Arc<SlackHyperClient>,
    states: SlackClientEventsUserState,
) -> Result<SlackCommandEventResponse, Box<dyn std::error::Error + Send + Sync>> {
    let states = states.read().await;
    let user_state = states.get_user_state::<SlackUserState>().ok_or(anyhow::anyhow!("Failed to get user state"))?;

    if event.command.0 != EVENTS_COMMAND {
        warn!("Received unknown command `{}`.", event.command.0);
        return Ok(SlackCommandEventResponse::new(
            SlackMessageContent::new().with_text(format!("`{}` is not a command I know.", event.command.0)),
        ));
    }

    info!("Received events command ...");

    let query = event.text.as_deref().map(str::trim).filter(|t| !t.is_empty()).map(ToString::to_string);
    let channel_id = event.channel_id.0.clone();

    interaction::events_command::handle_events_command(
        query,
        channel_id,
        user_state.providers.clone(),
        user_state.session.clone(),
        user_state.chat.clone(),
        user_state.controls_expiry,
    );

    Ok(SlackCommandEventResponse::new(SlackMessageContent::new().with_text("Fetching events ...".into())))
}

/// Handles interaction events from Slack.
async fn handle_interaction_event(event: SlackInteractionEvent, _client: Arc<SlackHyperClient>, states: SlackClientEventsUserState) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let states = states.read().await;
    let user_state = states.get_user_state::<SlackUserState>().ok_or(anyhow::anyhow!("Failed to get user state"))?;

    match event {
        SlackInteractionEvent::BlockActions(block_actions) => {
            let channel_id = block_actions.channel.as_ref().map(|c| c.id.0.clone()).unwrap_or_default();

            let Some(action) = block_actions.actions.as_ref().and_then(|actions| actions.first()) else {
                warn!("Received block actions event with no actions.");
                return Ok(());
            };

            let control_id = action.action_id.0.clone();

            match interaction::page_action_for_control(&control_id) {
                Some(page_action) => {
                    info!("Received `{}` click ...", control_id);

                    interaction::pagination::handle_page_action(
                        page_action,
                        channel_id,
                        user_state.providers.clone(),
                        user_state.session.clone(),
                        user_state.chat.clone(),
                    );
                }
                None => {
                    // Unknown control identities get a generic error reply
                    // rather than a crash.
                    warn!("{}", BotError::UnknownControl { control_id: control_id.clone() });
                    let _ = user_state.chat.post_error(&channel_id, "That button is not wired to anything. Try running the command again.").await;
                }
            }
        }
        _ => {
            warn!("Received unhandled interaction event.")
        }
    }

    Ok(())
}
