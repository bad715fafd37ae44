//! Runtime services and shared state for event-scout.

use tracing::instrument;

use crate::{
    base::{
        config::Config,
        types::{Res, Void},
    },
    provider::EventProvider,
    service::{chat::ChatClient, search::SearchClient},
    session::SessionContext,
};

/// Runtime service context that can be shared across the application.
///
/// This struct holds the configured providers, the session context, the chat
/// client, and the configuration. It is designed to be trivially cloneable,
/// allowing it to be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// Shared per-session state: cache store, message registry, locks.
    pub session: SessionContext,
    /// All configured event providers, in fan-out order.
    pub providers: Vec<EventProvider>,
    /// The chat client instance.
    pub chat: ChatClient,
}

impl Runtime {
    /// Create a new runtime instance.
    #[instrument(skip_all)]
    pub fn new(config: Config) -> Res<Self> {
        // Initialize the search backend and the providers that use it.
        let search = SearchClient::meetup(&config)?;
        let providers = vec![EventProvider::meetup(&config, search)];

        // Initialize the session context.
        let session = SessionContext::new();

        // Initialize the slack client.
        let chat = ChatClient::slack(&config, providers.clone(), session.clone())?;

        Ok(Self {
            config,
            session,
            providers,
            chat,
        })
    }

    pub async fn start(&self) -> Void {
        self.chat.start().await
    }
}
