pub mod slack;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::types::{ControlState, MessageRef, Res, Void};

// Traits.

/// Generic "chat" trait that clients must implement.
///
/// This trait defines the narrow surface the core needs from a chat platform:
/// sends return an addressable message reference, and edits take that
/// reference plus new content. Implementing it allows different chat services
/// to drive the events command.
#[async_trait]
pub trait GenericChatClient: Send + Sync + 'static {
    /// Start the chat client listener.
    ///
    /// Sets up event listeners for the chat platform and begins processing
    /// incoming commands and button clicks.
    async fn start(&self) -> Void;

    /// Send a message to a channel, returning an addressable reference to it.
    async fn send_message(&self, channel_id: &str, text: &str) -> Res<MessageRef>;

    /// Replace the content of a previously sent message.
    async fn edit_message(&self, message: &MessageRef, text: &str) -> Void;

    /// Send the shared navigation control pair to a channel.
    async fn send_controls(&self, channel_id: &str, controls: ControlState) -> Res<MessageRef>;

    /// Replace the navigation control pair on a previously sent controls
    /// message. Must be idempotent; racing edits that settle on the same
    /// state are not an error.
    async fn update_controls(&self, message: &MessageRef, controls: ControlState) -> Void;

    /// Post a user-visible error reply to a channel. Best effort.
    async fn post_error(&self, channel_id: &str, text: &str) -> Void;
}

// Structs.

/// Chat client for the application.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct ChatClient {
    inner: Arc<dyn GenericChatClient>,
}

impl Deref for ChatClient {
    type Target = dyn GenericChatClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl ChatClient {
    pub fn new(inner: Arc<dyn GenericChatClient>) -> Self {
        Self { inner }
    }
}
