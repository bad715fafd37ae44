//! The aggregate events command: fan out over every configured provider,
//! send each one's first page, then attach one shared navigation control pair.

use std::time::Duration;

use tracing::Instrument;

use crate::{
    base::types::{ControlState, MessageRef},
    prelude::*,
    provider::EventProvider,
    service::chat::ChatClient,
    session::SessionContext,
};

/// Handles a command invocation.
///
/// Spawns a task so the chat listener is never blocked on provider fetches.
/// Failures are logged and surfaced to the user as a single error reply.
#[instrument(skip_all)]
pub fn handle_events_command(
    query: Option<String>,
    channel_id: String,
    providers: Vec<EventProvider>,
    session: SessionContext,
    chat: ChatClient,
    controls_expiry: Duration,
) {
    tokio::spawn(async move {
        let result = run_events_command(query.as_deref(), &channel_id, &providers, &session, &chat, controls_expiry)
            .in_current_span()
            .await;

        if let Err(err) = &result {
            error!("Error while handling: {}", err);
            let _ = chat.post_error(&channel_id, "Something went wrong while fetching events.").await;
        }
    });
}

/// Runs the aggregate command fan-out.
///
/// A failure in any provider aborts the whole invocation; there is no
/// partial-success continuation. Providers already sent keep their messages,
/// but no control pair is attached to a half-finished session.
#[instrument(skip_all)]
pub async fn run_events_command(
    query: Option<&str>,
    channel_id: &str,
    providers: &[EventProvider],
    session: &SessionContext,
    chat: &ChatClient,
    controls_expiry: Duration,
) -> Void {
    let mut any_next = false;

    for provider in providers {
        let _guard = session.lock_provider(provider.id()).await;

        provider.prepare(query);
        provider.fetch_events().await?;

        let reply = provider.construct_reply();
        let message = chat.send_message(channel_id, &reply).await?;

        let snapshot = provider.get_cache();
        any_next |= snapshot.has_next_page;

        session.store_cache(provider.id(), snapshot);
        session.register_message(provider.id(), message);

        // Park the state in the store; later interactions restore it
        // explicitly instead of reading leftovers out of the live provider.
        provider.clear_cache();

        info!("Sent first page for provider `{}`.", provider.id());
    }

    // Exactly one shared control pair, appended after all provider messages.
    // Held under the controls lock so a racing click cannot observe a
    // half-registered pair.
    let message = {
        let mut controls_slot = session.controls().await;

        let controls = ControlState {
            previous_enabled: false,
            next_enabled: any_next,
        };

        let message = chat.send_controls(channel_id, controls).await?;
        *controls_slot = Some(message.clone());

        message
    };

    schedule_controls_expiry(session.clone(), chat.clone(), message, controls_expiry);

    Ok(())
}

/// Schedules the one-shot task that disables the navigation controls after a
/// fixed delay.
///
/// The task is pinned to the control pair it was scheduled for: a later
/// invocation replaces the controls slot, and the stale task must not touch
/// the replacement. Best-effort UX safeguard; the edit takes the same
/// controls lock as the click handlers, and a failure is logged and
/// swallowed.
pub fn schedule_controls_expiry(session: SessionContext, chat: ChatClient, message: MessageRef, delay: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;

        let controls_slot = session.controls().await;

        if controls_slot.as_ref() != Some(&message) {
            info!("Navigation controls were replaced before expiry; skipping.");
            return;
        }

        match chat.update_controls(&message, ControlState::DISABLED).await {
            Ok(()) => info!("Navigation controls disabled after expiry."),
            Err(err) => warn!("Failed to disable expired navigation controls: {}", err),
        }
    });
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        base::{
            config::{Config, ConfigInner},
            types::{EventPage, ProviderId, Res},
        },
        service::{
            chat::GenericChatClient,
            search::{GenericSearchClient, SearchClient},
        },
    };
    use async_trait::async_trait;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    /// Search backend that fails every call and counts how many it received.
    #[derive(Default)]
    struct FailingSearch {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl GenericSearchClient for FailingSearch {
        async fn search(&self, _query: &str, _page: u32, _per_page: u32, _cursor: Option<&str>) -> Res<EventPage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("backend unavailable")
        }
    }

    /// Chat stub counting outbound sends.
    #[derive(Default)]
    struct CountingChat {
        sends: AtomicUsize,
        control_sends: AtomicUsize,
    }

    #[async_trait]
    impl GenericChatClient for CountingChat {
        async fn start(&self) -> Void {
            Ok(())
        }

        async fn send_message(&self, channel_id: &str, _text: &str) -> Res<MessageRef> {
            let n = self.sends.fetch_add(1, Ordering::SeqCst);
            Ok(MessageRef {
                channel_id: channel_id.to_string(),
                message_ts: n.to_string(),
            })
        }

        async fn edit_message(&self, _message: &MessageRef, _text: &str) -> Void {
            Ok(())
        }

        async fn send_controls(&self, channel_id: &str, _controls: ControlState) -> Res<MessageRef> {
            self.control_sends.fetch_add(1, Ordering::SeqCst);
            Ok(MessageRef {
                channel_id: channel_id.to_string(),
                message_ts: "controls".to_string(),
            })
        }

        async fn update_controls(&self, _message: &MessageRef, _controls: ControlState) -> Void {
            Ok(())
        }

        async fn post_error(&self, _channel_id: &str, _text: &str) -> Void {
            Ok(())
        }
    }

    #[tokio::test]
    async fn provider_failure_aborts_fan_out_and_sends_no_controls() {
        let config = Config {
            inner: Arc::new(ConfigInner {
                default_query: "tech".to_string(),
                per_page: 4,
                ..Default::default()
            }),
        };

        let search = Arc::new(FailingSearch::default());
        let client = SearchClient::new(search.clone());
        let providers = vec![
            EventProvider::new(Arc::new(crate::provider::meetup::MeetupProvider::with_id("meetup", &config, client.clone()))),
            EventProvider::new(Arc::new(crate::provider::meetup::MeetupProvider::with_id("hackathons", &config, client))),
        ];
        let session = SessionContext::new();
        let chat_log = Arc::new(CountingChat::default());
        let chat = ChatClient::new(chat_log.clone());

        let result = run_events_command(Some("coding"), "C1", &providers, &session, &chat, Duration::from_secs(300)).await;

        assert!(result.is_err());
        // The first provider's failure stops the fan-out before the second
        // provider is ever fetched.
        assert_eq!(search.calls.load(Ordering::SeqCst), 1);
        assert_eq!(chat_log.sends.load(Ordering::SeqCst), 0);
        assert_eq!(chat_log.control_sends.load(Ordering::SeqCst), 0);
        assert!(session.controls().await.is_none());
        assert!(session.load_cache(&ProviderId::new("meetup")).is_none());
    }
}
