//! Pagination controller: turns a navigation click into one page transition
//! per configured provider and an in-place edit of each registered message.

use tracing::Instrument;

use crate::{
    base::types::{ControlState, PageAction},
    prelude::*,
    provider::EventProvider,
    service::chat::ChatClient,
    session::SessionContext,
};

/// Handles a navigation button click.
///
/// Spawns a task so the chat listener is never blocked on provider fetches.
/// Failures are logged and surfaced to the user as a single error reply.
#[instrument(skip_all, fields(action = %action))]
pub fn handle_page_action(action: PageAction, channel_id: String, providers: Vec<EventProvider>, session: SessionContext, chat: ChatClient) {
    tokio::spawn(async move {
        let result = run_page_action(action, &providers, &session, &chat).in_current_span().await;

        if let Err(err) = &result {
            error!("Error while handling: {}", err);
            let _ = chat.post_error(&channel_id, "Something went wrong while turning the page.").await;
        }
    });
}

/// Advances every configured provider one step in the same direction, then
/// recomputes the shared control pair from the new snapshots.
///
/// A failure in any provider aborts the remaining ones; the failed provider's
/// page counter is reverted so the user can retry from the same page.
#[instrument(skip_all)]
pub async fn run_page_action(action: PageAction, providers: &[EventProvider], session: &SessionContext, chat: &ChatClient) -> Void {
    for provider in providers {
        step_provider(action, provider, session, chat).await?;
    }

    // Recompute both buttons from the stored snapshots and update the shared
    // controls message under its lock, which also serializes against the
    // auto-expiry edit.
    let controls = controls_from_snapshots(providers, session);
    let controls_slot = session.controls().await;

    if let Some(message) = controls_slot.as_ref() {
        chat.update_controls(message, controls).await?;
    }

    Ok(())
}

/// One provider's page transition, serialized under its identity lock:
/// restore cache, mutate the page counter, refetch, re-render, edit the
/// registered message in place, write the cache back.
async fn step_provider(action: PageAction, provider: &EventProvider, session: &SessionContext, chat: &ChatClient) -> Void {
    let _guard = session.lock_provider(provider.id()).await;

    if let Some(snapshot) = session.load_cache(provider.id()) {
        provider.set_cache(snapshot);
    }

    match action {
        PageAction::Next => {
            // Final page: no state change, no network call.
            if !provider.has_next_page() {
                info!("Provider `{}` has no further page; skipping.", provider.id());
                return Ok(());
            }

            provider.increment_page();
        }
        // Page 1 is not special-cased here; the provider clamps the floor.
        PageAction::Previous => provider.decrement_page(),
    }

    if let Err(err) = provider.fetch_events().await {
        // Revert the transition so a retry starts from the same page.
        match action {
            PageAction::Next => provider.decrement_page(),
            PageAction::Previous => provider.increment_page(),
        }

        return Err(err);
    }

    let reply = provider.construct_reply();

    let message = session
        .lookup_message(provider.id())
        .ok_or_else(|| anyhow!("no registered message for provider `{}`", provider.id()))?;

    chat.edit_message(&message, &reply).await?;

    session.register_message(provider.id(), message);
    session.store_cache(provider.id(), provider.get_cache());
    provider.clear_cache();

    Ok(())
}

/// Derives the control pair state from the providers' stored snapshots:
/// "previous" stays enabled while any provider is past page 1, "next" while
/// any provider reports a further page.
fn controls_from_snapshots(providers: &[EventProvider], session: &SessionContext) -> ControlState {
    let mut previous_enabled = false;
    let mut next_enabled = false;

    for provider in providers {
        if let Some(snapshot) = session.load_cache(provider.id()) {
            previous_enabled |= snapshot.page > 1;
            next_enabled |= snapshot.has_next_page;
        }
    }

    ControlState { previous_enabled, next_enabled }
}

// Tests.
