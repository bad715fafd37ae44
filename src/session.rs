//! Shared per-session state: the provider cache store, the message registry,
//! and the locks that serialize pagination against each provider.
//!
//! All of this used to be reachable only as process-wide globals in earlier
//! iterations of the bot; it is now an explicit context object owned by the
//! runtime and injected into the interaction handlers, so tests can run with
//! fresh state.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::base::types::{MessageRef, ProviderId, ProviderState};

/// Session context shared by the aggregate command, the pagination handlers,
/// and the auto-expiry task.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for an outer `Arc` or `Mutex`.
#[derive(Clone, Default)]
pub struct SessionContext {
    inner: Arc<SessionInner>,
}

#[derive(Default)]
struct SessionInner {
    /// Last externalized snapshot per provider. Overwrite-only, no eviction;
    /// cardinality is bounded by the number of configured providers.
    cache: Mutex<HashMap<ProviderId, ProviderState>>,
    /// The message currently displaying each provider's page. Exactly one
    /// live entry per provider; replaced on every successful edit-or-resend.
    messages: Mutex<HashMap<ProviderId, MessageRef>>,
    /// Per-provider locks serializing the read-mutate-fetch-write sequence of
    /// a pagination transition.
    locks: Mutex<HashMap<ProviderId, Arc<AsyncMutex<()>>>>,
    /// The shared navigation control message, guarded against the race
    /// between a live click and the auto-expiry edit.
    controls: AsyncMutex<Option<MessageRef>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the last stored snapshot for the provider, if any.
    pub fn load_cache(&self, id: &ProviderId) -> Option<ProviderState> {
        self.inner.cache.lock().unwrap().get(id).cloned()
    }

    /// Overwrites the stored snapshot for the provider.
    pub fn store_cache(&self, id: &ProviderId, snapshot: ProviderState) {
        self.inner.cache.lock().unwrap().insert(id.clone(), snapshot);
    }

    /// Replaces the registered display message for the provider.
    pub fn register_message(&self, id: &ProviderId, message: MessageRef) {
        self.inner.messages.lock().unwrap().insert(id.clone(), message);
    }

    /// Looks up the message currently displaying the provider's page.
    pub fn lookup_message(&self, id: &ProviderId) -> Option<MessageRef> {
        self.inner.messages.lock().unwrap().get(id).cloned()
    }

    /// Acquires the provider's transition lock.
    ///
    /// Every cache read, page mutation, fetch, and cache write for one
    /// provider must happen under this guard; two rapid clicks otherwise race
    /// the read-modify-write of the page counter.
    pub async fn lock_provider(&self, id: &ProviderId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.inner.locks.lock().unwrap();
            locks.entry(id.clone()).or_default().clone()
        };

        lock.lock_owned().await
    }

    /// Records the shared controls message and returns the guard protecting
    /// it; the caller holds the guard across the send so a racing click
    /// cannot observe a half-registered control pair.
    pub async fn controls(&self) -> tokio::sync::MutexGuard<'_, Option<MessageRef>> {
        self.inner.controls.lock().await
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> ProviderId {
        ProviderId::new(name)
    }

    #[test]
    fn load_on_unwritten_identity_is_absent() {
        let session = SessionContext::new();

        assert!(session.load_cache(&id("meetup")).is_none());
    }

    #[test]
    fn store_then_load_round_trips() {
        let session = SessionContext::new();
        let snapshot = ProviderState {
            query: "coding".to_string(),
            page: 3,
            per_page: 4,
            ..Default::default()
        };

        session.store_cache(&id("meetup"), snapshot.clone());

        assert_eq!(session.load_cache(&id("meetup")), Some(snapshot));
    }

    #[test]
    fn store_overwrites_previous_snapshot() {
        let session = SessionContext::new();

        session.store_cache(&id("meetup"), ProviderState { page: 1, ..Default::default() });
        session.store_cache(&id("meetup"), ProviderState { page: 2, ..Default::default() });

        assert_eq!(session.load_cache(&id("meetup")).unwrap().page, 2);
    }

    #[test]
    fn registry_replaces_rather_than_appends() {
        let session = SessionContext::new();
        let first = MessageRef {
            channel_id: "C1".to_string(),
            message_ts: "100.0".to_string(),
        };
        let second = MessageRef {
            channel_id: "C1".to_string(),
            message_ts: "200.0".to_string(),
        };

        session.register_message(&id("meetup"), first);
        session.register_message(&id("meetup"), second.clone());

        assert_eq!(session.lookup_message(&id("meetup")), Some(second));
    }

    #[test]
    fn distinct_identities_do_not_collide() {
        let session = SessionContext::new();

        session.store_cache(&id("meetup"), ProviderState { page: 5, ..Default::default() });

        assert!(session.load_cache(&id("eventbrite")).is_none());
    }

    #[tokio::test]
    async fn provider_lock_is_stable_across_calls() {
        let session = SessionContext::new();

        let guard = session.lock_provider(&id("meetup")).await;

        // The same identity maps to the same lock, so a second acquisition
        // must not succeed while the first guard is held.
        assert!(
            tokio::time::timeout(std::time::Duration::from_millis(50), session.lock_provider(&id("meetup")))
                .await
                .is_err()
        );

        drop(guard);
        let _reacquired = session.lock_provider(&id("meetup")).await;
    }
}
