//! Reference event provider backed by the meetup search service.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::instrument;

use crate::{
    base::{
        config::Config,
        types::{BotError, ProviderId, ProviderState, Void},
    },
    service::search::SearchClient,
};

use super::{EventProvider, GenericEventProvider, format_event};

// Extra methods on `EventProvider` applied by the meetup implementation.

impl EventProvider {
    /// Creates a new meetup event provider.
    pub fn meetup(config: &Config, search: SearchClient) -> Self {
        Self {
            inner: Arc::new(MeetupProvider::new(config, search)),
        }
    }
}

// Structs.

/// Meetup event provider.
///
/// The live state lives behind a mutex so the provider handle can stay
/// cloneable; the interaction handlers serialize access per provider identity
/// on top of this, so the mutex only guards individual accessor calls.
pub struct MeetupProvider {
    id: ProviderId,
    search: SearchClient,
    default_query: String,
    per_page: u32,
    state: Mutex<ProviderState>,
}

impl MeetupProvider {
    pub fn new(config: &Config, search: SearchClient) -> Self {
        Self::with_id("meetup", config, search)
    }

    /// Provider keyed by a custom identity, letting several differently
    /// scoped meetup searches coexist behind one aggregate command.
    pub fn with_id(name: &str, config: &Config, search: SearchClient) -> Self {
        Self {
            id: ProviderId::new(name),
            search,
            default_query: config.default_query.clone(),
            per_page: config.per_page,
            state: Mutex::new(ProviderState::default()),
        }
    }
}

#[async_trait]
impl GenericEventProvider for MeetupProvider {
    fn id(&self) -> &ProviderId {
        &self.id
    }

    fn prepare(&self, query: Option<&str>) {
        let mut state = self.state.lock().unwrap();

        *state = ProviderState {
            query: query.unwrap_or(&self.default_query).to_string(),
            page: 1,
            per_page: self.per_page,
            ..Default::default()
        };
    }

    #[instrument(name = "MeetupProvider::fetch_events", skip_all)]
    async fn fetch_events(&self) -> Void {
        let (query, page, per_page, cursor) = {
            let mut state = self.state.lock().unwrap();

            // Cleared state falls back to the instance defaults; this is the
            // documented provider policy for a consumed cache.
            if state.query.is_empty() {
                state.query = self.default_query.clone();
                state.page = 1;
            }
            if state.per_page == 0 {
                state.per_page = self.per_page;
            }

            (state.query.clone(), state.page, state.per_page, state.cursor.clone())
        };

        let fetched = self
            .search
            .search(&query, page, per_page, cursor.as_deref())
            .await
            .map_err(|e| BotError::Fetch {
                provider: self.id.clone(),
                reason: e.to_string(),
            })?;

        let mut state = self.state.lock().unwrap();
        state.last_results = fetched.records;
        state.cursor = fetched.cursor;
        state.has_next_page = fetched.has_next_page;

        Ok(())
    }

    fn construct_reply(&self) -> String {
        let state = self.state.lock().unwrap();

        if state.last_results.is_empty() {
            return format!("No events found for `{}`.", state.query);
        }

        state.last_results.iter().map(format_event).collect()
    }

    fn increment_page(&self) {
        self.state.lock().unwrap().page += 1;
    }

    fn decrement_page(&self) {
        let mut state = self.state.lock().unwrap();
        // Page 1 is the floor; decrementing there is a no-op.
        state.page = state.page.saturating_sub(1).max(1);
    }

    fn current_page(&self) -> u32 {
        self.state.lock().unwrap().page
    }

    fn has_next_page(&self) -> bool {
        self.state.lock().unwrap().has_next_page
    }

    fn get_cache(&self) -> ProviderState {
        self.state.lock().unwrap().clone()
    }

    fn set_cache(&self, snapshot: ProviderState) {
        *self.state.lock().unwrap() = snapshot;
    }

    fn clear_cache(&self) {
        *self.state.lock().unwrap() = ProviderState::default();
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{config::ConfigInner, types::{EventPage, EventRecord, Res}};
    use crate::service::search::GenericSearchClient;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Search stub that records call counts and hands back one canned record
    /// per requested page.
    struct StubSearch {
        calls: AtomicUsize,
        has_next_page: bool,
    }

    impl StubSearch {
        fn new(has_next_page: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                has_next_page,
            }
        }
    }

    #[async_trait]
    impl GenericSearchClient for StubSearch {
        async fn search(&self, query: &str, page: u32, _per_page: u32, _cursor: Option<&str>) -> Res<EventPage> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            Ok(EventPage {
                records: vec![EventRecord {
                    id: page.to_string(),
                    title: format!("{query} page {page}"),
                    description: "desc".to_string(),
                    start_time: "2023-03-17T18:30-04:00".to_string(),
                    end_time: "2023-03-17T20:30-04:00".to_string(),
                    timezone: "UTC".to_string(),
                    url: "https://example.com".to_string(),
                    going: 1,
                }],
                cursor: Some(format!("cursor-{page}")),
                has_next_page: self.has_next_page,
            })
        }
    }

    fn config() -> Config {
        Config {
            inner: Arc::new(ConfigInner {
                default_query: "tech".to_string(),
                per_page: 4,
                ..Default::default()
            }),
        }
    }

    fn provider(search: Arc<StubSearch>) -> MeetupProvider {
        MeetupProvider::new(&config(), SearchClient::new(search))
    }

    #[test]
    fn prepare_seeds_page_one_with_given_query() {
        let provider = provider(Arc::new(StubSearch::new(true)));

        provider.prepare(Some("coding"));

        let state = provider.get_cache();
        assert_eq!(state.query, "coding");
        assert_eq!(state.page, 1);
        assert_eq!(state.per_page, 4);
        assert!(state.last_results.is_empty());
    }

    #[test]
    fn prepare_without_query_uses_instance_default() {
        let provider = provider(Arc::new(StubSearch::new(true)));

        provider.prepare(None);

        assert_eq!(provider.get_cache().query, "tech");
    }

    #[tokio::test]
    async fn fetch_replaces_results_and_continuation_state() {
        let provider = provider(Arc::new(StubSearch::new(true)));
        provider.prepare(Some("coding"));

        provider.fetch_events().await.unwrap();

        let state = provider.get_cache();
        assert_eq!(state.last_results.len(), 1);
        assert_eq!(state.cursor.as_deref(), Some("cursor-1"));
        assert!(state.has_next_page);
    }

    #[tokio::test]
    async fn fetch_after_clear_falls_back_to_defaults() {
        let provider = provider(Arc::new(StubSearch::new(false)));
        provider.clear_cache();

        provider.fetch_events().await.unwrap();

        let state = provider.get_cache();
        assert_eq!(state.query, "tech");
        assert_eq!(state.page, 1);
        assert_eq!(state.per_page, 4);
    }

    #[test]
    fn decrement_clamps_at_page_one() {
        let provider = provider(Arc::new(StubSearch::new(true)));
        provider.prepare(Some("coding"));

        provider.decrement_page();
        provider.decrement_page();

        assert_eq!(provider.current_page(), 1);
    }

    #[test]
    fn cache_round_trip_restores_full_state() {
        let provider = provider(Arc::new(StubSearch::new(true)));
        let snapshot = ProviderState {
            query: "coding".to_string(),
            page: 7,
            per_page: 4,
            cursor: Some("cursor-7".to_string()),
            has_next_page: true,
            ..Default::default()
        };

        provider.set_cache(snapshot.clone());

        assert_eq!(provider.get_cache(), snapshot);
    }

    #[test]
    fn empty_results_render_a_placeholder() {
        let provider = provider(Arc::new(StubSearch::new(true)));
        provider.prepare(Some("nothing"));

        assert_eq!(provider.construct_reply(), "No events found for `nothing`.");
    }

    #[tokio::test]
    async fn reply_is_pure_with_respect_to_state() {
        let search = Arc::new(StubSearch::new(true));
        let provider = provider(search.clone());
        provider.prepare(Some("coding"));
        provider.fetch_events().await.unwrap();

        let first = provider.construct_reply();
        let second = provider.construct_reply();

        assert_eq!(first, second);
        assert_eq!(search.calls.load(Ordering::SeqCst), 1);
    }
}
