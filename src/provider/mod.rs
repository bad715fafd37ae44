pub mod meetup;

use std::{
    ops::Deref,
    sync::{Arc, LazyLock},
};

use async_trait::async_trait;
use regex::Regex;

use crate::base::types::{EventRecord, ProviderId, ProviderState, Void};

// Traits.

/// Capability contract any event source must implement to take part in the
/// aggregate events command.
///
/// A provider owns its mutable state (`ProviderState`) behind interior
/// mutability; between interactions that state is externalized into the
/// session cache store via `get_cache`/`set_cache` rather than held live.
#[async_trait]
pub trait GenericEventProvider: Send + Sync + 'static {
    /// Stable identity assigned at construction time; keys the cache store
    /// and the message registry.
    fn id(&self) -> &ProviderId;

    /// Seed the state for a fresh command invocation: the given query (or the
    /// instance default), page 1, the instance page size, no results.
    fn prepare(&self, query: Option<&str>);

    /// Run the provider's search using the currently cached query, page, page
    /// size, and cursor, replacing `last_results` and the continuation state
    /// wholesale on success. The caller does not retry automatically.
    async fn fetch_events(&self) -> Void;

    /// Render `last_results` into a display string. Pure with respect to the
    /// current state; never fetches.
    fn construct_reply(&self) -> String;

    /// Advance the cached page counter.
    fn increment_page(&self);

    /// Retreat the cached page counter. Whether this floors at page 1 is the
    /// provider's policy; the reference provider clamps.
    fn decrement_page(&self);

    fn current_page(&self) -> u32;

    /// Whether the last fetch reported a further page.
    fn has_next_page(&self) -> bool;

    /// Externalize the full mutable state.
    fn get_cache(&self) -> ProviderState;

    /// Restore previously externalized state.
    fn set_cache(&self, snapshot: ProviderState);

    /// Reset to empty state, forcing the next fetch to fall back to the
    /// instance-level defaults.
    fn clear_cache(&self);
}

// Structs.

/// Event provider handle for the application.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct EventProvider {
    inner: Arc<dyn GenericEventProvider>,
}

impl Deref for EventProvider {
    type Target = dyn GenericEventProvider;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl EventProvider {
    pub fn new(inner: Arc<dyn GenericEventProvider>) -> Self {
        Self { inner }
    }
}

// Rendering.

static URL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https://\S+").unwrap());

/// Maximum description length before truncation.
const DESCRIPTION_LIMIT: usize = 250;

/// Renders one event as a reply block.
pub fn format_event(event: &EventRecord) -> String {
    format!(
        "**title**: {}({} ppl)\n**description**: {}\n**date**: {}\n**URL**: <{}>\n\n",
        event.title,
        event.going,
        tidy_description(&event.description),
        format_time_window(&event.start_time, &event.end_time),
        event.url,
    )
}

/// Cleans a raw event description for display.
///
/// Newlines always become spaces. Descriptions longer than the limit are
/// truncated, have any `https://` fragment wrapped in angle brackets to
/// suppress link previews, get a trailing ellipsis, and lose literal `*`
/// emphasis markers that would clash with the reply's own markup.
fn tidy_description(description: &str) -> String {
    let mut description = description.replace('\n', " ");

    if description.chars().count() > DESCRIPTION_LIMIT {
        description = description.chars().take(DESCRIPTION_LIMIT).collect();
        description = URL_RE.replace_all(&description, "<$0>").into_owned();
        description.push_str("...");
        description = description.replace('*', "");
    }

    description
}

/// Formats a start/end pair like `2023-03-17T18:30-04:00` as
/// `2023-03-17, 18:30 - 18:30`: split on the date/time separator and drop the
/// trailing UTC-offset suffix.
fn format_time_window(start: &str, end: &str) -> String {
    let (date, start_time) = split_timestamp(start);
    let (_, end_time) = split_timestamp(end);

    format!("{date}, {start_time} - {end_time}")
}

fn split_timestamp(timestamp: &str) -> (&str, &str) {
    match timestamp.split_once('T') {
        Some((date, time)) => (date, time.split('-').next().unwrap_or(time)),
        // Not a timestamp shape we recognize; show it as-is in the date slot.
        None => (timestamp, ""),
    }
}

// Tests.
