use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Err = anyhow::Error;
pub type Res<T> = Result<T, Err>;
pub type Void = Res<()>;

/// Stable identity for one configured provider instance.
///
/// Assigned at construction time and used to key the session cache store and
/// message registry. Two calls against the same logical provider always yield
/// the same identity; distinct providers must not collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderId(pub String);

impl ProviderId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One event record as returned by a provider's backing search service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    /// ISO-8601-like start timestamp, e.g. `2023-03-17T18:30-04:00`.
    pub start_time: String,
    /// ISO-8601-like end timestamp, same shape as `start_time`.
    pub end_time: String,
    pub timezone: String,
    pub url: String,
    /// Attendance count.
    pub going: u64,
}

/// One page of search results plus the continuation state for the next page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPage {
    pub records: Vec<EventRecord>,
    /// Opaque continuation token marking where the next page begins.
    pub cursor: Option<String>,
    pub has_next_page: bool,
}

/// The full mutable state of one provider, externalized into the session
/// cache store between interactions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderState {
    /// Free-text search string, fixed for the lifetime of one command invocation.
    pub query: String,
    /// 1-based page number.
    pub page: u32,
    /// Page size, fixed at invocation time.
    pub per_page: u32,
    /// Most recently fetched results; replaced wholesale on every fetch.
    pub last_results: Vec<EventRecord>,
    /// Continuation cursor from the last fetch; empty at the final page.
    pub cursor: Option<String>,
    pub has_next_page: bool,
}

/// Reference to an externally addressable chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    pub channel_id: String,
    pub message_ts: String,
}

/// Direction of a pagination click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAction {
    Next,
    Previous,
}

impl std::fmt::Display for PageAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageAction::Next => write!(f, "next"),
            PageAction::Previous => write!(f, "previous"),
        }
    }
}

/// Enabled/disabled state of the shared navigation control pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlState {
    pub previous_enabled: bool,
    pub next_enabled: bool,
}

impl ControlState {
    /// Both buttons inert; used by the auto-expiry edit.
    pub const DISABLED: Self = Self {
        previous_enabled: false,
        next_enabled: false,
    };
}

/// Failure taxonomy for one interaction. Wrapped in `anyhow` at call sites so
/// the usual `?` propagation applies.
#[derive(Debug, Error)]
pub enum BotError {
    /// Transport or decode failure reaching a provider's backend.
    #[error("provider `{provider}` failed to fetch events: {reason}")]
    Fetch { provider: ProviderId, reason: String },
    /// Chat platform rejected a message send.
    #[error("failed to send message to channel `{channel_id}`: {reason}")]
    Send { channel_id: String, reason: String },
    /// Chat platform rejected a message edit.
    #[error("failed to edit message `{message_ts}`: {reason}")]
    Edit { message_ts: String, reason: String },
    /// A click arrived for a control identity with no registered handler.
    #[error("no handler registered for control `{control_id}`")]
    UnknownControl { control_id: String },
}
