pub mod meetup;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::types::{EventPage, Res};

// Traits.

/// Generic event-search trait that provider backends must implement.
///
/// This is the narrow boundary between a provider and the service it queries;
/// the request/response wire shape is backend-specific and lives entirely
/// behind this trait.
#[async_trait]
pub trait GenericSearchClient: Send + Sync + 'static {
    /// Run one paginated search.
    ///
    /// `cursor` is the opaque continuation token from the previous page, if
    /// any. The returned page carries the token for the page after it.
    async fn search(&self, query: &str, page: u32, per_page: u32, cursor: Option<&str>) -> Res<EventPage>;
}

// Structs.

/// Search client for the application.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct SearchClient {
    inner: Arc<dyn GenericSearchClient>,
}

impl Deref for SearchClient {
    type Target = dyn GenericSearchClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl SearchClient {
    pub fn new(inner: Arc<dyn GenericSearchClient>) -> Self {
        Self { inner }
    }
}
