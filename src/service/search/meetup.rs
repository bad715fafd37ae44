//! Meetup search backend.
//!
//! Queries the meetup search proxy over HTTP:
//! `GET {api_url}/meetup/search?query=...&page=...&per_page=...&after=...`.
//! The response shape mirrors the proxy's GraphQL passthrough: a `page_info`
//! block with the continuation cursor, and a flat list of event nodes.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use crate::base::{
    config::Config,
    types::{EventPage, EventRecord, Res},
};

use super::{GenericSearchClient, SearchClient};

// Extra methods on `SearchClient` applied by the meetup implementation.

impl SearchClient {
    /// Creates a new meetup search client.
    pub fn meetup(config: &Config) -> Res<Self> {
        let client = MeetupSearchClient::new(config)?;
        Ok(Self { inner: Arc::new(client) })
    }
}

// Wire types.

#[derive(Debug, Deserialize)]
struct SearchResponse {
    page_info: PageInfo,
    #[serde(default)]
    nodes: Vec<EventNode>,
}

#[derive(Debug, Default, Deserialize)]
struct PageInfo {
    #[serde(rename = "endCursor", default)]
    end_cursor: String,
    #[serde(rename = "hasNextPage", default)]
    has_next_page: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventNode {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    date_time: String,
    #[serde(default)]
    end_time: String,
    #[serde(default)]
    timezone: String,
    #[serde(default)]
    event_url: String,
    #[serde(default)]
    going: u64,
}

impl From<EventNode> for EventRecord {
    fn from(node: EventNode) -> Self {
        Self {
            id: node.id,
            title: node.title,
            description: node.description,
            start_time: node.date_time,
            end_time: node.end_time,
            timezone: node.timezone,
            url: node.event_url,
            going: node.going,
        }
    }
}

// Structs.

/// Meetup search client implementation.
struct MeetupSearchClient {
    api_url: String,
    client: reqwest::Client,
}

impl MeetupSearchClient {
    fn new(config: &Config) -> Res<Self> {
        // The request timeout bounds a fetch that never returns; the caller
        // surfaces the timeout as a fetch error and keeps its prior state.
        let client = reqwest::Client::builder().timeout(Duration::from_secs(config.search_timeout_secs)).build()?;

        Ok(Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl GenericSearchClient for MeetupSearchClient {
    #[instrument(name = "MeetupSearchClient::search", skip(self))]
    async fn search(&self, query: &str, page: u32, per_page: u32, cursor: Option<&str>) -> Res<EventPage> {
        let url = format!("{}/meetup/search", self.api_url);

        let mut request = self.client.get(&url).query(&[("query", query)]).query(&[("page", page), ("per_page", per_page)]);

        if let Some(after) = cursor {
            request = request.query(&[("after", after)]);
        }

        let response = request.send().await?.error_for_status()?;
        let body: SearchResponse = response.json().await?;

        let cursor = if body.page_info.end_cursor.is_empty() { None } else { Some(body.page_info.end_cursor) };

        Ok(EventPage {
            records: body.nodes.into_iter().map(EventRecord::from).collect(),
            cursor,
            has_next_page: body.page_info.has_next_page,
        })
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_decodes_proxy_shape() {
        let raw = r#"{
            "page_info": { "endCursor": "abc123", "hasNextPage": true },
            "nodes": [
                {
                    "id": "1",
                    "title": "Rust and Tell",
                    "description": "Talks.",
                    "dateTime": "2023-03-17T18:30-04:00",
                    "endTime": "2023-03-17T20:30-04:00",
                    "timezone": "America/Toronto",
                    "eventUrl": "https://meetup.com/rust-and-tell",
                    "going": 42
                }
            ]
        }"#;

        let body: SearchResponse = serde_json::from_str(raw).unwrap();

        assert_eq!(body.page_info.end_cursor, "abc123");
        assert!(body.page_info.has_next_page);
        assert_eq!(body.nodes.len(), 1);

        let record = EventRecord::from(body.nodes.into_iter().next().unwrap());
        assert_eq!(record.title, "Rust and Tell");
        assert_eq!(record.start_time, "2023-03-17T18:30-04:00");
        assert_eq!(record.going, 42);
    }

    #[test]
    fn missing_fields_default_rather_than_fail() {
        let raw = r#"{ "page_info": {}, "nodes": [ { "id": "2" } ] }"#;

        let body: SearchResponse = serde_json::from_str(raw).unwrap();

        assert!(!body.page_info.has_next_page);
        assert_eq!(body.nodes[0].title, "");
    }
}
