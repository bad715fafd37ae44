//! Service integrations for external APIs and clients.
//!
//! This module contains implementations for the services used by event-scout:
//! - Chat services (e.g., Slack)
//! - Event-search backends (e.g., the meetup search proxy)
//!
//! Each service module defines both generic traits and concrete implementations,
//! allowing for extensibility and easy testing.

pub mod chat;
pub mod search;
