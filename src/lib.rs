//! Library root for `event-scout`.
//!
//! Event-scout is a Slack bot that aggregates tech-event listings from
//! pluggable search providers:
//! - One slash command fans out over every configured provider and posts each
//!   one's first page of results.
//! - A single shared pair of navigation buttons pages every provider in
//!   lockstep, editing each provider's message in place.
//! - Per-provider state is cached server-side between interactions, so a
//!   click hours later still resumes from the right page.
//!
//! The architecture is built around extensible traits that allow for
//! different implementations of each service: the provider contract, the
//! backing search service, and the chat platform.

pub mod base;
pub mod interaction;
pub mod provider;
pub mod runtime;
pub mod service;
pub mod session;

pub mod prelude;

use base::{config::Config, types::Void};
use rustls::crypto;
use tracing::info;

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the event-scout runtime:
/// - Initializes the crypto provider
/// - Creates the runtime context with the providers, session state, and chat client
/// - Starts the socket-mode listener for commands and button clicks
pub async fn start(config: Config) -> Void {
    info!("Starting event-scout ...");

    // Start the crypto provider.
    crypto::ring::default_provider().install_default().unwrap();

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config)?;

    // Start the runtime.
    runtime.start().await?;

    Ok(())
}
