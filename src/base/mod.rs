//! Core components, types, and utilities for event-scout.
//!
//! This module contains fundamental building blocks used throughout the application:
//! - Configuration handling and environment variables.
//! - Common types, provider state, and result handling.

pub mod config;
pub mod types;
