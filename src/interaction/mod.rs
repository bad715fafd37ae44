//! Interaction handling for event-scout.
//!
//! This module translates the two inbound interaction kinds into core work:
//! - Command invocations fan out over all configured providers
//!   (`events_command`).
//! - Navigation button clicks drive each provider's page state machine
//!   (`pagination`).

pub mod events_command;
pub mod pagination;

use crate::base::types::PageAction;

/// Control identity of the shared "next page" button.
pub const NEXT_PAGE_CONTROL_ID: &str = "next page";
/// Control identity of the shared "previous page" button.
pub const PREVIOUS_PAGE_CONTROL_ID: &str = "previous page";

/// Maps an inbound control identity to its pagination action, if any.
pub fn page_action_for_control(control_id: &str) -> Option<PageAction> {
    match control_id {
        NEXT_PAGE_CONTROL_ID => Some(PageAction::Next),
        PREVIOUS_PAGE_CONTROL_ID => Some(PageAction::Previous),
        _ => None,
    }
}
