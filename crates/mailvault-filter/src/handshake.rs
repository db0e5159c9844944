//! Startup handshake lines.
//!
//! The MTA first streams its configuration, ending with [`CONFIG_READY`].
//! The filter then registers every event it wants to see and finishes with
//! [`REGISTER_READY`].

use crate::SUBSYSTEM;
use crate::types::{Category, FilterEvent, ReportEvent};

/// Last configuration line sent by the MTA.
pub const CONFIG_READY: &str = "config|ready";

/// Line that closes the registration phase.
pub const REGISTER_READY: &str = "register|ready";

/// Renders one registration line.
#[must_use]
pub fn register_line(category: Category, event: &str) -> String {
    format!("register|{category}|{SUBSYSTEM}|{event}")
}

/// Returns every registration line followed by [`REGISTER_READY`].
#[must_use]
pub fn registration() -> Vec<String> {
    ReportEvent::NAMES
        .iter()
        .map(|name| register_line(Category::Report, name))
        .chain(
            FilterEvent::NAMES
                .iter()
                .map(|name| register_line(Category::Filter, name)),
        )
        .chain(std::iter::once(REGISTER_READY.to_string()))
        .collect()
}
