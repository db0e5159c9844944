//! SMTP session state.
//!
//! This module tracks every live connection the MTA reports and the message
//! transaction each one may have open.

mod model;
mod registry;

pub use model::{Session, Transaction};
pub use registry::Registry;
