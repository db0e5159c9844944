//! Core filter protocol types.

mod event;
mod session;
mod status;
mod version;

pub use event::{Category, Event, EventKind, FilterEvent, ReportEvent};
pub use session::SessionId;
pub use status::{AuthResult, TxResult};
pub use version::ProtocolVersion;
