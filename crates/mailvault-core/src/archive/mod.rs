//! On-disk message archive.
//!
//! Every transaction gets two sibling files in the same bucket directory:
//!
//! ```text
//! <root>/<YYYY-MM>/<DD>/<session>.<message>.<unix-time>        raw content
//! <root>/<YYYY-MM>/<DD>/<session>.<message>.<unix-time>.meta   KEY=VALUE lines
//! ```
//!
//! In [`Layout::Flat`] mode the files go straight into `<root>`.

mod clock;
mod config;
mod error;
mod meta;
mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ArchiveConfig, ArchiveConfigBuilder, Layout};
pub use error::ArchiveError;
pub use meta::MetaField;
pub use store::{Archive, ArchiveStore};
