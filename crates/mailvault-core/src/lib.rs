//! # mailvault-core
//!
//! Protocol state machine and archive engine for the mailvault filter.
//!
//! This crate provides:
//! - **Archive Store** - per-message content and metadata files in a
//!   date-bucketed (or flat) directory tree
//! - **Session Registry** - live SMTP sessions and their transactions,
//!   keyed by the MTA's session id
//! - **Event Dispatcher** - applies decoded protocol events to the registry
//!   and the archives, producing filter replies
//! - **Bootstrapper and filter loop** - the startup handshake and the
//!   strictly sequential read/dispatch/reply loop
//!
//! ## Example
//!
//! ```ignore
//! use mailvault_core::{ArchiveConfig, ArchiveStore, Dispatcher, Filter};
//!
//! let store = ArchiveStore::new(ArchiveConfig::new("/var/db/mail-archive"));
//! let filter = Filter::new(Dispatcher::new(store));
//! filter.run(tokio::io::BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod archive;
pub mod bootstrap;
pub mod dispatch;
mod error;
pub mod filter;
pub mod session;

pub use archive::{
    Archive, ArchiveConfig, ArchiveError, ArchiveStore, Clock, FixedClock, Layout, MetaField,
    SystemClock,
};
pub use bootstrap::{Handshake, handshake};
pub use dispatch::Dispatcher;
pub use error::{Error, Result, Severity};
pub use filter::Filter;
pub use session::{Registry, Session, Transaction};
