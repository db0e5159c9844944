//! # mailvault-filter
//!
//! Codec for the line-oriented OpenSMTPD filter protocol.
//!
//! The MTA multiplexes every SMTP session over one byte stream. Each input
//! line is a `|`-separated record:
//!
//! ```text
//! <category>|<version>|<timestamp>|<subsystem>|<event>|<session-id>|<param>...
//! ```
//!
//! This crate turns those lines into strongly-typed [`Event`]s and renders
//! the filter's replies back into wire lines. It performs no I/O.
//!
//! Lines are bytes, not text: message content is relayed exactly as
//! received, whatever its encoding.
//!
//! ## Example
//!
//! ```ignore
//! use std::io::Write;
//! use mailvault_filter::{Event, Response};
//!
//! let event = Event::parse(b"filter|0.6|1576146008.006099|smtp-in|data|7641df9771b4ed00|1ef1c203cc576e5d|4c0f6acd")?;
//! let reply = Response::proceed(event.session.clone(), "1ef1c203cc576e5d");
//! std::io::stdout().write_all(&reply.encode(&event.version))?;
//! ```
//!
//! ## Modules
//!
//! - [`parser`]: Raw record splitting and typed event decoding
//! - [`response`]: Reply lines (`filter-result`, `filter-dataline`)
//! - [`dot`]: SMTP dot-stuffing
//! - [`handshake`]: Startup registration lines
//! - [`types`]: Core protocol types (events, sessions, versions, results)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod dot;
mod error;
pub mod handshake;
pub mod parser;
pub mod response;
pub mod types;

pub use error::{Error, Result};
pub use parser::Record;
pub use response::Response;
pub use types::{
    AuthResult, Category, Event, EventKind, FilterEvent, ProtocolVersion, ReportEvent, SessionId,
    TxResult,
};

/// Field separator of every protocol line.
pub const DELIMITER: u8 = b'|';

/// Subsystem this filter attaches to.
pub const SUBSYSTEM: &str = "smtp-in";
