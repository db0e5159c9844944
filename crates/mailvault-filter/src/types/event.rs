//! Filter protocol events.

use super::{AuthResult, ProtocolVersion, SessionId, TxResult};
use crate::error::{Error, Result};

/// Record category (first field of every event line).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Informational event, no reply expected.
    Report,
    /// Event that must be answered before the MTA proceeds.
    Filter,
}

impl Category {
    /// Parses the wire form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownCategory`] for anything but `report` or `filter`.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "report" => Ok(Self::Report),
            "filter" => Ok(Self::Filter),
            other => Err(Error::UnknownCategory(other.to_string())),
        }
    }

    /// Returns the wire form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Report => "report",
            Self::Filter => "filter",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reporting events this filter subscribes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    /// `link-connect`: a client connected.
    LinkConnect {
        /// Reverse DNS name of the client.
        rdns: String,
        /// Forward-confirmed reverse DNS result.
        fcrdns: String,
        /// Client address.
        src: String,
        /// Local address the client connected to.
        dest: String,
    },
    /// `link-disconnect`: the connection is gone.
    LinkDisconnect,
    /// `link-greeting`: the MTA sent its banner.
    LinkGreeting {
        /// MTA hostname from the banner.
        hostname: String,
    },
    /// `link-identify`: the client sent HELO/EHLO.
    LinkIdentify {
        /// `HELO` or `EHLO`.
        method: String,
        /// Name the client announced.
        hostname: String,
    },
    /// `link-auth`: an AUTH exchange finished.
    LinkAuth {
        /// User name presented by the client.
        username: String,
        /// Outcome of the exchange.
        result: AuthResult,
    },
    /// `tx-reset`: the transaction ended (committed, rolled back or RSET).
    TxReset {
        /// Message id, omitted by the MTA in some situations.
        message_id: Option<String>,
    },
    /// `tx-begin`: a new transaction started.
    TxBegin {
        /// Message id allocated by the MTA.
        message_id: String,
    },
    /// `tx-mail`: MAIL FROM was processed.
    TxMail {
        /// Message id.
        message_id: String,
        /// Sender address.
        address: String,
        /// Whether the sender was accepted.
        result: TxResult,
    },
    /// `tx-rcpt`: RCPT TO was processed.
    TxRcpt {
        /// Message id.
        message_id: String,
        /// Recipient address.
        address: String,
        /// Whether the recipient was accepted.
        result: TxResult,
    },
    /// `tx-envelope`: an envelope was created for the message.
    TxEnvelope {
        /// Message id.
        message_id: String,
        /// Envelope id.
        envelope_id: String,
    },
    /// `tx-rollback`: the message was rejected.
    TxRollback {
        /// Message id.
        message_id: String,
    },
    /// `timeout`: the session timed out.
    Timeout,
}

impl ReportEvent {
    /// Every reporting event name this filter registers for.
    pub const NAMES: [&'static str; 12] = [
        "link-connect",
        "link-disconnect",
        "link-greeting",
        "link-identify",
        "link-auth",
        "tx-reset",
        "tx-begin",
        "tx-mail",
        "tx-rcpt",
        "tx-envelope",
        "tx-rollback",
        "timeout",
    ];

    /// Returns the wire name of the event.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::LinkConnect { .. } => "link-connect",
            Self::LinkDisconnect => "link-disconnect",
            Self::LinkGreeting { .. } => "link-greeting",
            Self::LinkIdentify { .. } => "link-identify",
            Self::LinkAuth { .. } => "link-auth",
            Self::TxReset { .. } => "tx-reset",
            Self::TxBegin { .. } => "tx-begin",
            Self::TxMail { .. } => "tx-mail",
            Self::TxRcpt { .. } => "tx-rcpt",
            Self::TxEnvelope { .. } => "tx-envelope",
            Self::TxRollback { .. } => "tx-rollback",
            Self::Timeout => "timeout",
        }
    }
}

/// Filtering events this filter subscribes to. Each carries the token the
/// reply must echo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterEvent {
    /// `data`: the client issued DATA.
    Data {
        /// Reply token.
        token: String,
        /// Message id.
        message_id: String,
    },
    /// `data-line`: one line of message content, still dot-stuffed.
    DataLine {
        /// Reply token.
        token: String,
        /// Content line as received from the wire, in any encoding.
        line: Vec<u8>,
    },
}

impl FilterEvent {
    /// Every filtering event name this filter registers for.
    pub const NAMES: [&'static str; 2] = ["data", "data-line"];

    /// Returns the wire name of the event.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Data { .. } => "data",
            Self::DataLine { .. } => "data-line",
        }
    }

    /// Returns the reply token.
    #[must_use]
    pub fn token(&self) -> &str {
        match self {
            Self::Data { token, .. } | Self::DataLine { token, .. } => token,
        }
    }
}

/// Event payload, split by category so a reporting name can never arrive
/// as a filter and vice versa.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Reporting event.
    Report(ReportEvent),
    /// Filtering event.
    Filter(FilterEvent),
}

impl EventKind {
    /// Returns the wire name of the event.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Report(event) => event.name(),
            Self::Filter(event) => event.name(),
        }
    }

    /// Returns the category the event belongs to.
    #[must_use]
    pub const fn category(&self) -> Category {
        match self {
            Self::Report(_) => Category::Report,
            Self::Filter(_) => Category::Filter,
        }
    }
}

/// A fully decoded event line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Protocol version of the record; decides the reply layout.
    pub version: ProtocolVersion,
    /// Session the event belongs to.
    pub session: SessionId,
    /// Typed payload.
    pub kind: EventKind,
}

impl Event {
    /// Returns the wire name of the event.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.kind.name()
    }
}
