//! Error types for the filter engine.

use mailvault_filter::SessionId;
use thiserror::Error;

use crate::archive::ArchiveError;

/// Errors that can occur while processing the event stream.
#[derive(Debug, Error)]
pub enum Error {
    /// Event line could not be decoded.
    #[error("Protocol error: {0}")]
    Protocol(#[from] mailvault_filter::Error),

    /// Event referenced a session that was never connected.
    #[error("Unknown session {session} for {event}")]
    UnknownSession {
        /// Session id from the event.
        session: SessionId,
        /// Event name.
        event: &'static str,
    },

    /// Archive could not be opened or closed.
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Reading events or writing replies failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// How the filter loop must react to an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Out of sync with the MTA; stop with a failure status.
    Fatal,
    /// Log and keep processing events.
    Recoverable,
}

impl Error {
    /// Classifies the error.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::Archive(_) => Severity::Recoverable,
            Self::Protocol(_) | Self::UnknownSession { .. } | Self::Io(_) => Severity::Fatal,
        }
    }

    /// Returns true if processing must stop.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self.severity(), Severity::Fatal)
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
