//! Filter reply lines.

use crate::types::{ProtocolVersion, SessionId};

/// Reply to a filtering event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// `filter-result|...|proceed`: let the MTA continue.
    Proceed {
        /// Session the reply belongs to.
        session: SessionId,
        /// Token from the filtering event.
        token: String,
    },
    /// `filter-dataline|...|<line>`: hand a content line back to the MTA.
    DataLine {
        /// Session the reply belongs to.
        session: SessionId,
        /// Token from the filtering event.
        token: String,
        /// Content line, still in wire (dot-stuffed) form.
        line: Vec<u8>,
    },
}

impl Response {
    /// Creates a `proceed` result.
    #[must_use]
    pub fn proceed(session: SessionId, token: impl Into<String>) -> Self {
        Self::Proceed {
            session,
            token: token.into(),
        }
    }

    /// Creates a data line reply.
    #[must_use]
    pub fn data_line(
        session: SessionId,
        token: impl Into<String>,
        line: impl Into<Vec<u8>>,
    ) -> Self {
        Self::DataLine {
            session,
            token: token.into(),
            line: line.into(),
        }
    }

    /// Renders the reply for the given protocol version, without newline.
    ///
    /// Before `0.5` the token precedes the session id; from `0.5` on the
    /// order is swapped. A data line payload is copied byte for byte.
    #[must_use]
    pub fn encode(&self, version: &ProtocolVersion) -> Vec<u8> {
        let (verb, session, token, payload) = match self {
            Self::Proceed { session, token } => ("filter-result", session, token, b"proceed".as_slice()),
            Self::DataLine {
                session,
                token,
                line,
            } => ("filter-dataline", session, token, line.as_slice()),
        };

        let mut out = if version.session_first() {
            format!("{verb}|{session}|{token}|")
        } else {
            format!("{verb}|{token}|{session}|")
        }
        .into_bytes();
        out.extend_from_slice(payload);
        out
    }
}
