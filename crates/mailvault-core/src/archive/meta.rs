//! Metadata keys.

/// Key of one `KEY=VALUE` metadata line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaField {
    /// Content file name.
    DataFile,
    /// Time the archive was opened.
    Time,
    /// MTA session id.
    SessionId,
    /// MTA message id.
    MsgId,
    /// MTA hostname from the greeting.
    MtaName,
    /// Name the client sent in HELO/EHLO.
    HeloName,
    /// Authenticated user, empty if none.
    UserName,
    /// Reverse DNS name of the client.
    Rdns,
    /// Client address.
    Src,
    /// Accepted sender.
    From,
    /// Accepted recipients, comma-joined.
    To,
    /// Envelope id.
    EnvelopeId,
    /// Final state (`REJECTED`).
    State,
}

impl MetaField {
    /// Returns the key as written to the metadata file.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DataFile => "DATAFILE",
            Self::Time => "TIME",
            Self::SessionId => "SESSIONID",
            Self::MsgId => "MSGID",
            Self::MtaName => "MTANAME",
            Self::HeloName => "HELONAME",
            Self::UserName => "USERNAME",
            Self::Rdns => "RDNS",
            Self::Src => "SRC",
            Self::From => "FROM",
            Self::To => "TO",
            Self::EnvelopeId => "ENVELOPEID",
            Self::State => "STATE",
        }
    }
}

impl std::fmt::Display for MetaField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
