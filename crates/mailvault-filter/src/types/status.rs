//! Outcome fields carried by report events.

/// Result of a `MAIL FROM` or `RCPT TO` step (`tx-mail`, `tx-rcpt`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxResult {
    /// Accepted.
    Ok,
    /// Temporarily refused.
    TempFail,
    /// Permanently refused.
    PermFail,
    /// Any value this filter does not know about.
    Other(String),
}

impl TxResult {
    /// Parses the wire form. Unknown values are kept, never rejected.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "ok" => Self::Ok,
            "tempfail" => Self::TempFail,
            "permfail" => Self::PermFail,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns true if the step was accepted.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// Result of an `AUTH` exchange (`link-auth`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthResult {
    /// Credentials accepted.
    Pass,
    /// Credentials refused.
    Fail,
    /// Authentication backend error.
    Error,
    /// Any value this filter does not know about.
    Other(String),
}

impl AuthResult {
    /// Parses the wire form. Unknown values are kept, never rejected.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "pass" => Self::Pass,
            "fail" => Self::Fail,
            "error" => Self::Error,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns true if the user authenticated.
    #[must_use]
    pub const fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}
