//! Filter protocol version.

/// Version at which `filter-result` and `filter-dataline` put the session id
/// before the token.
pub const SESSION_FIRST_SINCE: &str = "0.5";

/// Protocol version string as sent in the second field of every record.
///
/// Versions are compared as strings, never as numbers: `"0.10"` sorts
/// before `"0.5"`, exactly like the MTA-side filters this talks to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProtocolVersion(String);

impl ProtocolVersion {
    /// Creates a version from its wire form.
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    /// Returns the version as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if replies must carry the session id before the token.
    #[must_use]
    pub fn session_first(&self) -> bool {
        self.0.as_str() >= SESSION_FIRST_SINCE
    }
}

impl From<&str> for ProtocolVersion {
    fn from(version: &str) -> Self {
        Self::new(version)
    }
}

impl std::fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
