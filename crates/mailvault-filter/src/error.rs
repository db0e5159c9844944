//! Error types for protocol decoding.

/// Result type alias for codec operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Protocol decoding errors.
///
/// Every variant means the filter has lost sync with the MTA.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Line has fewer fields than the fixed record header.
    #[error("Too few fields: expected at least {min}, found {found}")]
    TooFewFields {
        /// Minimum number of fields.
        min: usize,
        /// Number of fields in the line.
        found: usize,
    },

    /// First field is neither `report` nor `filter`.
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    /// Event name is not subscribed for this category.
    #[error("Unknown {category} event: {name}")]
    UnknownEvent {
        /// Category the event arrived under.
        category: String,
        /// Event name from the record.
        name: String,
    },

    /// Event carried the wrong number of parameters.
    #[error("Invalid parameter count for {event}: expected {expected}, found {found}")]
    Arity {
        /// Event name.
        event: &'static str,
        /// Human-readable expected count.
        expected: &'static str,
        /// Number of parameters received.
        found: usize,
    },
}

impl Error {
    pub(crate) const fn arity(event: &'static str, expected: &'static str, found: usize) -> Self {
        Self::Arity {
            event,
            expected,
            found,
        }
    }
}
