//! Filter protocol record parser.
//!
//! Records are split as bytes. Header fields and event parameters are
//! decoded leniently to text; a `data-line` payload is kept as raw bytes.

use std::borrow::Cow;

use crate::DELIMITER;
use crate::error::{Error, Result};
use crate::types::{
    AuthResult, Category, Event, EventKind, FilterEvent, ProtocolVersion, ReportEvent, SessionId,
    TxResult,
};

/// Number of fixed header fields every event line carries.
pub const MIN_FIELDS: usize = 6;

/// An event line split into its positional fields.
///
/// Borrowed from the input line; nothing past the header is interpreted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<'a> {
    /// `report` or `filter`.
    pub category: Category,
    /// Protocol version string.
    pub version: Cow<'a, str>,
    /// Agent timestamp (not interpreted).
    pub timestamp: Cow<'a, str>,
    /// Agent subsystem, `smtp-in` (not interpreted).
    pub subsystem: Cow<'a, str>,
    /// Event name.
    pub event: Cow<'a, str>,
    /// Session id.
    pub session: Cow<'a, str>,
    /// Event-specific parameters, undecoded.
    pub params: Vec<&'a [u8]>,
}

impl<'a> Record<'a> {
    /// Splits an event line into its fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the line has fewer than [`MIN_FIELDS`] fields or
    /// an unknown category.
    pub fn parse<L>(line: &'a L) -> Result<Self>
    where
        L: AsRef<[u8]> + ?Sized,
    {
        let fields: Vec<&[u8]> = line.as_ref().split(|b| *b == DELIMITER).collect();
        if fields.len() < MIN_FIELDS {
            return Err(Error::TooFewFields {
                min: MIN_FIELDS,
                found: fields.len(),
            });
        }

        Ok(Self {
            category: Category::parse(&text(fields[0]))?,
            version: text(fields[1]),
            timestamp: text(fields[2]),
            subsystem: text(fields[3]),
            event: text(fields[4]),
            session: text(fields[5]),
            params: fields[6..].to_vec(),
        })
    }

    /// Decodes the record into a typed event.
    ///
    /// # Errors
    ///
    /// Returns an error if the event name is not known for the record's
    /// category or if it carries the wrong number of parameters.
    pub fn decode(&self) -> Result<Event> {
        let kind = match self.category {
            Category::Report => {
                let params: Vec<Cow<'_, str>> = self.params.iter().copied().map(text).collect();
                EventKind::Report(decode_report(&self.event, &params)?)
            }
            Category::Filter => EventKind::Filter(decode_filter(&self.event, &self.params)?),
        };

        Ok(Event {
            version: ProtocolVersion::new(&*self.version),
            session: SessionId::new(&*self.session),
            kind,
        })
    }
}

impl Event {
    /// Parses and decodes one event line.
    ///
    /// # Errors
    ///
    /// Returns an error if the line is not a well-formed event record.
    pub fn parse<L>(line: &L) -> Result<Self>
    where
        L: AsRef<[u8]> + ?Sized,
    {
        Record::parse(line)?.decode()
    }
}

/// Decodes a field as text, replacing invalid UTF-8.
fn text(field: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(field)
}

fn decode_report(name: &str, params: &[Cow<'_, str>]) -> Result<ReportEvent> {
    let event = match name {
        "link-connect" => match params {
            [rdns, fcrdns, src, dest] => ReportEvent::LinkConnect {
                rdns: (*rdns).to_string(),
                fcrdns: (*fcrdns).to_string(),
                src: (*src).to_string(),
                dest: (*dest).to_string(),
            },
            _ => return Err(Error::arity("link-connect", "4", params.len())),
        },
        "link-disconnect" => match params {
            [] => ReportEvent::LinkDisconnect,
            _ => return Err(Error::arity("link-disconnect", "0", params.len())),
        },
        "link-greeting" => match params {
            [hostname] => ReportEvent::LinkGreeting {
                hostname: (*hostname).to_string(),
            },
            _ => return Err(Error::arity("link-greeting", "1", params.len())),
        },
        "link-identify" => match params {
            [method, hostname] => ReportEvent::LinkIdentify {
                method: (*method).to_string(),
                hostname: (*hostname).to_string(),
            },
            _ => return Err(Error::arity("link-identify", "2", params.len())),
        },
        "link-auth" => match params {
            [username, result] => ReportEvent::LinkAuth {
                username: (*username).to_string(),
                result: AuthResult::parse(result),
            },
            _ => return Err(Error::arity("link-auth", "2", params.len())),
        },
        "tx-reset" => match params {
            [] => {
                tracing::debug!("tx-reset without message id");
                ReportEvent::TxReset { message_id: None }
            }
            [message_id] => ReportEvent::TxReset {
                message_id: Some((*message_id).to_string()),
            },
            _ => return Err(Error::arity("tx-reset", "0 or 1", params.len())),
        },
        "tx-begin" => match params {
            [message_id] => ReportEvent::TxBegin {
                message_id: (*message_id).to_string(),
            },
            _ => return Err(Error::arity("tx-begin", "1", params.len())),
        },
        "tx-mail" => match params {
            [message_id, address, result] => ReportEvent::TxMail {
                message_id: (*message_id).to_string(),
                address: (*address).to_string(),
                result: TxResult::parse(result),
            },
            _ => return Err(Error::arity("tx-mail", "3", params.len())),
        },
        "tx-rcpt" => match params {
            [message_id, address, result] => ReportEvent::TxRcpt {
                message_id: (*message_id).to_string(),
                address: (*address).to_string(),
                result: TxResult::parse(result),
            },
            _ => return Err(Error::arity("tx-rcpt", "3", params.len())),
        },
        "tx-envelope" => match params {
            [message_id, envelope_id] => ReportEvent::TxEnvelope {
                message_id: (*message_id).to_string(),
                envelope_id: (*envelope_id).to_string(),
            },
            _ => return Err(Error::arity("tx-envelope", "2", params.len())),
        },
        "tx-rollback" => match params {
            [message_id] => ReportEvent::TxRollback {
                message_id: (*message_id).to_string(),
            },
            _ => return Err(Error::arity("tx-rollback", "1", params.len())),
        },
        "timeout" => match params {
            [] => ReportEvent::Timeout,
            _ => return Err(Error::arity("timeout", "0", params.len())),
        },
        other => {
            return Err(Error::UnknownEvent {
                category: Category::Report.to_string(),
                name: other.to_string(),
            });
        }
    };

    Ok(event)
}

fn decode_filter(name: &str, params: &[&[u8]]) -> Result<FilterEvent> {
    let event = match name {
        "data" => match params {
            [token, message_id] => FilterEvent::Data {
                token: text(token).into_owned(),
                message_id: text(message_id).into_owned(),
            },
            _ => return Err(Error::arity("data", "2", params.len())),
        },
        // Content may itself contain the delimiter; glue it back together.
        "data-line" => match params {
            [token, rest @ ..] if !rest.is_empty() => FilterEvent::DataLine {
                token: text(token).into_owned(),
                line: rest.join(&DELIMITER),
            },
            _ => return Err(Error::arity("data-line", "at least 2", params.len())),
        },
        other => {
            return Err(Error::UnknownEvent {
                category: Category::Filter.to_string(),
                name: other.to_string(),
            });
        }
    };

    Ok(event)
}
