//! Session and transaction models.

use mailvault_filter::SessionId;

use crate::archive::Archive;

/// State of one client connection.
///
/// The connection attributes start empty and are filled in as the MTA
/// reports them.
#[derive(Debug)]
pub struct Session {
    /// MTA session id.
    pub id: SessionId,
    /// Reverse DNS name of the client.
    pub rdns: String,
    /// Client address.
    pub src: String,
    /// Name the client sent in HELO/EHLO.
    pub helo_name: String,
    /// MTA hostname from the greeting.
    pub mta_name: String,
    /// Authenticated user.
    pub user_name: String,
    /// Message attempt in progress, if any.
    pub transaction: Option<Transaction>,
}

impl Session {
    /// Creates an empty session.
    #[must_use]
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            rdns: String::new(),
            src: String::new(),
            helo_name: String::new(),
            mta_name: String::new(),
            user_name: String::new(),
            transaction: None,
        }
    }

    /// Installs a new transaction, returning the one it replaces.
    pub fn begin(&mut self, transaction: Transaction) -> Option<Transaction> {
        self.transaction.replace(transaction)
    }

    /// Removes the current transaction.
    pub fn end(&mut self) -> Option<Transaction> {
        self.transaction.take()
    }

    /// Returns the archive name for a message of this session.
    #[must_use]
    pub fn archive_name(&self, message_id: &str) -> String {
        format!("{}.{message_id}", self.id)
    }
}

/// One message attempt within a session.
#[derive(Debug)]
pub struct Transaction {
    /// MTA message id.
    pub message_id: String,
    /// Accepted recipients, in acceptance order.
    pub recipients: Vec<String>,
    /// Archive owned by this transaction.
    pub archive: Archive,
}

impl Transaction {
    /// Creates a transaction around an already opened archive.
    #[must_use]
    pub fn new(message_id: impl Into<String>, archive: Archive) -> Self {
        Self {
            message_id: message_id.into(),
            recipients: Vec::new(),
            archive,
        }
    }

    /// Records an accepted recipient.
    pub fn add_recipient(&mut self, address: impl Into<String>) {
        self.recipients.push(address.into());
    }

    /// Returns the recipients joined for the `TO=` metadata line, or `None`
    /// if there are none.
    #[must_use]
    pub fn recipient_list(&self) -> Option<String> {
        if self.recipients.is_empty() {
            None
        } else {
            Some(self.recipients.join(","))
        }
    }
}
