//! Event dispatcher.
//!
//! Applies decoded events to the [`Registry`] and to the archives of open
//! transactions, and produces the reply each filtering event requires.

use mailvault_filter::dot;
use mailvault_filter::{Event, EventKind, FilterEvent, ReportEvent, Response, SessionId};
use tracing::{debug, error, info, trace, warn};

use crate::archive::{Archive, ArchiveStore, MetaField};
use crate::error::{Error, Result};
use crate::session::{Registry, Session, Transaction};

/// Metadata value recorded when a message is rolled back.
const STATE_REJECTED: &str = "REJECTED";

/// Routes events to their handlers.
#[derive(Debug)]
pub struct Dispatcher {
    registry: Registry,
    store: ArchiveStore,
}

impl Dispatcher {
    /// Creates a dispatcher with an empty registry.
    #[must_use]
    pub fn new(store: ArchiveStore) -> Self {
        Self {
            registry: Registry::new(),
            store,
        }
    }

    /// Returns the session registry.
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Applies one event.
    ///
    /// Returns the reply for filtering events and `None` for reporting
    /// events.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownSession`] for an event on a session that was
    /// never connected, and [`Error::Archive`] if an archive could not be
    /// opened or closed. In the archive case the state change has already
    /// been applied.
    pub fn dispatch(&mut self, event: Event) -> Result<Option<Response>> {
        trace!(session = %event.session, event = event.name(), "Dispatching");

        match event.kind {
            EventKind::Report(report) => self.report(event.session, report).map(|()| None),
            EventKind::Filter(filter) => self.filter(event.session, filter).map(Some),
        }
    }

    /// Closes every open archive and forgets all sessions.
    ///
    /// Returns the number of transactions that were still open.
    pub fn shutdown(&mut self) -> usize {
        let mut closed = 0;
        for mut session in self.registry.drain() {
            if let Some(mut tx) = session.end() {
                warn!(session = %session.id, message = %tx.message_id, "Closing transaction still open at shutdown");
                if let Err(e) = tx.archive.close() {
                    error!(session = %session.id, error = %e, "Failed to close archive");
                }
                closed += 1;
            }
        }
        closed
    }

    fn report(&mut self, id: SessionId, event: ReportEvent) -> Result<()> {
        let name = event.name();

        match event {
            ReportEvent::LinkConnect { rdns, src, .. } => {
                let mut session = Session::new(id.clone());
                session.rdns = rdns;
                session.src = src;
                if let Some(mut stale) = self.registry.insert(session) {
                    warn!(session = %id, "Session connected twice, replacing");
                    close(&mut stale)?;
                }
            }
            ReportEvent::LinkDisconnect => {
                let mut session = self
                    .registry
                    .remove(id.as_str())
                    .ok_or_else(|| unknown(&id, name))?;
                close(&mut session)?;
            }
            ReportEvent::LinkGreeting { hostname } => {
                resolve(&mut self.registry, &id, name)?.mta_name = hostname;
            }
            ReportEvent::LinkIdentify { hostname, .. } => {
                resolve(&mut self.registry, &id, name)?.helo_name = hostname;
            }
            ReportEvent::LinkAuth { username, result } => {
                let session = resolve(&mut self.registry, &id, name)?;
                if result.is_pass() {
                    session.user_name = username;
                }
            }
            ReportEvent::TxReset { .. } => {
                close(resolve(&mut self.registry, &id, name)?)?;
            }
            ReportEvent::TxBegin { message_id } => {
                let session = resolve(&mut self.registry, &id, name)?;
                return begin(&self.store, session, message_id);
            }
            ReportEvent::TxMail {
                address, result, ..
            } => {
                let session = resolve(&mut self.registry, &id, name)?;
                if let Some(tx) = transaction(session, name)
                    && result.is_ok()
                {
                    tx.archive.write_meta(MetaField::From, address);
                }
            }
            ReportEvent::TxRcpt {
                address, result, ..
            } => {
                let session = resolve(&mut self.registry, &id, name)?;
                if let Some(tx) = transaction(session, name)
                    && result.is_ok()
                {
                    tx.add_recipient(address);
                }
            }
            ReportEvent::TxEnvelope { envelope_id, .. } => {
                let session = resolve(&mut self.registry, &id, name)?;
                if let Some(tx) = transaction(session, name) {
                    tx.archive.write_meta(MetaField::EnvelopeId, envelope_id);
                }
            }
            ReportEvent::TxRollback { .. } => {
                let session = resolve(&mut self.registry, &id, name)?;
                if let Some(tx) = transaction(session, name) {
                    tx.archive.write_meta(MetaField::State, STATE_REJECTED);
                }
            }
            ReportEvent::Timeout => {
                resolve(&mut self.registry, &id, name)?;
                info!(session = %id, "Session timeout");
            }
        }

        Ok(())
    }

    fn filter(&mut self, id: SessionId, event: FilterEvent) -> Result<Response> {
        let name = event.name();
        let session = resolve(&mut self.registry, &id, name)?;

        let response = match event {
            FilterEvent::Data { token, .. } => {
                if let Some(tx) = transaction(session, name)
                    && let Some(recipients) = tx.recipient_list()
                {
                    tx.archive.write_meta(MetaField::To, recipients);
                }
                Response::proceed(id, token)
            }
            FilterEvent::DataLine { token, line } => {
                if !dot::is_end_of_data(&line)
                    && let Some(tx) = transaction(session, name)
                {
                    tx.archive.write_content(dot::unstuff(&line));
                }
                // The MTA expects the line back exactly as it sent it.
                Response::data_line(id, token, line)
            }
        };

        Ok(response)
    }
}

/// Opens the archive for a new transaction and records the provenance
/// metadata. On open failure the transaction still starts, unarchived.
fn begin(store: &ArchiveStore, session: &mut Session, message_id: String) -> Result<()> {
    if let Some(mut previous) = session.end() {
        warn!(session = %session.id, message = %previous.message_id, "Transaction began before reset");
        if let Err(e) = previous.archive.close() {
            error!(session = %session.id, error = %e, "Failed to close archive");
        }
    }

    let name = session.archive_name(&message_id);
    let (archive, failure) = match store.open(&name) {
        Ok(archive) => (archive, None),
        Err(e) => (Archive::disabled(name), Some(e)),
    };

    let mut tx = Transaction::new(message_id, archive);
    let meta = &mut tx.archive;
    meta.write_meta(MetaField::SessionId, &session.id);
    meta.write_meta(MetaField::MsgId, &tx.message_id);
    meta.write_meta(MetaField::MtaName, &session.mta_name);
    meta.write_meta(MetaField::HeloName, &session.helo_name);
    meta.write_meta(MetaField::UserName, &session.user_name);
    meta.write_meta(MetaField::Rdns, &session.rdns);
    meta.write_meta(MetaField::Src, &session.src);
    session.begin(tx);

    failure.map_or(Ok(()), |e| Err(e.into()))
}

/// Ends the session's transaction, if any, closing its archive.
fn close(session: &mut Session) -> Result<()> {
    match session.end() {
        Some(mut tx) => {
            debug!(session = %session.id, message = %tx.message_id, "Closing archive");
            tx.archive.close().map_err(Error::from)
        }
        None => Ok(()),
    }
}

fn resolve<'a>(
    registry: &'a mut Registry,
    id: &SessionId,
    event: &'static str,
) -> Result<&'a mut Session> {
    registry
        .get_mut(id.as_str())
        .ok_or_else(|| unknown(id, event))
}

fn unknown(id: &SessionId, event: &'static str) -> Error {
    Error::UnknownSession {
        session: id.clone(),
        event,
    }
}

fn transaction<'a>(session: &'a mut Session, event: &'static str) -> Option<&'a mut Transaction> {
    if session.transaction.is_none() {
        trace!(session = %session.id, event, "No open transaction");
    }
    session.transaction.as_mut()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use crate::archive::{ArchiveConfig, FixedClock};
    use chrono::{DateTime, FixedOffset, TimeZone};
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const S1: &str = "7641df9771b4ed00";

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2026, 10, 19, 12, 0, 0)
            .unwrap()
    }

    fn dispatcher(root: &Path) -> Dispatcher {
        let config = ArchiveConfig::builder(root).flat(true).build();
        Dispatcher::new(ArchiveStore::with_clock(config, FixedClock(now())))
    }

    fn report(event: &str, params: &str) -> Event {
        let line = if params.is_empty() {
            format!("report|0.6|0|smtp-in|{event}|{S1}")
        } else {
            format!("report|0.6|0|smtp-in|{event}|{S1}|{params}")
        };
        Event::parse(&line).unwrap()
    }

    fn filter(event: &str, params: &str) -> Event {
        Event::parse(&format!("filter|0.6|0|smtp-in|{event}|{S1}|{params}")).unwrap()
    }

    fn run(d: &mut Dispatcher, events: Vec<Event>) -> Vec<Response> {
        events
            .into_iter()
            .filter_map(|e| d.dispatch(e).unwrap())
            .collect()
    }

    fn archive_paths(root: &Path, message_id: &str) -> (PathBuf, PathBuf) {
        let name = format!("{S1}.{message_id}.{}", now().timestamp());
        (root.join(&name), root.join(format!("{name}.meta")))
    }

    #[test]
    fn test_connect_creates_session_with_attributes() {
        let root = TempDir::new().unwrap();
        let mut d = dispatcher(root.path());
        run(
            &mut d,
            vec![
                report("link-connect", "mx.example.org|pass|192.0.2.1:4321|198.51.100.7:25"),
                report("link-greeting", "mail.example.net"),
                report("link-identify", "EHLO|client.example.org"),
                report("link-auth", "alice|pass"),
            ],
        );

        let session = d.registry().get(S1).unwrap();
        assert_eq!(session.rdns, "mx.example.org");
        assert_eq!(session.src, "192.0.2.1:4321");
        assert_eq!(session.mta_name, "mail.example.net");
        assert_eq!(session.helo_name, "client.example.org");
        assert_eq!(session.user_name, "alice");
    }

    #[test]
    fn test_failed_auth_is_not_recorded() {
        let root = TempDir::new().unwrap();
        let mut d = dispatcher(root.path());
        run(
            &mut d,
            vec![
                report("link-connect", "a|b|c|d"),
                report("link-auth", "mallory|fail"),
            ],
        );
        assert!(d.registry().get(S1).unwrap().user_name.is_empty());
    }

    #[test]
    fn test_disconnect_removes_session() {
        let root = TempDir::new().unwrap();
        let mut d = dispatcher(root.path());
        run(
            &mut d,
            vec![report("link-connect", "a|b|c|d"), report("link-disconnect", "")],
        );
        assert!(!d.registry().contains(S1));
        assert!(d.registry().is_empty());
    }

    #[test]
    fn test_unknown_session_is_fatal() {
        let root = TempDir::new().unwrap();
        let mut d = dispatcher(root.path());

        let err = d.dispatch(report("tx-begin", "m1")).unwrap_err();
        assert!(matches!(err, Error::UnknownSession { event: "tx-begin", .. }));
        assert!(err.is_fatal());

        let err = d.dispatch(filter("data-line", "tok|x")).unwrap_err();
        assert!(err.is_fatal());

        let err = d.dispatch(report("link-disconnect", "")).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_tx_begin_writes_provenance() {
        let root = TempDir::new().unwrap();
        let mut d = dispatcher(root.path());
        run(
            &mut d,
            vec![
                report("link-connect", "mx.example.org|pass|192.0.2.1:4321|198.51.100.7:25"),
                report("link-greeting", "mail.example.net"),
                report("link-identify", "HELO|client.example.org"),
                report("tx-begin", "m1"),
                report("tx-mail", "m1|sender@example.org|ok"),
                report("tx-envelope", "m1|e1"),
                report("tx-reset", "m1"),
            ],
        );

        let (_, meta) = archive_paths(root.path(), "m1");
        let meta = fs::read_to_string(meta).unwrap();
        let lines: Vec<&str> = meta.lines().collect();
        assert_eq!(
            lines,
            vec![
                format!("DATAFILE={S1}.m1.{}", now().timestamp()),
                "TIME=2026-10-19 12:00:00 +0000".to_string(),
                format!("SESSIONID={S1}"),
                "MSGID=m1".to_string(),
                "MTANAME=mail.example.net".to_string(),
                "HELONAME=client.example.org".to_string(),
                "USERNAME=".to_string(),
                "RDNS=mx.example.org".to_string(),
                "SRC=192.0.2.1:4321".to_string(),
                "FROM=sender@example.org".to_string(),
                "ENVELOPEID=e1".to_string(),
            ]
        );
    }

    #[test]
    fn test_rejected_sender_not_recorded() {
        let root = TempDir::new().unwrap();
        let mut d = dispatcher(root.path());
        run(
            &mut d,
            vec![
                report("link-connect", "a|b|c|d"),
                report("tx-begin", "m1"),
                report("tx-mail", "m1|spam@example.org|permfail"),
                report("tx-reset", "m1"),
            ],
        );
        let (_, meta) = archive_paths(root.path(), "m1");
        assert!(!fs::read_to_string(meta).unwrap().contains("FROM="));
    }

    #[test]
    fn test_recipients_keep_acceptance_order() {
        let root = TempDir::new().unwrap();
        let mut d = dispatcher(root.path());
        let responses = run(
            &mut d,
            vec![
                report("link-connect", "a|b|c|d"),
                report("tx-begin", "m1"),
                report("tx-rcpt", "m1|a|ok"),
                report("tx-rcpt", "m1|b|permfail"),
                report("tx-rcpt", "m1|c|ok"),
                filter("data", "tok|m1"),
                report("tx-reset", "m1"),
            ],
        );

        assert_eq!(
            responses,
            vec![Response::proceed(SessionId::new(S1), "tok")]
        );
        let (_, meta) = archive_paths(root.path(), "m1");
        let meta = fs::read_to_string(meta).unwrap();
        assert_eq!(meta.lines().filter(|l| l.starts_with("TO=")).collect::<Vec<_>>(), vec!["TO=a,c"]);
    }

    #[test]
    fn test_no_recipients_no_to_line() {
        let root = TempDir::new().unwrap();
        let mut d = dispatcher(root.path());
        run(
            &mut d,
            vec![
                report("link-connect", "a|b|c|d"),
                report("tx-begin", "m1"),
                report("tx-rcpt", "m1|b|tempfail"),
                filter("data", "tok|m1"),
                report("tx-reset", "m1"),
            ],
        );
        let (_, meta) = archive_paths(root.path(), "m1");
        assert!(!fs::read_to_string(meta).unwrap().contains("TO="));
    }

    #[test]
    fn test_data_lines_unstuffed_in_archive_relayed_verbatim() {
        let root = TempDir::new().unwrap();
        let mut d = dispatcher(root.path());
        run(
            &mut d,
            vec![report("link-connect", "a|b|c|d"), report("tx-begin", "m1")],
        );

        let inputs = [".hello", "hello", "..", "a|b", "."];
        for input in inputs {
            let response = d
                .dispatch(filter("data-line", &format!("tok|{input}")))
                .unwrap()
                .unwrap();
            assert_eq!(
                response.encode(&"0.6".into()),
                format!("filter-dataline|{S1}|tok|{input}").as_bytes()
            );
        }
        d.dispatch(report("tx-reset", "m1")).unwrap();

        let (content, _) = archive_paths(root.path(), "m1");
        assert_eq!(fs::read_to_string(content).unwrap(), "hello\nhello\n.\na|b\n");
    }

    #[test]
    fn test_rollback_marks_rejected() {
        let root = TempDir::new().unwrap();
        let mut d = dispatcher(root.path());
        run(
            &mut d,
            vec![
                report("link-connect", "a|b|c|d"),
                report("tx-begin", "m1"),
                report("tx-rollback", "m1"),
                report("tx-reset", "m1"),
            ],
        );
        let (_, meta) = archive_paths(root.path(), "m1");
        assert!(fs::read_to_string(meta).unwrap().ends_with("STATE=REJECTED\n"));
    }

    #[test]
    fn test_reset_clears_transaction() {
        let root = TempDir::new().unwrap();
        let mut d = dispatcher(root.path());
        run(
            &mut d,
            vec![report("link-connect", "a|b|c|d"), report("tx-begin", "m1")],
        );
        assert!(d.registry().get(S1).unwrap().transaction.is_some());

        d.dispatch(report("tx-reset", "")).unwrap();
        assert!(d.registry().get(S1).unwrap().transaction.is_none());
    }

    #[test]
    fn test_events_without_transaction_still_reply() {
        let root = TempDir::new().unwrap();
        let mut d = dispatcher(root.path());
        let responses = run(
            &mut d,
            vec![
                report("link-connect", "a|b|c|d"),
                report("tx-rcpt", "m1|a|ok"),
                filter("data", "tok|m1"),
                filter("data-line", "tok|.x"),
                report("tx-reset", "m1"),
            ],
        );
        assert_eq!(responses.len(), 2);
        assert!(fs::read_dir(root.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_open_failure_is_recoverable() {
        let root = TempDir::new().unwrap();
        let blocker = root.path().join("file");
        fs::write(&blocker, b"").unwrap();
        let mut d = dispatcher(&blocker);

        d.dispatch(report("link-connect", "a|b|c|d")).unwrap();
        let err = d.dispatch(report("tx-begin", "m1")).unwrap_err();
        assert!(matches!(err, Error::Archive(_)));
        assert!(!err.is_fatal());

        let session = d.registry().get(S1).unwrap();
        assert!(!session.transaction.as_ref().unwrap().archive.is_open());

        let response = d.dispatch(filter("data-line", "tok|..x")).unwrap().unwrap();
        assert_eq!(response, Response::data_line(SessionId::new(S1), "tok", "..x"));
    }

    #[test]
    fn test_second_begin_closes_previous() {
        let root = TempDir::new().unwrap();
        let mut d = dispatcher(root.path());
        run(
            &mut d,
            vec![
                report("link-connect", "a|b|c|d"),
                report("tx-begin", "m1"),
                filter("data-line", "tok|first"),
                report("tx-begin", "m2"),
            ],
        );

        let (content, _) = archive_paths(root.path(), "m1");
        assert_eq!(fs::read_to_string(content).unwrap(), "first\n");
        let tx = d.registry().get(S1).unwrap().transaction.as_ref().unwrap();
        assert_eq!(tx.message_id, "m2");
    }

    #[test]
    fn test_disconnect_closes_open_transaction() {
        let root = TempDir::new().unwrap();
        let mut d = dispatcher(root.path());
        run(
            &mut d,
            vec![
                report("link-connect", "a|b|c|d"),
                report("tx-begin", "m1"),
                filter("data-line", "tok|body"),
                report("link-disconnect", ""),
            ],
        );
        let (content, _) = archive_paths(root.path(), "m1");
        assert_eq!(fs::read_to_string(content).unwrap(), "body\n");
    }

    #[test]
    fn test_shutdown_flushes_open_archives() {
        let root = TempDir::new().unwrap();
        let mut d = dispatcher(root.path());
        run(
            &mut d,
            vec![
                report("link-connect", "a|b|c|d"),
                report("tx-begin", "m1"),
                filter("data-line", "tok|pending"),
            ],
        );

        assert_eq!(d.shutdown(), 1);
        assert!(d.registry().is_empty());
        let (content, _) = archive_paths(root.path(), "m1");
        assert_eq!(fs::read_to_string(content).unwrap(), "pending\n");
    }

    #[test]
    #[cfg(unix)]
    fn test_reconnect_keeps_new_attributes_when_stale_close_fails() {
        let root = TempDir::new().unwrap();
        let mut d = dispatcher(root.path());

        // Content of the first message goes to a device that refuses writes.
        let (content, _) = archive_paths(root.path(), "m1");
        std::os::unix::fs::symlink("/dev/full", &content).unwrap();

        run(
            &mut d,
            vec![
                report("link-connect", "old.example|pass|1.1.1.1:1|d"),
                report("tx-begin", "m1"),
                filter("data-line", "tok|body"),
            ],
        );

        let err = d
            .dispatch(report("link-connect", "new.example|pass|2.2.2.2:2|d"))
            .unwrap_err();
        assert!(matches!(err, Error::Archive(_)));
        assert!(!err.is_fatal());

        let session = d.registry().get(S1).unwrap();
        assert_eq!(session.rdns, "new.example");
        assert_eq!(session.src, "2.2.2.2:2");
        assert!(session.transaction.is_none());
    }

    #[test]
    fn test_data_line_with_invalid_utf8_is_archived_and_relayed() {
        let root = TempDir::new().unwrap();
        let mut d = dispatcher(root.path());
        run(
            &mut d,
            vec![report("link-connect", "a|b|c|d"), report("tx-begin", "m1")],
        );

        let mut line = format!("filter|0.6|0|smtp-in|data-line|{S1}|tok|.").into_bytes();
        line.extend_from_slice(b"Gr\xfc\xdfe");
        let response = d.dispatch(Event::parse(&line).unwrap()).unwrap().unwrap();
        assert_eq!(
            response.encode(&"0.6".into()),
            [format!("filter-dataline|{S1}|tok|.").as_bytes(), &b"Gr\xfc\xdfe"[..]].concat()
        );
        d.dispatch(report("tx-reset", "m1")).unwrap();

        let (content, _) = archive_paths(root.path(), "m1");
        assert_eq!(fs::read(content).unwrap(), b"Gr\xfc\xdfe\n");
    }

    #[test]
    fn test_timeout_keeps_state() {
        let root = TempDir::new().unwrap();
        let mut d = dispatcher(root.path());
        run(
            &mut d,
            vec![report("link-connect", "a|b|c|d"), report("timeout", "")],
        );
        assert!(d.registry().contains(S1));
    }
}
