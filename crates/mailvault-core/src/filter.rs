//! The filter event loop.
//!
//! Strictly sequential: one line is read, dispatched and answered before
//! the next one is read.

use mailvault_filter::Event;
use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

use crate::bootstrap::{Handshake, handshake, read_line};
use crate::dispatch::Dispatcher;
use crate::error::Result;

/// A filter bound to a dispatcher.
#[derive(Debug)]
pub struct Filter {
    dispatcher: Dispatcher,
}

impl Filter {
    /// Creates a filter.
    #[must_use]
    pub const fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Returns the dispatcher.
    #[must_use]
    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Runs the handshake and then processes events until input ends.
    ///
    /// Open archives are closed before returning, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error: an undecodable line, an event for an
    /// unknown session, or an I/O failure on the protocol streams.
    pub async fn run<R, W>(&mut self, mut input: R, mut output: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        if handshake(&mut input, &mut output).await? == Handshake::Closed {
            info!("Input closed during configuration");
            return Ok(());
        }
        info!("Filter registered");

        let result = self.serve(&mut input, &mut output).await;

        let open = self.dispatcher.shutdown();
        if open > 0 {
            warn!(open, "Closed transactions left open at end of input");
        }
        result
    }

    async fn serve<R, W>(&mut self, input: &mut R, output: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut line = Vec::new();
        while read_line(input, &mut line).await? {
            self.process(&line, output).await?;
        }
        info!("Input closed");
        Ok(())
    }

    /// Handles a single event line, writing its reply if it has one.
    ///
    /// # Errors
    ///
    /// Returns fatal errors only; recoverable ones are logged.
    pub async fn process<W>(&mut self, line: &[u8], output: &mut W) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let event = Event::parse(line)?;
        let version = event.version.clone();

        match self.dispatcher.dispatch(event) {
            Ok(Some(response)) => {
                let mut reply = response.encode(&version);
                reply.push(b'\n');
                output.write_all(&reply).await?;
                output.flush().await?;
            }
            Ok(None) => {}
            Err(e) if !e.is_fatal() => warn!(error = %e, "Message will not be archived"),
            Err(e) => return Err(e),
        }

        Ok(())
    }
}
