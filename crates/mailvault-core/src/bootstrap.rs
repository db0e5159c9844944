//! Startup handshake.

use mailvault_filter::handshake::{CONFIG_READY, registration};
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

use crate::error::Result;

/// Outcome of the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handshake {
    /// Events are registered; the event loop can start.
    Ready,
    /// Input ended before the configuration was complete.
    Closed,
}

/// Reads one line into `buf` without its line terminator.
///
/// The bytes are not checked for UTF-8. Returns `false` at end of input.
///
/// # Errors
///
/// Returns an error if reading fails.
pub async fn read_line<R>(input: &mut R, buf: &mut Vec<u8>) -> io::Result<bool>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    if input.read_until(b'\n', buf).await? == 0 {
        return Ok(false);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    Ok(true)
}

/// Skips the MTA configuration lines, then registers for every event the
/// filter handles.
///
/// # Errors
///
/// Returns an error if reading the input or writing the registration fails.
pub async fn handshake<R, W>(input: &mut R, out: &mut W) -> Result<Handshake>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = Vec::new();
    loop {
        if !read_line(input, &mut line).await? {
            return Ok(Handshake::Closed);
        }
        if line == CONFIG_READY.as_bytes() {
            break;
        }
        trace!(line = %String::from_utf8_lossy(&line), "Skipping configuration line");
    }

    for line in registration() {
        debug!(%line, "Registering");
        out.write_all(line.as_bytes()).await?;
        out.write_all(b"\n").await?;
    }
    out.flush().await?;

    Ok(Handshake::Ready)
}
