//! Blocking client for the tether configuration daemon.
//!
//! The client walks a fixed lifecycle: connect to the daemon's Unix socket,
//! send one encoded request line, read the sentinel-terminated response,
//! close. Every step blocks the caller until completion or failure; there is
//! no timeout on reads, so callers needing a deadline must wrap the client
//! externally.

use std::io::{self, Write};
use std::os::unix::net::UnixStream;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use socket2::{Domain, SockAddr, Socket, Type};
use thiserror::Error;
use tracing::debug;

use crate::buf::{BufError, LineBuffer};

/// Tracing target for daemon exchanges.
const CLIENT_TARGET: &str = "tether_protocol::client";

/// Upper bound on establishing the connection. Reads are unbounded.
pub const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors raised during a daemon exchange.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The daemon socket was unreachable or refused the connection.
    #[error("failed to connect to daemon at {endpoint}: {source}")]
    Connect {
        /// Path of the daemon socket that could not be reached.
        endpoint: String,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// A read or write on the established connection failed.
    #[error("failed to exchange data with the daemon: {0}")]
    Io(#[source] io::Error),
    /// The response buffer could not be filled.
    #[error(transparent)]
    Buffer(#[from] BufError),
    /// The stream ended before the end-of-response line.
    #[error("daemon closed the stream before the end-of-response line")]
    Protocol {
        /// Every line accumulated before the stream closed.
        partial: Vec<String>,
    },
    /// An operation ran before `connect` or after `close`.
    #[error("the client is not connected to the daemon")]
    NotConnected,
}

/// Sequential, blocking connection to the configuration daemon.
///
/// The connection is exclusively owned by one client instance; ownership
/// passes to the client on a successful [`connect`](Self::connect) and only
/// [`close`](Self::close) (or drop) releases it. The daemon keeps the
/// connection open after a response, so reuse for another exchange is the
/// caller's choice.
pub struct DaemonClient {
    endpoint: Utf8PathBuf,
    stream: Option<UnixStream>,
}

impl DaemonClient {
    /// Creates an unconnected client aimed at the daemon socket `endpoint`.
    #[must_use]
    pub fn new(endpoint: impl Into<Utf8PathBuf>) -> Self {
        Self {
            endpoint: endpoint.into(),
            stream: None,
        }
    }

    /// Path of the daemon socket this client targets.
    #[must_use]
    pub fn endpoint(&self) -> &Utf8Path {
        &self.endpoint
    }

    /// Whether a connection is currently held.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Opens the connection to the daemon socket.
    pub fn connect(&mut self) -> Result<(), ClientError> {
        let connect_error = |source: io::Error| ClientError::Connect {
            endpoint: self.endpoint.to_string(),
            source,
        };
        let socket = Socket::new(Domain::UNIX, Type::STREAM, None).map_err(connect_error)?;
        let address = SockAddr::unix(self.endpoint.as_std_path()).map_err(connect_error)?;
        socket
            .connect_timeout(&address, CONNECTION_TIMEOUT)
            .map_err(connect_error)?;
        self.stream = Some(UnixStream::from(std::os::fd::OwnedFd::from(socket)));
        debug!(target: CLIENT_TARGET, endpoint = %self.endpoint, "connected to daemon");
        Ok(())
    }

    /// Writes the encoded request line plus its newline terminator.
    pub fn send(&mut self, line: &str) -> Result<(), ClientError> {
        let stream = self.stream.as_mut().ok_or(ClientError::NotConnected)?;
        stream.write_all(line.as_bytes()).map_err(ClientError::Io)?;
        stream.write_all(b"\n").map_err(ClientError::Io)?;
        stream.flush().map_err(ClientError::Io)?;
        debug!(target: CLIENT_TARGET, request_bytes = line.len(), "sent request");
        Ok(())
    }

    /// Reads the multi-line response up to the end-of-response sentinel.
    ///
    /// Lines are extracted until a zero-length line arrives; the sentinel is
    /// discarded and the accumulated non-empty lines returned. When the
    /// daemon closes the stream before a sentinel, unterminated trailing
    /// bytes become a final line and the call fails with
    /// [`ClientError::Protocol`] carrying the partial set.
    pub fn receive(&mut self) -> Result<Vec<String>, ClientError> {
        let stream = self.stream.as_mut().ok_or(ClientError::NotConnected)?;
        let mut buffer = LineBuffer::new(&mut *stream)?;
        let mut lines: Vec<String> = Vec::new();
        loop {
            if let Some(line) = buffer.next_line() {
                if line.is_empty() {
                    debug!(
                        target: CLIENT_TARGET,
                        lines = lines.len(),
                        "received end-of-response"
                    );
                    return Ok(lines);
                }
                lines.push(line);
                continue;
            }
            if buffer.fill()? == 0 {
                if let Some(trailing) = buffer.take_remaining()
                    && !trailing.is_empty()
                {
                    lines.push(trailing);
                }
                return Err(ClientError::Protocol { partial: lines });
            }
        }
    }

    /// Releases the connection. Idempotent.
    pub fn close(&mut self) {
        self.stream = None;
    }
}
