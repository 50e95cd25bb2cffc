//! Stub daemon shared by the CLI integration tests.

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixListener;
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use tempfile::TempDir;

/// One-shot daemon on a Unix socket in a private directory.
///
/// Accepts a single connection, records the request line, and streams the
/// configured response lines back, each newline-terminated.
pub struct StubDaemon {
    // Keeps the socket directory alive for the duration of the exchange.
    _dir: TempDir,
    socket_path: Utf8PathBuf,
    handle: Option<JoinHandle<Result<String>>>,
}

impl StubDaemon {
    pub fn spawn(response_lines: Vec<String>) -> Result<Self> {
        let dir = TempDir::new().context("create socket directory")?;
        let socket_path = Utf8PathBuf::from_path_buf(dir.path().join("tetherd.sock"))
            .map_err(|path| anyhow::anyhow!("socket path not utf8: {}", path.display()))?;
        let listener = UnixListener::bind(&socket_path).context("bind stub daemon")?;
        let handle = thread::spawn(move || -> Result<String> {
            let (mut stream, _) = listener.accept().context("accept connection")?;
            let mut request = String::new();
            {
                let clone = stream.try_clone().context("clone stream")?;
                let mut reader = BufReader::new(clone);
                reader.read_line(&mut request).context("read request")?;
            }
            for line in &response_lines {
                stream.write_all(line.as_bytes()).context("write line")?;
                stream.write_all(b"\n").context("write terminator")?;
            }
            stream.flush().context("flush response")?;
            Ok(request)
        });
        Ok(Self {
            _dir: dir,
            socket_path,
            handle: Some(handle),
        })
    }

    pub fn socket_path(&self) -> &Utf8PathBuf {
        &self.socket_path
    }

    /// Joins the daemon thread and returns the request line it observed.
    pub fn take_request(&mut self) -> Result<String> {
        let handle = self.handle.take().context("stub daemon already joined")?;
        handle
            .join()
            .map_err(|_| anyhow::anyhow!("stub daemon thread panicked"))?
    }
}
