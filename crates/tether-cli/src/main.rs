//! CLI entrypoint for the tether daemon client.
//!
//! The binary delegates to [`tether_cli::run`], which parses arguments,
//! encodes the request line, and performs the blocking daemon exchange.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    tether_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
