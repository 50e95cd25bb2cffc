//! Orchestration of one script job: writer fork, interpreter run, cleanup.

use std::io;
use std::os::fd::BorrowedFd;
use std::process::{Command, ExitStatus, Stdio};

use camino::Utf8Path;
use nix::errno::Errno;
use nix::fcntl::{OFlag, open};
use nix::sys::signal::{Signal, kill};
use nix::sys::stat::Mode;
use nix::sys::wait::waitpid;
use nix::unistd::{self, ForkResult, Pid, fork};
use tracing::{debug, warn};

use tether_protocol::LineBuffer;

use crate::conduit::Conduit;
use crate::error::ActionError;
use crate::signal::SignalGuard;

/// Tracing target for script job orchestration.
const RUNNER_TARGET: &str = "tether_actions::runner";

/// Shell used to run `<interpreter> <fifo-path>` command lines.
const HOST_SHELL: &str = "/bin/sh";

/// One script to execute: the body plus an optional per-action interpreter
/// directive. When no directive is present the runner's process-wide
/// default applies.
#[derive(Debug, Clone, Copy)]
pub struct ScriptAction<'a> {
    body: &'a str,
    interpreter: Option<&'a str>,
}

impl<'a> ScriptAction<'a> {
    /// Wraps a script body with no interpreter directive.
    #[must_use]
    pub const fn new(body: &'a str) -> Self {
        Self {
            body,
            interpreter: None,
        }
    }

    /// Attaches a per-action interpreter directive.
    #[must_use]
    pub const fn with_interpreter(mut self, interpreter: &'a str) -> Self {
        self.interpreter = Some(interpreter);
        self
    }
}

/// How the interpreter's standard output is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// Pipe stdout and retain the first output line, insulating the parent
    /// from SIGINT/SIGQUIT for the duration.
    FirstLine,
    /// Inherit the parent's streams and wait synchronously.
    Inherit,
}

/// Result of a completed script job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    /// Normalized exit code of the interpreter.
    pub status: i32,
    /// First output line when capture mode was used; `None` when the script
    /// produced no output, which is not an error.
    pub captured: Option<String>,
}

/// Executes script actions with an explicit process-wide default
/// interpreter.
///
/// The default is configuration passed in by the caller, never ambient
/// state, so concurrent runners can hold distinct defaults.
pub struct ScriptRunner {
    default_interpreter: String,
}

impl ScriptRunner {
    /// Creates a runner whose fallback interpreter is `default_interpreter`.
    #[must_use]
    pub fn new(default_interpreter: impl Into<String>) -> Self {
        Self {
            default_interpreter: default_interpreter.into(),
        }
    }

    /// Runs one script job to completion.
    ///
    /// The writer is guaranteed to start before the interpreter but not to
    /// finish first; writer reaping and FIFO removal run on every exit path
    /// once the writer has been forked. An empty body is a no-op reported
    /// as success.
    pub fn run(
        &self,
        action: &ScriptAction<'_>,
        mode: CaptureMode,
    ) -> Result<ActionOutcome, ActionError> {
        if action.body.is_empty() {
            return Ok(ActionOutcome {
                status: 0,
                captured: None,
            });
        }

        let conduit = Conduit::create()?;
        let writer = match spawn_writer(conduit.path(), action.body.as_bytes()) {
            Ok(pid) => pid,
            Err(error) => {
                conduit.cleanup();
                return Err(error);
            }
        };

        let interpreter = action
            .interpreter
            .unwrap_or_else(|| self.default_interpreter.as_str());
        let command = format!("{interpreter} {}", conduit.path());
        debug!(target: RUNNER_TARGET, %command, mode = ?mode, "running script action");

        let result = match mode {
            CaptureMode::FirstLine => run_captured(&command),
            CaptureMode::Inherit => run_inherited(&command),
        };

        // The writer should have exited already, but may not have if the
        // interpreter never opened the FIFO.
        reap_writer(writer);
        conduit.cleanup();
        result
    }
}

/// Forks the writer feeding the script body into the FIFO.
fn spawn_writer(path: &Utf8Path, body: &[u8]) -> Result<Pid, ActionError> {
    match unsafe { fork() } {
        Ok(ForkResult::Parent { child }) => {
            debug!(target: RUNNER_TARGET, pid = child.as_raw(), "writer forked");
            Ok(child)
        }
        Ok(ForkResult::Child) => {
            // Only async-signal-safe calls between fork and _exit.
            let status = feed_conduit(path, body);
            unsafe { libc::_exit(status) }
        }
        Err(errno) => Err(ActionError::Resource(errno.into())),
    }
}

/// Writer-side body delivery. Blocks in `open` until the reader appears.
fn feed_conduit(path: &Utf8Path, body: &[u8]) -> i32 {
    let Ok(fd) = open(path.as_std_path(), OFlag::O_WRONLY, Mode::empty()) else {
        return 1;
    };
    let handle = unsafe { BorrowedFd::borrow_raw(fd) };
    let mut rest = body;
    while !rest.is_empty() {
        match unistd::write(handle, rest) {
            Ok(0) => break,
            Ok(written) => rest = rest.get(written..).unwrap_or_default(),
            Err(Errno::EINTR) => continue,
            Err(_) => break,
        }
    }
    unistd::close(fd).ok();
    i32::from(!rest.is_empty())
}

fn run_captured(command: &str) -> Result<ActionOutcome, ActionError> {
    let _insulation =
        SignalGuard::insulate().map_err(|errno| ActionError::Resource(errno.into()))?;
    let mut child = Command::new(HOST_SHELL)
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .spawn()
        .map_err(ActionError::Interpreter)?;
    let Some(mut stdout) = child.stdout.take() else {
        child.kill().ok();
        child.wait().ok();
        return Err(ActionError::Interpreter(io::Error::other(
            "interpreter stdout was not captured",
        )));
    };

    let captured = match read_first_line(&mut stdout) {
        Ok(captured) => captured,
        Err(error) => {
            child.kill().ok();
            child.wait().ok();
            return Err(error);
        }
    };
    drop(stdout);
    let status = child.wait().map_err(ActionError::Interpreter)?;
    Ok(ActionOutcome {
        status: normalized_status(status),
        captured,
    })
}

fn run_inherited(command: &str) -> Result<ActionOutcome, ActionError> {
    let status = Command::new(HOST_SHELL)
        .arg("-c")
        .arg(command)
        .status()
        .map_err(ActionError::Interpreter)?;
    Ok(ActionOutcome {
        status: normalized_status(status),
        captured: None,
    })
}

/// Fills a line buffer to end-of-stream and takes the first raw line.
fn read_first_line(stdout: &mut std::process::ChildStdout) -> Result<Option<String>, ActionError> {
    let mut buffer = LineBuffer::new(&mut *stdout)?;
    while buffer.fill()? > 0 {}
    Ok(buffer
        .first_raw_line()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
}

/// Terminates and reaps the writer, best-effort.
///
/// SIGTERM unblocks a writer still waiting in `open(2)` because the
/// interpreter never read the FIFO; a writer that already exited stays a
/// zombie until the `waitpid` here collects it.
fn reap_writer(pid: Pid) {
    kill(pid, Signal::SIGTERM).ok();
    match waitpid(pid, None) {
        Ok(status) => debug!(target: RUNNER_TARGET, pid = pid.as_raw(), ?status, "writer reaped"),
        Err(errno) => warn!(
            target: RUNNER_TARGET,
            pid = pid.as_raw(),
            error = %errno,
            "failed to reap writer"
        ),
    }
}

fn normalized_status(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}
