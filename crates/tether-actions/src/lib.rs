//! Script action execution through a named-pipe conduit. Unix only.
//!
//! A script body never appears on an interpreter's command line. Instead
//! each invocation creates a uniquely named FIFO in a private temporary
//! directory, forks a writer whose only job is feeding the body into the
//! pipe, and runs `<interpreter> <fifo-path>` through the host shell. The
//! FIFO's blocking open/read semantics provide the synchronisation: the
//! interpreter's read blocks until the writer opens the pipe, and sees the
//! body in order with no interleaving.
//!
//! In capture mode the invoker retains the first line of the interpreter's
//! standard output while insulating itself from SIGINT/SIGQUIT, so an
//! interactive interrupt terminates the script rather than the invoking
//! session. Cleanup (writer reaping, FIFO removal, signal restoration) runs
//! on every exit path.

mod conduit;
mod error;
mod runner;
mod signal;

pub use error::ActionError;
pub use runner::{ActionOutcome, CaptureMode, ScriptAction, ScriptRunner};
