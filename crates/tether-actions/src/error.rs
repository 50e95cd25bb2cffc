use std::io;

use thiserror::Error;

use tether_protocol::BufError;

/// Errors raised while running a script action.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The FIFO or the writer process could not be created. The job aborts
    /// before anything executes.
    #[error("failed to prepare the script conduit: {0}")]
    Resource(#[source] io::Error),
    /// The interpreter could not be started or waited on. Writer cleanup is
    /// still attempted.
    #[error("failed to run the script interpreter: {0}")]
    Interpreter(#[source] io::Error),
    /// Reading the interpreter's output failed.
    #[error(transparent)]
    Capture(#[from] BufError),
}
