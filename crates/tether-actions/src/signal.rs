//! Scoped insulation of the parent from job-control signals.

use nix::errno::Errno;
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};

/// Holds saved SIGINT/SIGQUIT dispositions while the interpreter runs.
///
/// Capture mode deliberately desensitises the parent so an interactive
/// interrupt aimed at the script does not also abort the invoking session.
/// Dropping the guard restores the saved dispositions on every exit path,
/// including early errors.
pub(crate) struct SignalGuard {
    saved_int: SigAction,
    saved_quit: SigAction,
}

impl SignalGuard {
    /// Sets SIGINT and SIGQUIT to ignore, remembering what they were.
    pub(crate) fn insulate() -> Result<Self, Errno> {
        let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());
        let saved_int = unsafe { sigaction(Signal::SIGINT, &ignore) }?;
        let saved_quit = match unsafe { sigaction(Signal::SIGQUIT, &ignore) } {
            Ok(saved) => saved,
            Err(errno) => {
                unsafe { sigaction(Signal::SIGINT, &saved_int) }.ok();
                return Err(errno);
            }
        };
        Ok(Self {
            saved_int,
            saved_quit,
        })
    }
}

impl Drop for SignalGuard {
    fn drop(&mut self) {
        unsafe { sigaction(Signal::SIGINT, &self.saved_int) }.ok();
        unsafe { sigaction(Signal::SIGQUIT, &self.saved_quit) }.ok();
    }
}
