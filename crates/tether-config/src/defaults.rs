use camino::Utf8PathBuf;
use std::env;

#[cfg(unix)]
use dirs::runtime_dir;
#[cfg(unix)]
use libc::geteuid;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Interpreter used for script actions without a directive of their own.
pub const DEFAULT_INTERPRETER: &str = "/bin/sh";

/// Computes the default path of the daemon's listening socket.
#[must_use]
pub fn default_socket_path() -> Utf8PathBuf {
    default_socket_path_inner()
}

#[cfg(unix)]
fn default_socket_path_inner() -> Utf8PathBuf {
    let (mut base, apply_namespace) = runtime_base_directory()
        .map_or_else(|| (fallback_base_directory(), true), |dir| (dir, false));

    base.push("tether");
    if apply_namespace {
        base.push(user_namespace());
    }

    base.join("tetherd.sock")
}

#[cfg(unix)]
fn runtime_base_directory() -> Option<Utf8PathBuf> {
    runtime_dir().and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
}

#[cfg(unix)]
fn fallback_base_directory() -> Utf8PathBuf {
    let candidate = env::temp_dir();
    Utf8PathBuf::from_path_buf(candidate).unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
}

#[cfg(unix)]
fn user_namespace() -> String {
    let uid = unsafe { geteuid() };
    format!("uid-{uid}")
}

#[cfg(not(unix))]
fn default_socket_path_inner() -> Utf8PathBuf {
    let candidate = env::temp_dir().join("tether").join("tetherd.sock");
    Utf8PathBuf::from_path_buf(candidate)
        .unwrap_or_else(|_| Utf8PathBuf::from("/tmp/tether/tetherd.sock"))
}
