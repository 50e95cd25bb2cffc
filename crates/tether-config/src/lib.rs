//! Shared configuration for the tether client and script action runner.
//!
//! `Config` carries the daemon socket path, the process-wide default script
//! interpreter, and logging settings. Both the default interpreter and the
//! socket path are explicit values threaded into the components that need
//! them rather than ambient global state, so tests can supply distinct
//! configurations without cross-test interference.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

mod defaults;
mod logging;

pub use defaults::{DEFAULT_INTERPRETER, DEFAULT_LOG_FILTER, default_socket_path};
pub use logging::{LogFormat, LogFormatParseError};

/// Runtime configuration shared by the binaries.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    socket_path: Utf8PathBuf,
    interpreter: String,
    log_filter: String,
    log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            interpreter: DEFAULT_INTERPRETER.to_owned(),
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
            log_format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Path of the configuration daemon's listening socket.
    #[must_use]
    pub fn socket_path(&self) -> &Utf8Path {
        &self.socket_path
    }

    /// Interpreter used for script actions that carry no directive of
    /// their own.
    #[must_use]
    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }

    /// Log filter expression handed to the tracing subscriber.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Format used when rendering log events.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Replaces the daemon socket path.
    #[must_use]
    pub fn with_socket_path(mut self, socket_path: impl Into<Utf8PathBuf>) -> Self {
        self.socket_path = socket_path.into();
        self
    }

    /// Replaces the default script interpreter.
    #[must_use]
    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    /// Replaces the log filter expression.
    #[must_use]
    pub fn with_log_filter(mut self, log_filter: impl Into<String>) -> Self {
        self.log_filter = log_filter.into();
        self
    }

    /// Replaces the log format.
    #[must_use]
    pub fn with_log_format(mut self, log_format: LogFormat) -> Self {
        self.log_format = log_format;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_points_at_the_daemon_socket() {
        let config = Config::default();
        assert_eq!(config.socket_path().file_name(), Some("tetherd.sock"));
        assert_eq!(config.interpreter(), DEFAULT_INTERPRETER);
        assert_eq!(config.log_filter(), DEFAULT_LOG_FILTER);
    }

    #[test]
    fn builders_replace_individual_fields() {
        let config = Config::default()
            .with_socket_path("/run/tether/custom.sock")
            .with_interpreter("/bin/dash")
            .with_log_filter("debug")
            .with_log_format(LogFormat::Json);
        assert_eq!(config.socket_path().as_str(), "/run/tether/custom.sock");
        assert_eq!(config.interpreter(), "/bin/dash");
        assert_eq!(config.log_filter(), "debug");
        assert_eq!(config.log_format(), LogFormat::Json);
    }
}
