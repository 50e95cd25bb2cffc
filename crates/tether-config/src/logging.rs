use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;

/// Supported logging output formats.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LogFormat {
    /// Structured JSON suitable for ingestion by logging stacks.
    Json,
    /// Human-readable single line output.
    #[default]
    Compact,
}

/// Error returned when a log format name is not recognised.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown log format \"{input}\"; expected \"json\" or \"compact\"")]
pub struct LogFormatParseError {
    input: String,
}

impl FromStr for LogFormat {
    type Err = LogFormatParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input.eq_ignore_ascii_case("json") {
            Ok(Self::Json)
        } else if input.eq_ignore_ascii_case("compact") {
            Ok(Self::Compact)
        } else {
            Err(LogFormatParseError {
                input: input.to_owned(),
            })
        }
    }
}
