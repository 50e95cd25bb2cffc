//! Wire-level primitives for talking to the tether configuration daemon.
//!
//! The crate provides three pieces: an incrementally filled [`LineBuffer`]
//! that extracts escape-aware lines from a readable source, a request
//! encoder that joins command tokens into one framed line, and a blocking
//! [`DaemonClient`] that exchanges a request for a sentinel-terminated
//! multi-line response over the daemon's Unix socket. The buffer is shared
//! with the script action runner, which reads interpreter output through
//! the same primitive.
//!
//! The daemon treats the request line as opaque text; this crate only
//! guarantees framing and delivery.

pub mod buf;
#[cfg(unix)]
pub mod client;
pub mod encode;

pub use buf::{BufError, LineBuffer};
#[cfg(unix)]
pub use client::{ClientError, DaemonClient};
pub use encode::{decode_tokens, encode_request};
