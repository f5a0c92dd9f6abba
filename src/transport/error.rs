//! Transport-level errors.

use thiserror::Error;

/// Errors raised while exchanging events with the transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The client went away before the body was fully received.
    #[error("client disconnected")]
    Disconnected,

    /// The other end of an event channel was dropped.
    #[error("event channel closed")]
    Closed,

    /// Events were emitted out of order or more than once.
    #[error("protocol violation: {0}")]
    Protocol(String),
}
