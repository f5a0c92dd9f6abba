//! Handler faults and their translation into responses.
//!
//! Every failure the dispatcher can observe is a `Fault`; `Fault::into_response`
//! is the single place status codes for failures are chosen.

use thiserror::Error;

use crate::http::response::Response;
use crate::transport::TransportError;

/// Errors a handler may return.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Application-level failure with a message for the logs.
    #[error("{0}")]
    Failed(String),

    /// The request body could not be read.
    #[error("failed to read request body: {0}")]
    Body(#[from] TransportError),

    /// JSON (de)serialization failed.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The handler panicked.
    #[error("handler panicked: {0}")]
    Panic(String),
}

impl HandlerError {
    pub fn msg(message: impl Into<String>) -> Self {
        HandlerError::Failed(message.into())
    }
}

/// Why the dispatcher could not produce the handler's response.
#[derive(Debug, Error)]
pub enum Fault {
    #[error("no route matched")]
    NotFound,

    #[error(transparent)]
    Handler(#[from] HandlerError),
}

impl Fault {
    pub fn status(&self) -> u16 {
        match self {
            Fault::NotFound => 404,
            Fault::Handler(_) => 500,
        }
    }

    /// Plain-text response for this fault. Causes are logged, never exposed.
    pub fn into_response(self) -> Response {
        let text = match self {
            Fault::NotFound => "Not Found",
            Fault::Handler(_) => "Internal Server Error",
        };
        Response::text(text).with_status(self.status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_statuses() {
        let not_found = Fault::NotFound.into_response();
        assert_eq!(not_found.status(), 404);
        assert_eq!(not_found.body().as_ref(), b"Not Found");

        let failed = Fault::from(HandlerError::msg("db down")).into_response();
        assert_eq!(failed.status(), 500);
        assert_eq!(failed.body().as_ref(), b"Internal Server Error");
    }
}
