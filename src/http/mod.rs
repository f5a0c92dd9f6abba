//! HTTP application subsystem.
//!
//! # Data Flow
//! ```text
//! Axum connection
//!     → server.rs (scope + body source + channel sink)
//!     → [middleware stack] (security/)
//!     → dispatcher.rs (router lookup, handler call)
//!     → handler.rs (Reply normalization)
//!     → response.rs (start + body events)
//!     → server.rs (assemble wire response)
//! ```

pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod request;
pub mod response;
pub mod server;

pub use dispatcher::{Dispatcher, HandlerRouter};
pub use error::{Fault, HandlerError};
pub use handler::{Handler, HandlerFuture, Reply, SyncHandler};
pub use request::Request;
pub use response::Response;
pub use server::HttpServer;
