//! Zephyr: a minimal asynchronous HTTP application core.

pub mod app;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;
pub mod transport;

pub use app::Application;
pub use config::ServerConfig;
pub use http::{HandlerError, HttpServer, Request, Response};
pub use lifecycle::{Shutdown, ShutdownSignal};
pub use routing::PathParams;
pub use transport::App;
