//! Inbound and outbound event shapes.

use bytes::Bytes;

use crate::transport::scope::RawHeaders;

/// Events flowing from the transport into the application.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// `http.request`: one body chunk; `more_body` is false on the terminal chunk.
    HttpRequest { body: Bytes, more_body: bool },
    /// `http.disconnect`
    HttpDisconnect,
    /// `lifespan.startup`
    LifespanStartup,
    /// `lifespan.shutdown`
    LifespanShutdown,
}

/// Events flowing from the application out to the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEvent {
    /// `http.response.start`
    ResponseStart { status: u16, headers: RawHeaders },
    /// `http.response.body`
    ResponseBody { body: Bytes },
    /// `lifespan.startup.complete`
    LifespanStartupComplete,
    /// `lifespan.shutdown.complete`
    LifespanShutdownComplete,
}

impl OutboundEvent {
    /// Wire name of the event type.
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundEvent::ResponseStart { .. } => "http.response.start",
            OutboundEvent::ResponseBody { .. } => "http.response.body",
            OutboundEvent::LifespanStartupComplete => "lifespan.startup.complete",
            OutboundEvent::LifespanShutdownComplete => "lifespan.shutdown.complete",
        }
    }
}
