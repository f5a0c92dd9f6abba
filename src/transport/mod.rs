//! Transport contract subsystem.
//!
//! # Data Flow
//! ```text
//! Server bridge / test harness
//!     → Scope (what is being served: http, lifespan, other)
//!     → EventSource (inbound body chunks, lifespan signals)
//!     → App::call (middleware stack → dispatcher)
//!     → EventSink (outbound start + body events)
//! ```
//!
//! # Design Decisions
//! - Every layer (dispatcher, middleware, server bridge) speaks this one trait
//! - Source and sink are owned trait objects so decorators can wrap them
//! - The response phase machine rejects out-of-order or repeated emission

pub mod channel;
pub mod error;
pub mod event;
pub mod protocol;
pub mod scope;

use async_trait::async_trait;

pub use channel::{channel_sink, channel_source, BufferedSource, ChannelSink, ChannelSource};
pub use error::TransportError;
pub use event::{InboundEvent, OutboundEvent};
pub use protocol::ResponsePhase;
pub use scope::{HttpScope, RawHeaders, Scope};

/// Producer of inbound events for one invocation.
#[async_trait]
pub trait EventSource: Send {
    /// Wait for the next inbound event.
    async fn receive(&mut self) -> Result<InboundEvent, TransportError>;
}

/// Consumer of outbound events for one invocation.
#[async_trait]
pub trait EventSink: Send {
    /// Deliver an outbound event.
    async fn send(&mut self, event: OutboundEvent) -> Result<(), TransportError>;
}

pub type BoxSource = Box<dyn EventSource>;
pub type BoxSink = Box<dyn EventSink>;

/// An application callable: the dispatcher and every middleware implement this.
#[async_trait]
pub trait App: Send + Sync {
    async fn call(&self, scope: Scope, source: BoxSource, sink: BoxSink) -> Result<(), TransportError>;
}
