//! Channel-backed and buffered implementations of the event traits.
//!
//! Used by the server bridge, the lifespan driver and tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use crate::transport::{
    error::TransportError,
    event::{InboundEvent, OutboundEvent},
    protocol::ResponsePhase,
    EventSink, EventSource,
};

/// Sink that forwards events into an unbounded channel.
///
/// Enforces the start → body ordering of a single response.
#[derive(Debug)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<OutboundEvent>,
    phase: ResponsePhase,
}

/// Create a sink and the receiver its events arrive on.
pub fn channel_sink() -> (ChannelSink, mpsc::UnboundedReceiver<OutboundEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        ChannelSink {
            tx,
            phase: ResponsePhase::default(),
        },
        rx,
    )
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn send(&mut self, event: OutboundEvent) -> Result<(), TransportError> {
        if let Err(e) = self.phase.advance(&event) {
            tracing::error!(error = %e, "Outbound protocol violation");
            return Err(e);
        }
        self.tx.send(event).map_err(|_| TransportError::Closed)
    }
}

/// Source reading inbound events from an unbounded channel.
#[derive(Debug)]
pub struct ChannelSource {
    rx: mpsc::UnboundedReceiver<InboundEvent>,
}

/// Create a source and the sender that feeds it.
pub fn channel_source() -> (mpsc::UnboundedSender<InboundEvent>, ChannelSource) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, ChannelSource { rx })
}

#[async_trait]
impl EventSource for ChannelSource {
    async fn receive(&mut self) -> Result<InboundEvent, TransportError> {
        self.rx.recv().await.ok_or(TransportError::Closed)
    }
}

/// Source replaying a fixed body, then reporting a disconnect.
#[derive(Debug, Default)]
pub struct BufferedSource {
    events: VecDeque<InboundEvent>,
}

impl BufferedSource {
    /// A source delivering `body` as a single terminal chunk.
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self::from_chunks(vec![body.into()])
    }

    /// A source with an empty body.
    pub fn empty() -> Self {
        Self::new(Bytes::new())
    }

    /// A source delivering each chunk in turn; the last one is terminal.
    pub fn from_chunks(chunks: Vec<Bytes>) -> Self {
        let last = chunks.len().saturating_sub(1);
        let events = chunks
            .into_iter()
            .enumerate()
            .map(|(i, body)| InboundEvent::HttpRequest {
                body,
                more_body: i < last,
            })
            .collect();
        Self { events }
    }
}

#[async_trait]
impl EventSource for BufferedSource {
    async fn receive(&mut self) -> Result<InboundEvent, TransportError> {
        Ok(self.events.pop_front().unwrap_or(InboundEvent::HttpDisconnect))
    }
}
