//! Two-phase response emission state machine.
//!
//! ```text
//! AwaitingStart --start--> AwaitingBody --body--> Complete
//! ```
//! Anything else is a protocol violation.

use crate::transport::error::TransportError;
use crate::transport::event::OutboundEvent;

/// Where a single HTTP response is in its emission sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponsePhase {
    #[default]
    AwaitingStart,
    AwaitingBody,
    Complete,
}

impl ResponsePhase {
    /// Advance on an outbound event, rejecting illegal transitions.
    ///
    /// Lifespan events are not part of a response and leave the phase untouched.
    pub fn advance(&mut self, event: &OutboundEvent) -> Result<(), TransportError> {
        let next = match (*self, event) {
            (ResponsePhase::AwaitingStart, OutboundEvent::ResponseStart { .. }) => {
                ResponsePhase::AwaitingBody
            }
            (ResponsePhase::AwaitingBody, OutboundEvent::ResponseBody { .. }) => {
                ResponsePhase::Complete
            }
            (
                _,
                OutboundEvent::LifespanStartupComplete | OutboundEvent::LifespanShutdownComplete,
            ) => return Ok(()),
            (phase, event) => {
                return Err(TransportError::Protocol(format!(
                    "unexpected {} while {:?}",
                    event.kind(),
                    phase
                )));
            }
        };
        *self = next;
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        *self == ResponsePhase::Complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn start() -> OutboundEvent {
        OutboundEvent::ResponseStart { status: 200, headers: Vec::new() }
    }

    fn body() -> OutboundEvent {
        OutboundEvent::ResponseBody { body: Bytes::from_static(b"ok") }
    }

    #[test]
    fn test_start_then_body() {
        let mut phase = ResponsePhase::default();
        phase.advance(&start()).unwrap();
        phase.advance(&body()).unwrap();
        assert!(phase.is_complete());
    }

    #[test]
    fn test_body_before_start_rejected() {
        let mut phase = ResponsePhase::default();
        assert!(matches!(phase.advance(&body()), Err(TransportError::Protocol(_))));
        assert_eq!(phase, ResponsePhase::AwaitingStart);
    }

    #[test]
    fn test_double_emission_rejected() {
        let mut phase = ResponsePhase::default();
        phase.advance(&start()).unwrap();
        assert!(phase.advance(&start()).is_err());
        phase.advance(&body()).unwrap();
        assert!(phase.advance(&body()).is_err());
    }
}
