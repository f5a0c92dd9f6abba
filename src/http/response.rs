//! Response model and two-phase emission.
//!
//! # Responsibilities
//! - Hold status, ordered byte-string headers and the full body
//! - Provide plain-text, JSON, HTML and raw constructors
//! - Emit itself as exactly one start event and one body event
//!
//! # Design Decisions
//! - No streaming bodies: the payload is always known up front
//! - Setting a header replaces an existing one of the same name in place
//! - JSON keeps key order and leaves non-ASCII text unescaped

use std::io;

use bytes::Bytes;
use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};

use crate::transport::{EventSink, OutboundEvent, RawHeaders, TransportError};

pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
pub const APPLICATION_JSON: &str = "application/json; charset=utf-8";
pub const TEXT_HTML: &str = "text/html; charset=utf-8";

/// An outgoing HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: u16,
    headers: RawHeaders,
    body: Bytes,
}

impl Response {
    /// Raw response with no headers.
    pub fn new(body: impl Into<Bytes>, status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Response with an exact header list, used as-is.
    pub fn from_parts(status: u16, headers: RawHeaders, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// `200` plain-text response.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(text.into(), 200).with_header("content-type", TEXT_PLAIN)
    }

    /// `200` HTML response.
    pub fn html(html: impl Into<String>) -> Self {
        Self::new(html.into(), 200).with_header("content-type", TEXT_HTML)
    }

    /// `200` JSON response.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        let body = to_json_bytes(value)?;
        Ok(Self::new(body, 200).with_header("content-type", APPLICATION_JSON))
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Set a header, replacing any existing value of the same name.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        set_header(
            &mut self.headers,
            Bytes::from(name.to_ascii_lowercase()),
            Bytes::copy_from_slice(value.as_bytes()),
        );
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &RawHeaders {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&[u8]> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name.as_bytes()))
            .map(|(_, v)| v.as_ref())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Send the start event then the body event.
    pub async fn emit(self, sink: &mut dyn EventSink) -> Result<(), TransportError> {
        sink.send(OutboundEvent::ResponseStart {
            status: self.status,
            headers: self.headers,
        })
        .await?;
        sink.send(OutboundEvent::ResponseBody { body: self.body }).await
    }
}

/// Insert or replace a header, keeping the position of a replaced entry.
pub fn set_header(headers: &mut RawHeaders, name: Bytes, value: Bytes) {
    match headers
        .iter_mut()
        .find(|(k, _)| k.eq_ignore_ascii_case(&name))
    {
        Some(entry) => entry.1 = value,
        None => headers.push((name, value)),
    }
}

/// JSON with `", "` and `": "` separators.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}

fn to_json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::with_capacity(128);
    let mut ser = Serializer::with_formatter(&mut buf, SpacedFormatter);
    value.serialize(&mut ser)?;
    Ok(buf)
}

/// JSON text of `value` with the response separators.
pub(crate) fn to_json_text<T: Serialize + ?Sized>(value: &T) -> String {
    to_json_bytes(value)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::channel_sink;
    use serde_json::{json, Value};

    #[test]
    fn test_plain_text_response() {
        let resp = Response::text("Hello").with_status(201);
        assert_eq!(resp.status(), 201);
        assert_eq!(resp.body().as_ref(), b"Hello");
        assert_eq!(resp.header("content-type"), Some(TEXT_PLAIN.as_bytes()));
    }

    #[test]
    fn test_content_type_override() {
        let resp = Response::text("<p>x</p>").with_header("Content-Type", TEXT_HTML);
        assert_eq!(resp.headers().len(), 1);
        assert_eq!(resp.header("content-type"), Some(TEXT_HTML.as_bytes()));
    }

    #[test]
    fn test_json_response() {
        let data = json!({"message": "OK", "code": 200});
        let resp = Response::json(&data).unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.body().as_ref(), br#"{"message": "OK", "code": 200}"#);
        assert_eq!(
            resp.header("content-type"),
            Some(b"application/json; charset=utf-8".as_slice())
        );
        let parsed: Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(parsed, data);
    }

    #[test]
    fn test_json_keeps_order_and_unicode() {
        let data = json!({"zeta": 1, "alpha": [1, 2], "name": "Zéphyr ✓"});
        let resp = Response::json(&data).unwrap();
        let text = std::str::from_utf8(resp.body()).unwrap();
        assert_eq!(text, r#"{"zeta": 1, "alpha": [1, 2], "name": "Zéphyr ✓"}"#);
    }

    #[tokio::test]
    async fn test_emit_two_phase() {
        let (mut sink, mut rx) = channel_sink();
        Response::text("hi").emit(&mut sink).await.unwrap();

        match rx.recv().await.unwrap() {
            OutboundEvent::ResponseStart { status, headers } => {
                assert_eq!(status, 200);
                assert_eq!(headers[0].0.as_ref(), b"content-type");
            }
            other => panic!("expected start, got {:?}", other),
        }
        assert_eq!(
            rx.recv().await.unwrap(),
            OutboundEvent::ResponseBody { body: Bytes::from_static(b"hi") }
        );
    }

    #[tokio::test]
    async fn test_second_emission_rejected() {
        let (mut sink, _rx) = channel_sink();
        Response::text("once").emit(&mut sink).await.unwrap();
        let err = Response::text("twice").emit(&mut sink).await.unwrap_err();
        assert!(matches!(err, TransportError::Protocol(_)));
    }
}
