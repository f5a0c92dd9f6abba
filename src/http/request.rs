//! Request descriptor handed to handlers.
//!
//! # Responsibilities
//! - Snapshot method, path, query string and headers from the HTTP scope
//! - Provide case-insensitive header and cookie lookup
//! - Drain the inbound source lazily, at most once, on first body access
//!
//! # Design Decisions
//! - Headers are decoded lossily; raw bytes stay available on the scope
//! - The body is memoized: later calls return the buffered bytes
//! - A disconnect before the terminal chunk is an error, not an empty body

use std::net::SocketAddr;

use bytes::{Bytes, BytesMut};
use serde::de::DeserializeOwned;

use crate::http::error::HandlerError;
use crate::transport::{BoxSource, EventSource, HttpScope, InboundEvent, TransportError};

enum BodyState {
    Pending(BoxSource),
    Buffered(Bytes),
}

/// An incoming HTTP request.
pub struct Request {
    method: String,
    path: String,
    query_string: String,
    headers: Vec<(String, String)>,
    client: Option<SocketAddr>,
    body: BodyState,
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query_string", &self.query_string)
            .field("headers", &self.headers)
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

impl Request {
    pub fn new(scope: HttpScope, source: BoxSource) -> Self {
        let headers = scope
            .headers
            .iter()
            .map(|(k, v)| {
                (
                    String::from_utf8_lossy(k).to_ascii_lowercase(),
                    String::from_utf8_lossy(v).into_owned(),
                )
            })
            .collect();

        Self {
            method: scope.method,
            path: scope.path,
            query_string: String::from_utf8_lossy(&scope.query_string).into_owned(),
            headers,
            client: scope.client,
            body: BodyState::Pending(source),
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_string(&self) -> &str {
        &self.query_string
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn client(&self) -> Option<SocketAddr> {
        self.client
    }

    /// Header value by case-insensitive name; the last occurrence wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Raw (undecoded) value of a query parameter.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_string
            .split('&')
            .filter_map(|pair| pair.split_once('=').or(Some((pair, ""))))
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v)
    }

    /// Value of a request cookie.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.header("cookie")
            .and_then(|raw| parse_cookies(raw).find(|(k, _)| *k == name))
            .map(|(_, v)| v)
    }

    /// The full request body, read from the transport on first access.
    pub async fn body(&mut self) -> Result<Bytes, TransportError> {
        let source = match &mut self.body {
            BodyState::Buffered(body) => return Ok(body.clone()),
            BodyState::Pending(source) => source,
        };
        let body = drain(source.as_mut()).await?;
        self.body = BodyState::Buffered(body.clone());
        Ok(body)
    }

    /// The body decoded as UTF-8 (invalid sequences replaced).
    pub async fn text(&mut self) -> Result<String, HandlerError> {
        let body = self.body().await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    /// The body parsed as JSON.
    pub async fn json<T: DeserializeOwned>(&mut self) -> Result<T, HandlerError> {
        let body = self.body().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

async fn drain(source: &mut dyn EventSource) -> Result<Bytes, TransportError> {
    let mut buf = BytesMut::new();
    loop {
        match source.receive().await? {
            InboundEvent::HttpRequest { body, more_body } => {
                buf.extend_from_slice(&body);
                if !more_body {
                    return Ok(buf.freeze());
                }
            }
            InboundEvent::HttpDisconnect => return Err(TransportError::Disconnected),
            InboundEvent::LifespanStartup | InboundEvent::LifespanShutdown => continue,
        }
    }
}

/// Split a `Cookie` header into `(name, value)` pairs.
pub fn parse_cookies(raw: &str) -> impl Iterator<Item = (&str, &str)> {
    raw.split(';')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.trim(), v.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::BufferedSource;

    fn request(scope: HttpScope, source: BufferedSource) -> Request {
        Request::new(scope, Box::new(source))
    }

    #[tokio::test]
    async fn test_body_drains_all_chunks_once() {
        let source = BufferedSource::from_chunks(vec![
            Bytes::from_static(b"{\"a\":"),
            Bytes::from_static(b" 1}"),
        ]);
        let mut req = request(HttpScope::new("POST", "/"), source);

        assert_eq!(req.body().await.unwrap().as_ref(), b"{\"a\": 1}");
        // Source is exhausted now; a second drain would report a disconnect.
        assert_eq!(req.body().await.unwrap().as_ref(), b"{\"a\": 1}");

        let value: serde_json::Value = req.json().await.unwrap();
        assert_eq!(value["a"], 1);
    }

    #[tokio::test]
    async fn test_disconnect_before_terminal_chunk() {
        let mut req = request(HttpScope::new("POST", "/"), BufferedSource::from_chunks(vec![]));
        assert!(matches!(req.body().await, Err(TransportError::Disconnected)));
    }

    #[test]
    fn test_headers_query_and_cookies() {
        let scope = HttpScope::new("GET", "/search")
            .with_query("q=rust&page=2&flag")
            .with_header("X-Token", "abc")
            .with_header("Cookie", "csrftoken=t0k; theme = dark");
        let req = request(scope, BufferedSource::empty());

        assert_eq!(req.header("x-token"), Some("abc"));
        assert_eq!(req.query_param("page"), Some("2"));
        assert_eq!(req.query_param("flag"), Some(""));
        assert_eq!(req.query_param("missing"), None);
        assert_eq!(req.cookie("csrftoken"), Some("t0k"));
        assert_eq!(req.cookie("theme"), Some("dark"));
    }
}
