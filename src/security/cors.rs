//! CORS header injection.
//!
//! # Responsibilities
//! - Answer `OPTIONS` preflights directly with the CORS headers
//! - Merge CORS headers into every other response's start event
//!
//! # Design Decisions
//! - Headers computed once per request from the `Origin` header
//! - Merging replaces same-named headers and keeps all others
//! - A disallowed origin simply gets no `access-control-allow-origin`

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::config::CorsConfig;
use crate::http::response::{set_header, Response};
use crate::transport::{App, BoxSink, BoxSource, EventSink, OutboundEvent, RawHeaders, Scope, TransportError};

const WILDCARD: &str = "*";
const ALL_METHODS: &str = "GET, POST, PUT, PATCH, DELETE, OPTIONS";

/// CORS middleware.
pub struct Cors {
    inner: Arc<dyn App>,
    allow_origins: BTreeSet<String>,
    allow_methods: BTreeSet<String>,
    allow_headers: BTreeSet<String>,
}

fn or_wildcard(values: impl Iterator<Item = String>) -> BTreeSet<String> {
    let set: BTreeSet<String> = values.collect();
    if set.is_empty() {
        BTreeSet::from([WILDCARD.to_string()])
    } else {
        set
    }
}

impl Cors {
    pub fn new(inner: Arc<dyn App>, config: &CorsConfig) -> Self {
        Self {
            inner,
            allow_origins: or_wildcard(config.allow_origins.iter().cloned()),
            allow_methods: or_wildcard(config.allow_methods.iter().map(|m| m.to_uppercase())),
            allow_headers: or_wildcard(config.allow_headers.iter().map(|h| h.to_lowercase())),
        }
    }

    /// The CORS headers for a request carrying `origin` (empty if absent).
    pub fn headers_for(&self, origin: &str) -> RawHeaders {
        let mut headers = RawHeaders::new();

        if self.allow_origins.contains(WILDCARD) || self.allow_origins.contains(origin) {
            let value = if origin.is_empty() { WILDCARD } else { origin };
            headers.push(header("access-control-allow-origin", value));
        }

        let methods = if self.allow_methods.contains(WILDCARD) {
            ALL_METHODS.to_string()
        } else {
            join(&self.allow_methods)
        };
        headers.push(header("access-control-allow-methods", &methods));

        let allowed_headers = if self.allow_headers.contains(WILDCARD) {
            WILDCARD.to_string()
        } else {
            join(&self.allow_headers)
        };
        headers.push(header("access-control-allow-headers", &allowed_headers));

        headers
    }
}

fn header(name: &'static str, value: &str) -> (Bytes, Bytes) {
    (Bytes::from_static(name.as_bytes()), Bytes::copy_from_slice(value.as_bytes()))
}

fn join(values: &BTreeSet<String>) -> String {
    values.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

#[async_trait]
impl App for Cors {
    async fn call(&self, scope: Scope, source: BoxSource, mut sink: BoxSink) -> Result<(), TransportError> {
        let computed = match &scope {
            Scope::Http(http) => Some((
                http.method == "OPTIONS",
                self.headers_for(http.header_str("origin").unwrap_or("")),
            )),
            _ => None,
        };
        let Some((is_preflight, cors_headers)) = computed else {
            return self.inner.call(scope, source, sink).await;
        };

        if is_preflight {
            tracing::debug!("Answering CORS preflight");
            return Response::from_parts(200, cors_headers, Bytes::new())
                .emit(sink.as_mut())
                .await;
        }

        let sink = CorsSink {
            inner: sink,
            headers: cors_headers,
        };
        self.inner.call(scope, source, Box::new(sink)).await
    }
}

/// Sink merging CORS headers into the start event.
struct CorsSink {
    inner: BoxSink,
    headers: RawHeaders,
}

#[async_trait]
impl EventSink for CorsSink {
    async fn send(&mut self, event: OutboundEvent) -> Result<(), TransportError> {
        let event = match event {
            OutboundEvent::ResponseStart { status, mut headers } => {
                for (name, value) in &self.headers {
                    set_header(&mut headers, name.clone(), value.clone());
                }
                OutboundEvent::ResponseStart { status, headers }
            }
            other => other,
        };
        self.inner.send(event).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    #[async_trait]
    impl App for Noop {
        async fn call(&self, _: Scope, _: BoxSource, _: BoxSink) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn cors(origins: &[&str], methods: &[&str], headers: &[&str]) -> Cors {
        let config = CorsConfig {
            enabled: true,
            allow_origins: origins.iter().map(|s| s.to_string()).collect(),
            allow_methods: methods.iter().map(|s| s.to_string()).collect(),
            allow_headers: headers.iter().map(|s| s.to_string()).collect(),
        };
        Cors::new(Arc::new(Noop), &config)
    }

    fn get<'a>(headers: &'a RawHeaders, name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(k, _)| k.as_ref() == name.as_bytes())
            .and_then(|(_, v)| std::str::from_utf8(v).ok())
    }

    #[test]
    fn test_wildcard_echoes_origin() {
        let headers = cors(&["*"], &["*"], &["*"]).headers_for("https://a.example");
        assert_eq!(get(&headers, "access-control-allow-origin"), Some("https://a.example"));
        assert_eq!(get(&headers, "access-control-allow-methods"), Some(ALL_METHODS));
        assert_eq!(get(&headers, "access-control-allow-headers"), Some("*"));
    }

    #[test]
    fn test_wildcard_without_origin() {
        let headers = cors(&["*"], &["*"], &["*"]).headers_for("");
        assert_eq!(get(&headers, "access-control-allow-origin"), Some("*"));
    }

    #[test]
    fn test_explicit_lists_sorted() {
        let c = cors(&["https://a.example"], &["post", "GET"], &["X-Token", "content-type"]);
        let headers = c.headers_for("https://a.example");
        assert_eq!(get(&headers, "access-control-allow-methods"), Some("GET, POST"));
        assert_eq!(get(&headers, "access-control-allow-headers"), Some("content-type, x-token"));

        let denied = c.headers_for("https://evil.example");
        assert_eq!(get(&denied, "access-control-allow-origin"), None);
        assert!(get(&denied, "access-control-allow-methods").is_some());
    }

    #[test]
    fn test_empty_lists_mean_wildcard() {
        let headers = cors(&[], &[], &[]).headers_for("https://b.example");
        assert_eq!(get(&headers, "access-control-allow-origin"), Some("https://b.example"));
    }
}
