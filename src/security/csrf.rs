//! CSRF token validation (double-submit cookie).
//!
//! # Responsibilities
//! - Read the token cookie, or mint a fresh token for this request
//! - Validate the submitted header token on unsafe methods
//! - Set the token cookie on outgoing responses that lack one
//!
//! # Design Decisions
//! - Tokens compared by salted SHA-256 (`token ‖ secret`)
//! - Safe methods (GET, HEAD, OPTIONS, TRACE) are never rejected
//! - Without a configured secret, one is generated per process and a warning
//!   is logged: tokens then do not survive restarts

use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use bytes::Bytes;
use sha2::{Digest, Sha256};

use crate::config::CsrfConfig;
use crate::http::request::parse_cookies;
use crate::http::response::Response;
use crate::observability::metrics;
use crate::transport::{App, BoxSink, BoxSource, EventSink, OutboundEvent, Scope, TransportError};

/// Environment variable consulted when no secret is configured.
pub const SECRET_KEY_ENV: &str = "ZEPHYR_SECRET_KEY";

const SAFE_METHODS: [&str; 4] = ["GET", "HEAD", "OPTIONS", "TRACE"];

/// A new random URL-safe token carrying 32 bytes of entropy.
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hex SHA-256 of `token` concatenated with `secret`.
pub fn hash_token(token: &str, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

fn resolve_secret(config: &CsrfConfig) -> String {
    if let Some(secret) = config.secret_key.as_deref().filter(|s| !s.is_empty()) {
        return secret.to_string();
    }
    match std::env::var(SECRET_KEY_ENV) {
        Ok(secret) if !secret.is_empty() => secret,
        _ => {
            tracing::warn!(
                env = SECRET_KEY_ENV,
                "No CSRF secret configured; generated a random one. Tokens will not survive a restart"
            );
            generate_token()
        }
    }
}

/// CSRF middleware.
pub struct Csrf {
    inner: Arc<dyn App>,
    secret: String,
    cookie_name: String,
    header_name: String,
}

impl Csrf {
    pub fn new(inner: Arc<dyn App>, config: &CsrfConfig) -> Self {
        Self {
            inner,
            secret: resolve_secret(config),
            cookie_name: config.cookie_name.clone(),
            header_name: config.header_name.to_ascii_lowercase(),
        }
    }

    /// Whether `submitted` proves knowledge of the cookie `token`.
    pub fn verify(&self, token: &str, submitted: Option<&str>) -> bool {
        match submitted {
            Some(submitted) if !submitted.is_empty() => {
                hash_token(submitted, &self.secret) == hash_token(token, &self.secret)
            }
            _ => false,
        }
    }
}

#[async_trait]
impl App for Csrf {
    async fn call(&self, scope: Scope, source: BoxSource, mut sink: BoxSink) -> Result<(), TransportError> {
        let checked = match &scope {
            Scope::Http(http) => {
                let cookie_token = http
                    .header_str("cookie")
                    .and_then(|raw| parse_cookies(raw).find(|(k, _)| *k == self.cookie_name))
                    .map(|(_, v)| v.to_string())
                    .filter(|t| !t.is_empty());
                let token = cookie_token.unwrap_or_else(generate_token);

                let safe = SAFE_METHODS.contains(&http.method.as_str());
                let valid = safe || self.verify(&token, http.header_str(&self.header_name));
                Some((token, valid, http.method.clone()))
            }
            _ => None,
        };
        let Some((token, valid, method)) = checked else {
            return self.inner.call(scope, source, sink).await;
        };

        if !valid {
            tracing::warn!(method = %method, "CSRF token missing or invalid");
            metrics::record_rejection("csrf");
            return Response::text("CSRF token missing or invalid")
                .with_status(403)
                .emit(sink.as_mut())
                .await;
        }

        let sink = CsrfCookieSink {
            inner: sink,
            cookie_name: self.cookie_name.clone(),
            token,
        };
        self.inner.call(scope, source, Box::new(sink)).await
    }
}

/// Sink appending the token cookie to the start event.
struct CsrfCookieSink {
    inner: BoxSink,
    cookie_name: String,
    token: String,
}

impl CsrfCookieSink {
    fn sets_cookie(&self, name: &[u8], value: &[u8]) -> bool {
        name.eq_ignore_ascii_case(b"set-cookie")
            && std::str::from_utf8(value)
                .ok()
                .and_then(|v| v.trim_start().split_once('='))
                .is_some_and(|(k, _)| k.trim() == self.cookie_name)
    }
}

#[async_trait]
impl EventSink for CsrfCookieSink {
    async fn send(&mut self, event: OutboundEvent) -> Result<(), TransportError> {
        let event = match event {
            OutboundEvent::ResponseStart { status, mut headers } => {
                if !headers.iter().any(|(k, v)| self.sets_cookie(k, v)) {
                    let cookie = format!(
                        "{}={}; Path=/; SameSite=Lax; HttpOnly",
                        self.cookie_name, self.token
                    );
                    headers.push((Bytes::from_static(b"set-cookie"), Bytes::from(cookie)));
                }
                OutboundEvent::ResponseStart { status, headers }
            }
            other => other,
        };
        self.inner.send(event).await
    }
}
