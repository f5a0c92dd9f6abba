//! Request scopes handed to an application.

use std::net::SocketAddr;

use bytes::Bytes;

/// Ordered list of raw header pairs, names lower-cased.
pub type RawHeaders = Vec<(Bytes, Bytes)>;

/// What a single application invocation is serving.
#[derive(Debug, Clone)]
pub enum Scope {
    Http(HttpScope),
    Lifespan,
    /// Any scope kind this core does not handle (e.g. "websocket").
    Other(String),
}

impl Scope {
    /// Wire name of the scope type.
    pub fn kind(&self) -> &str {
        match self {
            Scope::Http(_) => "http",
            Scope::Lifespan => "lifespan",
            Scope::Other(kind) => kind,
        }
    }
}

/// Snapshot of an HTTP request line and headers.
#[derive(Debug, Clone)]
pub struct HttpScope {
    pub method: String,
    pub path: String,
    pub query_string: Bytes,
    pub headers: RawHeaders,
    pub client: Option<SocketAddr>,
    pub scheme: String,
    pub http_version: String,
}

impl HttpScope {
    /// Create a scope for `method path` with no headers.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into().to_uppercase(),
            path: path.into(),
            query_string: Bytes::new(),
            headers: Vec::new(),
            client: None,
            scheme: "http".to_string(),
            http_version: "1.1".to_string(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((
            Bytes::from(name.to_ascii_lowercase()),
            Bytes::copy_from_slice(value.as_bytes()),
        ));
        self
    }

    pub fn with_client(mut self, client: SocketAddr) -> Self {
        self.client = Some(client);
        self
    }

    pub fn with_query(mut self, query: &str) -> Self {
        self.query_string = Bytes::copy_from_slice(query.as_bytes());
        self
    }

    /// Look up a header by (case-insensitive) name.
    ///
    /// When a header repeats, the last occurrence wins.
    pub fn header(&self, name: &str) -> Option<&Bytes> {
        self.headers
            .iter()
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case(name.as_bytes()))
            .map(|(_, v)| v)
    }

    /// Header value decoded as UTF-8, if present and valid.
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.header(name).and_then(|v| std::str::from_utf8(v).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_case_insensitive_last_wins() {
        let scope = HttpScope::new("get", "/")
            .with_header("Origin", "https://a.example")
            .with_header("origin", "https://b.example");
        assert_eq!(scope.method, "GET");
        assert_eq!(scope.header_str("ORIGIN"), Some("https://b.example"));
        assert!(scope.header("cookie").is_none());
    }
}
