//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// CORS middleware.
    pub cors: CorsConfig,

    /// CSRF middleware.
    pub csrf: CsrfConfig,

    /// Rate limiting middleware.
    pub rate_limit: RateLimitConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8000".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// CORS configuration. An empty list behaves like `["*"]`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Enable CORS header injection.
    pub enabled: bool,

    /// Allowed origins, or `*`.
    pub allow_origins: Vec<String>,

    /// Allowed methods, or `*`.
    pub allow_methods: Vec<String>,

    /// Allowed request headers, or `*`.
    pub allow_headers: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            allow_origins: vec!["*".to_string()],
            allow_methods: vec!["*".to_string()],
            allow_headers: vec!["*".to_string()],
        }
    }
}

/// CSRF configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CsrfConfig {
    /// Enable CSRF validation.
    pub enabled: bool,

    /// Secret mixed into token hashes. Falls back to `ZEPHYR_SECRET_KEY`,
    /// then to a per-process random secret.
    pub secret_key: Option<String>,

    /// Cookie carrying the token.
    pub cookie_name: String,

    /// Request header carrying the submitted token.
    pub header_name: String,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            secret_key: None,
            cookie_name: "csrftoken".to_string(),
            header_name: "x-csrf-token".to_string(),
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Requests allowed per client within one window.
    pub max_requests: usize,

    /// Sliding window length in seconds.
    pub window_seconds: u64,

    /// Client count above which idle clients are swept from memory.
    pub max_tracked_clients: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_requests: 100,
            window_seconds: 60,
            max_tracked_clients: 10_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            [rate_limit]
            enabled = true
            max_requests = 2
            window_seconds = 10

            [cors]
            enabled = true
            allow_origins = ["https://app.example"]
            "#,
        )
        .unwrap();

        assert!(config.rate_limit.enabled);
        assert_eq!(config.rate_limit.max_requests, 2);
        assert_eq!(config.rate_limit.max_tracked_clients, 10_000);
        assert_eq!(config.cors.allow_origins, vec!["https://app.example"]);
        assert_eq!(config.cors.allow_methods, vec!["*"]);
        assert!(!config.csrf.enabled);
        assert_eq!(config.csrf.cookie_name, "csrftoken");
        assert_eq!(config.listener.bind_address, "127.0.0.1:8000");
    }
}
