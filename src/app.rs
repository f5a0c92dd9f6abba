//! Application builder.
//!
//! Collects routes and middleware settings, then composes the pipeline:
//!
//! ```text
//! Cors → Csrf → RateLimit → Dispatcher
//! ```
//!
//! Each layer is present only when enabled in its config section.

use std::sync::Arc;

use crate::config::{CorsConfig, CsrfConfig, RateLimitConfig, ServerConfig};
use crate::http::{Dispatcher, Handler, HandlerError, HandlerRouter, Reply, Request, SyncHandler};
use crate::routing::PathParams;
use crate::security::{Cors, Csrf, RateLimit};
use crate::transport::App;

/// Routes plus middleware configuration.
pub struct Application {
    router: HandlerRouter,
    cors: CorsConfig,
    csrf: CsrfConfig,
    rate_limit: RateLimitConfig,
}

impl Application {
    /// An application with every middleware disabled.
    pub fn new() -> Self {
        Self::with_config(&ServerConfig::default())
    }

    /// An application taking middleware settings from `config`.
    pub fn with_config(config: &ServerConfig) -> Self {
        Self {
            router: HandlerRouter::new(),
            cors: config.cors.clone(),
            csrf: config.csrf.clone(),
            rate_limit: config.rate_limit.clone(),
        }
    }

    pub fn cors(mut self, config: CorsConfig) -> Self {
        self.cors = config;
        self
    }

    pub fn csrf(mut self, config: CsrfConfig) -> Self {
        self.csrf = config;
        self
    }

    pub fn rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_limit = config;
        self
    }

    /// Register `handler` for `path` under the given methods.
    pub fn route(mut self, path: &str, methods: &[&str], handler: impl Handler) -> Self {
        let handler: Arc<dyn Handler> = Arc::new(handler);
        self.router.add_route(path, handler, methods.iter().copied());
        self
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.route(path, &["GET"], handler)
    }

    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.route(path, &["POST"], handler)
    }

    /// Register a handler that completes without awaiting.
    pub fn sync_route<F, R>(self, path: &str, methods: &[&str], handler: F) -> Self
    where
        F: Fn(Request, PathParams) -> Result<R, HandlerError> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        self.route(path, methods, SyncHandler(handler))
    }

    pub fn router(&self) -> &HandlerRouter {
        &self.router
    }

    /// Compose the middleware stack around the dispatcher.
    pub fn into_app(self) -> Arc<dyn App> {
        let mut app: Arc<dyn App> = Arc::new(Dispatcher::new(self.router));

        if self.rate_limit.enabled {
            app = Arc::new(RateLimit::new(app, &self.rate_limit));
        }
        if self.csrf.enabled {
            app = Arc::new(Csrf::new(app, &self.csrf));
        }
        if self.cors.enabled {
            app = Arc::new(Cors::new(app, &self.cors));
        }

        tracing::info!(
            cors = self.cors.enabled,
            csrf = self.csrf.enabled,
            rate_limit = self.rate_limit.enabled,
            "Application pipeline assembled"
        );
        app
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}
