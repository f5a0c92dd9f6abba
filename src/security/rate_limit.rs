//! Per-client sliding-window rate limiting.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use crate::config::RateLimitConfig;
use crate::http::response::Response;
use crate::observability::metrics;
use crate::transport::{App, BoxSink, BoxSource, Scope, TransportError};

/// Key used when the transport reports no client address.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Sliding-window counters keyed by client.
///
/// Each key's window is locked independently (sharded map), so unrelated
/// clients do not serialize on each other. Past `max_tracked_clients` idle
/// keys are swept, at most once per window length.
pub struct SlidingWindow {
    windows: DashMap<String, VecDeque<Instant>>,
    max_requests: usize,
    window: Duration,
    max_tracked_clients: usize,
    last_sweep: Mutex<Option<Instant>>,
    sweeps: AtomicU64,
}

impl SlidingWindow {
    pub fn new(max_requests: usize, window: Duration, max_tracked_clients: usize) -> Self {
        Self {
            windows: DashMap::new(),
            max_requests,
            window,
            max_tracked_clients,
            last_sweep: Mutex::new(None),
            sweeps: AtomicU64::new(0),
        }
    }

    /// Record a request at `now` if the client is under its limit.
    ///
    /// Returns false (and records nothing) when the limit is reached.
    pub fn try_acquire(&self, key: &str, now: Instant) -> bool {
        let allowed = {
            let mut window = self.windows.entry(key.to_string()).or_default();
            evict_expired(&mut window, now, self.window);
            if window.len() >= self.max_requests {
                false
            } else {
                window.push_back(now);
                true
            }
        };

        if self.windows.len() > self.max_tracked_clients {
            self.maybe_sweep(now);
        }
        allowed
    }

    fn maybe_sweep(&self, now: Instant) {
        // A sweep already in progress on another task covers this one.
        let Ok(mut last) = self.last_sweep.try_lock() else {
            return;
        };
        if let Some(prev) = *last {
            if now.saturating_duration_since(prev) < self.window {
                return;
            }
        }
        *last = Some(now);
        drop(last);
        self.sweep(now);
    }

    /// Drop clients with no request inside the window.
    pub fn sweep(&self, now: Instant) {
        let before = self.windows.len();
        self.windows.retain(|_, window| {
            evict_expired(window, now, self.window);
            !window.is_empty()
        });
        self.sweeps.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(before, after = self.windows.len(), "Swept idle rate-limit windows");
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    /// Number of sweeps run so far.
    pub fn sweep_count(&self) -> u64 {
        self.sweeps.load(Ordering::Relaxed)
    }
}

fn evict_expired(window: &mut VecDeque<Instant>, now: Instant, length: Duration) {
    while let Some(&oldest) = window.front() {
        if now.duration_since(oldest) > length {
            window.pop_front();
        } else {
            break;
        }
    }
}

/// Rate limiting middleware.
pub struct RateLimit {
    inner: Arc<dyn App>,
    limiter: SlidingWindow,
    window_seconds: u64,
}

impl RateLimit {
    pub fn new(inner: Arc<dyn App>, config: &RateLimitConfig) -> Self {
        Self {
            inner,
            limiter: SlidingWindow::new(
                config.max_requests,
                Duration::from_secs(config.window_seconds),
                config.max_tracked_clients,
            ),
            window_seconds: config.window_seconds,
        }
    }

    pub fn limiter(&self) -> &SlidingWindow {
        &self.limiter
    }
}

#[async_trait]
impl App for RateLimit {
    async fn call(&self, scope: Scope, source: BoxSource, mut sink: BoxSink) -> Result<(), TransportError> {
        let client = match &scope {
            Scope::Http(http) => Some(
                http.client
                    .map(|addr| addr.ip().to_string())
                    .unwrap_or_else(|| UNKNOWN_CLIENT.to_string()),
            ),
            _ => None,
        };

        if let Some(client) = client {
            if !self.limiter.try_acquire(&client, Instant::now()) {
                tracing::warn!(client = %client, "Rate limit exceeded");
                metrics::record_rejection("rate_limit");
                return Response::text("Too Many Requests")
                    .with_status(429)
                    .with_header("retry-after", &self.window_seconds.to_string())
                    .emit(sink.as_mut())
                    .await;
            }
        }

        self.inner.call(scope, source, sink).await
    }
}
