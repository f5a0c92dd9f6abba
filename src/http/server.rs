//! HTTP server bridge.
//!
//! # Responsibilities
//! - Accept connections with Axum/Hyper (HTTP/1.1 and HTTP/2)
//! - Translate each request into an `http` scope, a streaming body source
//!   and a channel sink
//! - Assemble the emitted start/body events into the wire response
//! - Drive the application's lifespan around the serving loop
//! - Graceful shutdown once the shutdown signal resolves
//!
//! # Design Decisions
//! - The application only ever sees the transport contract, never Axum types
//! - An application that emits no response yields a 500, never a dropped connection
//! - Each request gets a UUID v4 in its tracing span

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{Body, BodyDataStream, Bytes},
    extract::{ConnectInfo, Request, State},
    http::{request::Parts, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use futures_util::StreamExt;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

use crate::lifecycle::ShutdownSignal;
use crate::transport::{
    channel_sink, channel_source, App, EventSource, HttpScope, InboundEvent, OutboundEvent, Scope,
    TransportError,
};

/// State injected into the bridge handler.
#[derive(Clone)]
struct BridgeState {
    app: Arc<dyn App>,
}

/// HTTP server serving a transport-contract application.
pub struct HttpServer {
    router: Router,
    app: Arc<dyn App>,
}

impl HttpServer {
    pub fn new(app: Arc<dyn App>) -> Self {
        let router = Self::build_router(BridgeState { app: app.clone() });
        Self { router, app }
    }

    fn build_router(state: BridgeState) -> Router {
        Router::new()
            .fallback(bridge_handler)
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// The Axum router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;

        let mut lifespan = Lifespan::start(self.app.clone());
        lifespan.startup().await;

        tracing::info!(address = %addr, "HTTP server starting");

        let service = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, service)
            .with_graceful_shutdown(async move {
                shutdown.recv().await;
                tracing::info!("Draining connections");
            })
            .await?;

        lifespan.shutdown().await;
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn bridge_handler(State(state): State<BridgeState>, request: Request) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let (parts, body) = request.into_parts();
    let scope = http_scope(&parts, client);

    let span = tracing::info_span!(
        "request",
        request_id = %Uuid::new_v4(),
        method = %scope.method,
        path = %scope.path,
    );

    async move {
        let (sink, mut events) = channel_sink();
        let source = BodySource::new(body);
        if let Err(e) = state
            .app
            .call(Scope::Http(scope), Box::new(source), Box::new(sink))
            .await
        {
            tracing::error!(error = %e, "Application failed");
        }
        collect_response(&mut events)
    }
    .instrument(span)
    .await
}

fn http_scope(parts: &Parts, client: Option<SocketAddr>) -> HttpScope {
    HttpScope {
        method: parts.method.as_str().to_string(),
        path: decode_path(parts.uri.path()),
        query_string: Bytes::copy_from_slice(parts.uri.query().unwrap_or("").as_bytes()),
        headers: parts
            .headers
            .iter()
            .map(|(name, value)| {
                (
                    Bytes::copy_from_slice(name.as_str().as_bytes()),
                    Bytes::copy_from_slice(value.as_bytes()),
                )
            })
            .collect(),
        client,
        scheme: parts.uri.scheme_str().unwrap_or("http").to_string(),
        http_version: format!("{:?}", parts.version)
            .trim_start_matches("HTTP/")
            .to_string(),
    }
}

/// Percent-decode the request path; the raw form is kept when it does not
/// decode to UTF-8.
fn decode_path(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(path) => path.into_owned(),
        Err(e) => {
            tracing::debug!(path = raw, error = %e, "Path is not valid UTF-8 once decoded");
            raw.to_string()
        }
    }
}

/// Build the wire response from the events the application emitted.
fn collect_response(events: &mut mpsc::UnboundedReceiver<OutboundEvent>) -> Response {
    let mut start = None;
    let mut body = Bytes::new();

    while let Ok(event) = events.try_recv() {
        match event {
            OutboundEvent::ResponseStart { status, headers } => start = Some((status, headers)),
            OutboundEvent::ResponseBody { body: chunk } => body = chunk,
            other => tracing::debug!(event = ?other, "Ignoring non-response event"),
        }
    }

    let Some((status, headers)) = start else {
        tracing::error!("Application emitted no response");
        return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
    };

    let mut response = Response::new(Body::from(body));
    *response.status_mut() =
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    for (name, value) in headers {
        match (HeaderName::from_bytes(&name), HeaderValue::from_bytes(&value)) {
            (Ok(name), Ok(value)) => {
                response.headers_mut().append(name, value);
            }
            _ => tracing::warn!(header = ?name, "Dropping invalid response header"),
        }
    }
    response
}

/// Inbound source streaming a request body chunk by chunk.
pub struct BodySource {
    stream: BodyDataStream,
    finished: bool,
}

impl BodySource {
    pub fn new(body: Body) -> Self {
        Self {
            stream: body.into_data_stream(),
            finished: false,
        }
    }
}

#[async_trait]
impl EventSource for BodySource {
    async fn receive(&mut self) -> Result<InboundEvent, TransportError> {
        if self.finished {
            return Ok(InboundEvent::HttpDisconnect);
        }
        match self.stream.next().await {
            Some(Ok(chunk)) => Ok(InboundEvent::HttpRequest {
                body: chunk,
                more_body: true,
            }),
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Request body stream failed");
                self.finished = true;
                Ok(InboundEvent::HttpDisconnect)
            }
            None => {
                self.finished = true;
                Ok(InboundEvent::HttpRequest {
                    body: Bytes::new(),
                    more_body: false,
                })
            }
        }
    }
}

/// Drives the lifespan scope of an application in a background task.
struct Lifespan {
    tx: mpsc::UnboundedSender<InboundEvent>,
    rx: mpsc::UnboundedReceiver<OutboundEvent>,
    task: JoinHandle<Result<(), TransportError>>,
}

impl Lifespan {
    fn start(app: Arc<dyn App>) -> Self {
        let (tx, source) = channel_source();
        let (sink, rx) = channel_sink();
        let task = tokio::spawn(async move {
            app.call(Scope::Lifespan, Box::new(source), Box::new(sink)).await
        });
        Self { tx, rx, task }
    }

    async fn startup(&mut self) {
        let _ = self.tx.send(InboundEvent::LifespanStartup);
        match self.rx.recv().await {
            Some(OutboundEvent::LifespanStartupComplete) => {
                tracing::info!("Application startup complete");
            }
            other => tracing::warn!(event = ?other, "Application did not acknowledge startup"),
        }
    }

    async fn shutdown(mut self) {
        let _ = self.tx.send(InboundEvent::LifespanShutdown);
        match self.rx.recv().await {
            Some(OutboundEvent::LifespanShutdownComplete) => {
                tracing::info!("Application shutdown complete");
            }
            other => tracing::warn!(event = ?other, "Application did not acknowledge shutdown"),
        }
        match self.task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "Lifespan ended with error"),
            Err(e) => tracing::error!(error = %e, "Lifespan task failed"),
        }
    }
}
