//! Innermost application: route, run handler, emit.
//!
//! # Responsibilities
//! - Acknowledge lifespan startup/shutdown
//! - Resolve HTTP requests through the router
//! - Run the handler, isolating errors and panics
//! - Normalize the handler result and emit it as a Response
//!
//! # Design Decisions
//! - Handler faults never reach the transport; they become a 500
//! - A miss is a 404 response, not an error
//! - Non-HTTP, non-lifespan scopes are ignored

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures_util::FutureExt;

use crate::http::error::{Fault, HandlerError};
use crate::http::handler::{Handler, Reply};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::observability::metrics;
use crate::routing::{PathParams, RouteMatch, Router};
use crate::transport::{
    App, BoxSink, BoxSource, EventSink, EventSource, HttpScope, InboundEvent, OutboundEvent,
    Scope, TransportError,
};

/// Route table with type-erased handlers.
pub type HandlerRouter = Router<Arc<dyn Handler>>;

/// The core application at the center of the middleware stack.
#[derive(Clone)]
pub struct Dispatcher {
    router: Arc<HandlerRouter>,
}

impl Dispatcher {
    pub fn new(router: HandlerRouter) -> Self {
        Self {
            router: Arc::new(router),
        }
    }

    pub fn router(&self) -> &HandlerRouter {
        &self.router
    }

    /// Produce the response for one HTTP request. Never fails.
    pub async fn handle(&self, scope: HttpScope, source: BoxSource) -> Response {
        let start_time = Instant::now();
        let method = scope.method.clone();
        let path = scope.path.clone();

        tracing::debug!(method = %method, path = %path, "Dispatching request");

        let outcome = match self.router.resolve(&path, &method) {
            Some(RouteMatch { handler, params }) => {
                let handler = Arc::clone(handler);
                run_handler(handler, Request::new(scope, source), params).await
            }
            None => Err(Fault::NotFound),
        };

        let response = match outcome {
            Ok(response) => response,
            Err(fault) => {
                match &fault {
                    Fault::NotFound => {
                        tracing::warn!(method = %method, path = %path, "No route matched");
                    }
                    Fault::Handler(e) => {
                        tracing::error!(method = %method, path = %path, error = %e, "Handler failed");
                    }
                }
                fault.into_response()
            }
        };

        metrics::record_request(&method, response.status(), start_time);
        response
    }
}

async fn run_handler(
    handler: Arc<dyn Handler>,
    request: Request,
    params: PathParams,
) -> Result<Response, Fault> {
    let reply: Result<Reply, HandlerError> =
        AssertUnwindSafe(async move { handler.call(request, params).await })
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(HandlerError::Panic(panic_message(panic.as_ref()))));

    Ok(reply?.into_response()?)
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Acknowledge startup and shutdown until the shutdown signal arrives.
async fn run_lifespan(
    source: &mut dyn EventSource,
    sink: &mut dyn EventSink,
) -> Result<(), TransportError> {
    loop {
        match source.receive().await? {
            InboundEvent::LifespanStartup => {
                tracing::info!("Lifespan startup");
                sink.send(OutboundEvent::LifespanStartupComplete).await?;
            }
            InboundEvent::LifespanShutdown => {
                tracing::info!("Lifespan shutdown");
                sink.send(OutboundEvent::LifespanShutdownComplete).await?;
                return Ok(());
            }
            other => tracing::debug!(event = ?other, "Ignoring non-lifespan event"),
        }
    }
}

#[async_trait]
impl App for Dispatcher {
    async fn call(
        &self,
        scope: Scope,
        mut source: BoxSource,
        mut sink: BoxSink,
    ) -> Result<(), TransportError> {
        match scope {
            Scope::Http(http) => {
                let response = self.handle(http, source).await;
                response.emit(sink.as_mut()).await
            }
            Scope::Lifespan => run_lifespan(source.as_mut(), sink.as_mut()).await,
            Scope::Other(kind) => {
                tracing::debug!(scope = %kind, "Ignoring unsupported scope");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::handler::SyncHandler;
    use crate::transport::{channel_sink, channel_source, BufferedSource};
    use bytes::Bytes;
    use serde_json::{json, Value};

    fn dispatcher() -> Dispatcher {
        let mut router: HandlerRouter = Router::new();
        router.add_route(
            "/user/{user_id:int}",
            Arc::new(|_req: Request, params: PathParams| async move {
                Ok::<_, HandlerError>(json!({"user_id": params.get_int("user_id")}))
            }),
            ["GET"],
        );
        router.add_route(
            "/sync",
            Arc::new(SyncHandler(|_req: Request, _params: PathParams| {
                Ok::<_, HandlerError>("sync result")
            })),
            ["GET"],
        );
        router.add_route(
            "/fail",
            Arc::new(|_req: Request, _params: PathParams| async move {
                Err::<String, _>(HandlerError::msg("boom"))
            }),
            ["GET"],
        );
        router.add_route(
            "/panic",
            Arc::new(SyncHandler(|_req: Request, _params: PathParams| -> Result<String, HandlerError> {
                panic!("handler exploded")
            })),
            ["GET"],
        );
        router.add_route(
            "/echo",
            Arc::new(|mut req: Request, _params: PathParams| async move {
                let body = req.text().await?;
                Ok::<_, HandlerError>(Response::text(body).with_status(201))
            }),
            ["POST"],
        );
        Dispatcher::new(router)
    }

    async fn handle(method: &str, path: &str, body: &'static [u8]) -> Response {
        dispatcher()
            .handle(HttpScope::new(method, path), Box::new(BufferedSource::new(body)))
            .await
    }

    #[tokio::test]
    async fn test_json_handler() {
        let resp = handle("GET", "/user/42", b"").await;
        assert_eq!(resp.status(), 200);
        let body: Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body, json!({"user_id": 42}));
    }

    #[tokio::test]
    async fn test_sync_handler_text() {
        let resp = handle("GET", "/sync", b"").await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.body().as_ref(), b"sync result");
    }

    #[tokio::test]
    async fn test_not_found() {
        let resp = handle("GET", "/user/abc", b"").await;
        assert_eq!(resp.status(), 404);
        assert_eq!(resp.body().as_ref(), b"Not Found");

        let resp = handle("DELETE", "/user/1", b"").await;
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn test_handler_error_becomes_500() {
        let resp = handle("GET", "/fail", b"").await;
        assert_eq!(resp.status(), 500);
        assert_eq!(resp.body().as_ref(), b"Internal Server Error");
    }

    #[tokio::test]
    async fn test_handler_panic_becomes_500() {
        let resp = handle("GET", "/panic", b"").await;
        assert_eq!(resp.status(), 500);
    }

    #[tokio::test]
    async fn test_response_passthrough_with_body() {
        let resp = handle("POST", "/echo", b"payload").await;
        assert_eq!(resp.status(), 201);
        assert_eq!(resp.body().as_ref(), b"payload");
    }

    #[tokio::test]
    async fn test_call_emits_start_then_body() {
        let (sink, mut rx) = channel_sink();
        dispatcher()
            .call(
                Scope::Http(HttpScope::new("GET", "/sync")),
                Box::new(BufferedSource::empty()),
                Box::new(sink),
            )
            .await
            .unwrap();

        assert!(matches!(rx.recv().await, Some(OutboundEvent::ResponseStart { status: 200, .. })));
        assert_eq!(
            rx.recv().await,
            Some(OutboundEvent::ResponseBody { body: Bytes::from_static(b"sync result") })
        );
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_lifespan_acknowledgements() {
        let (tx, source) = channel_source();
        let (sink, mut rx) = channel_sink();
        tx.send(InboundEvent::LifespanStartup).unwrap();
        tx.send(InboundEvent::LifespanShutdown).unwrap();

        dispatcher()
            .call(Scope::Lifespan, Box::new(source), Box::new(sink))
            .await
            .unwrap();

        assert_eq!(rx.recv().await, Some(OutboundEvent::LifespanStartupComplete));
        assert_eq!(rx.recv().await, Some(OutboundEvent::LifespanShutdownComplete));
    }

    #[tokio::test]
    async fn test_other_scope_ignored() {
        let (sink, mut rx) = channel_sink();
        dispatcher()
            .call(Scope::Other("websocket".into()), Box::new(BufferedSource::empty()), Box::new(sink))
            .await
            .unwrap();
        assert!(rx.recv().await.is_none());
    }
}
