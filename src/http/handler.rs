//! Handler trait and return-value normalization.

use std::future::Future;

use futures_util::future::{self, BoxFuture};
use serde_json::{Map, Value};

use crate::http::error::HandlerError;
use crate::http::request::Request;
use crate::http::response::{to_json_text, Response};
use crate::routing::PathParams;

pub type HandlerFuture = BoxFuture<'static, Result<Reply, HandlerError>>;

/// Something a route can invoke.
///
/// Implemented for async closures `Fn(Request, PathParams) -> impl Future`;
/// wrap synchronous functions in [`SyncHandler`].
pub trait Handler: Send + Sync + 'static {
    fn call(&self, request: Request, params: PathParams) -> HandlerFuture;
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request, PathParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, HandlerError>> + Send + 'static,
    R: Into<Reply>,
{
    fn call(&self, request: Request, params: PathParams) -> HandlerFuture {
        let fut = (self)(request, params);
        Box::pin(async move { fut.await.map(Into::into) })
    }
}

/// Adapter for handlers that complete synchronously.
pub struct SyncHandler<F>(pub F);

impl<F, R> Handler for SyncHandler<F>
where
    F: Fn(Request, PathParams) -> Result<R, HandlerError> + Send + Sync + 'static,
    R: Into<Reply>,
{
    fn call(&self, request: Request, params: PathParams) -> HandlerFuture {
        Box::pin(future::ready((self.0)(request, params).map(Into::into)))
    }
}

/// A handler's successful result before it becomes a [`Response`].
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Passed through unchanged.
    Response(Response),
    /// A JSON object, sent as `application/json`.
    Json(Map<String, Value>),
    /// Anything else, sent as `text/plain`.
    Text(String),
}

impl Reply {
    pub fn into_response(self) -> Result<Response, HandlerError> {
        match self {
            Reply::Response(response) => Ok(response),
            Reply::Json(map) => Ok(Response::json(&map)?),
            Reply::Text(text) => Ok(Response::text(text)),
        }
    }
}

impl From<Response> for Reply {
    fn from(response: Response) -> Self {
        Reply::Response(response)
    }
}

impl From<Map<String, Value>> for Reply {
    fn from(map: Map<String, Value>) -> Self {
        Reply::Json(map)
    }
}

/// Objects become JSON replies, strings plain text, and any other value its
/// JSON text in the response style (`[1, 2]`, `true`, `null`) as plain text.
impl From<Value> for Reply {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Reply::Json(map),
            Value::String(text) => Reply::Text(text),
            other => Reply::Text(to_json_text(&other)),
        }
    }
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Reply::Text(text)
    }
}

impl From<&str> for Reply {
    fn from(text: &str) -> Self {
        Reply::Text(text.to_string())
    }
}
