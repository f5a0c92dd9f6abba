//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use serde_json::json;
use tokio::net::TcpListener;

use zephyr::http::Reply;
use zephyr::transport::{channel_sink, App, BufferedSource, HttpScope, OutboundEvent, Scope};
use zephyr::{Application, HandlerError, HttpServer, PathParams, Request, Response, Shutdown};

/// A response reassembled from emitted events.
#[derive(Debug)]
pub struct Collected {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Collected {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn all(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn text(&self) -> &str {
        std::str::from_utf8(&self.body).unwrap()
    }
}

/// Call `app` with one HTTP request and collect what it emitted.
pub async fn call(app: &Arc<dyn App>, scope: HttpScope, body: &'static str) -> Collected {
    let (sink, mut rx) = channel_sink();
    app.call(
        Scope::Http(scope),
        Box::new(BufferedSource::new(body)),
        Box::new(sink),
    )
    .await
    .unwrap();

    let mut start = None;
    let mut payload = Bytes::new();
    while let Ok(event) = rx.try_recv() {
        match event {
            OutboundEvent::ResponseStart { status, headers } => start = Some((status, headers)),
            OutboundEvent::ResponseBody { body } => payload = body,
            other => panic!("unexpected event {:?}", other),
        }
    }

    let (status, headers) = start.expect("no response start emitted");
    Collected {
        status,
        headers: headers
            .into_iter()
            .map(|(k, v)| {
                (
                    String::from_utf8(k.to_vec()).unwrap(),
                    String::from_utf8(v.to_vec()).unwrap(),
                )
            })
            .collect(),
        body: payload,
    }
}

pub fn client(ip: &str) -> SocketAddr {
    format!("{}:50000", ip).parse().unwrap()
}

/// Application with a handful of representative routes.
pub fn sample_app() -> Application {
    Application::new()
        .get("/hello", |_req: Request, _params: PathParams| async {
            Ok::<_, HandlerError>(Response::json(&json!({"message": "OK", "code": 200}))?)
        })
        .get("/user/{user_id:int}", |_req: Request, params: PathParams| async move {
            Ok::<_, HandlerError>(json!({"user_id": params.get_int("user_id")}))
        })
        .get("/search/{q}", |_req: Request, params: PathParams| async move {
            Ok::<_, HandlerError>(format!("q={}", params.get_str("q").unwrap_or_default()))
        })
        .post("/echo", |mut req: Request, _params: PathParams| async move {
            Ok::<_, HandlerError>(req.text().await?)
        })
        .get("/fail", |_req: Request, _params: PathParams| async {
            Err::<Reply, _>(HandlerError::Failed("boom".into()))
        })
        .get("/login", |_req: Request, _params: PathParams| async {
            Ok::<_, HandlerError>(
                Response::text("welcome").with_header("set-cookie", "csrftoken=fixed; Path=/"),
            )
        })
}

/// Serve `app` on an ephemeral port; returns its address and the shutdown handle.
pub async fn spawn_server(app: Arc<dyn App>) -> (SocketAddr, Shutdown, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.signal();
    let handle = tokio::spawn(async move {
        HttpServer::new(app).run(listener, rx).await.unwrap();
    });
    (addr, shutdown, handle)
}
