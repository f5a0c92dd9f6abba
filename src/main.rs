//! Zephyr demo server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ axum bridge ──▶ Cors ──▶ Csrf ──▶ RateLimit ──▶ Dispatcher ──▶ handler
//!                (scope, body      │        │          │              │
//!                 source, sink)    └────────┴──────────┴──────────────┘
//!     Client ◀── axum bridge ◀──────── start + body events
//! ```

use std::path::PathBuf;

use clap::Parser;
use serde_json::json;
use tokio::net::TcpListener;

use zephyr::config::{load_config, override_bind_address, ServerConfig};
use zephyr::lifecycle::Shutdown;
use zephyr::observability::{logging, metrics};
use zephyr::{Application, HandlerError, HttpServer, PathParams, Request, Response};

#[derive(Parser, Debug)]
#[command(name = "zephyr", version, about = "Minimal async HTTP application server")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config = override_bind_address(config, bind)?;
    }

    logging::init_tracing(&config.observability);
    tracing::info!("zephyr v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let app = demo_app(&config).into_app();

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    tokio::spawn(shutdown.clone().trigger_on_os_signal());

    HttpServer::new(app).run(listener, shutdown.signal()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn demo_app(config: &ServerConfig) -> Application {
    Application::with_config(config)
        .get("/hello", |_req: Request, _params: PathParams| async {
            Ok::<_, HandlerError>(Response::json(&json!({"message": "Hello, world!"}))?)
        })
        .get("/user/{user_id:int}", |_req: Request, params: PathParams| async move {
            let user_id = params
                .get_int("user_id")
                .ok_or_else(|| HandlerError::Failed("missing user_id".into()))?;
            Ok::<_, HandlerError>(json!({"user_id": user_id}))
        })
        .post("/echo", |mut req: Request, _params: PathParams| async move {
            let body: serde_json::Value = req.json().await?;
            Ok::<_, HandlerError>(json!({"received": body}))
        })
}
