//! HTTP server implementation
//!
//! hyper http1 with TokioIo; one task per connection.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{error, info};

use crate::config::Args;
use crate::ingest::Pipeline;
use crate::routes;
use crate::types::Result;

type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Route prefix for ingestion endpoints
pub const INGEST_PREFIX: &str = "/prarthana_script/v1/";

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub pipeline: Pipeline,
    /// Held for the whole of an ingestion run; a second run is rejected
    run_lock: Mutex<()>,
    running: AtomicBool,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

/// Proof that the caller owns the current ingestion run
pub struct RunGuard<'a> {
    running: &'a AtomicBool,
    _lock: MutexGuard<'a, ()>,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

impl AppState {
    pub fn new(args: Args, pipeline: Pipeline) -> Self {
        Self {
            args,
            pipeline,
            run_lock: Mutex::new(()),
            running: AtomicBool::new(false),
            started_at: chrono::Utc::now(),
        }
    }

    /// Claim the run lock, or `None` if a run is already in progress
    pub fn try_begin_run(&self) -> Option<RunGuard<'_>> {
        let lock = self.run_lock.try_lock().ok()?;
        self.running.store(true, Ordering::Release);
        Some(RunGuard {
            running: &self.running,
            _lock: lock,
        })
    }

    /// Whether an ingestion run is in progress. Never touches the run lock.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!("Listening on {}", state.args.listen);

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .preserve_header_case(true)
                        .title_case_headers(true)
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
pub async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    Ok(to_boxed(route(state, &method, &path).await))
}

/// Dispatch on method and path
pub async fn route(state: Arc<AppState>, method: &Method, path: &str) -> Response<Full<Bytes>> {
    match (method, path) {
        (&Method::GET, "/health-check") | (&Method::GET, "/health") => {
            routes::health_check(&state)
        }

        (&Method::GET, "/version") => routes::version_info(),

        (&Method::OPTIONS, _) => preflight_response(),

        (&Method::POST, p) if p.starts_with(INGEST_PREFIX) => {
            let segment = p.strip_prefix(INGEST_PREFIX).unwrap_or("");
            routes::handle_ingest_request(state, segment.trim_end_matches('/')).await
        }

        (_, p) if p.starts_with(INGEST_PREFIX) => routes::json_response(
            StatusCode::METHOD_NOT_ALLOWED,
            &serde_json::json!({ "error": "Method Not Allowed", "allowed": "POST" }),
        ),

        _ => not_found_response(path),
    }
}

/// Convert a Full<Bytes> body to BoxBody
fn to_boxed(response: Response<Full<Bytes>>) -> Response<BoxBody> {
    response.map(|body| body.map_err(|never| match never {}).boxed())
}

/// CORS preflight response
fn preflight_response() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    let headers = response.headers_mut();
    headers.insert(
        "Access-Control-Allow-Origin",
        hyper::header::HeaderValue::from_static("*"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        hyper::header::HeaderValue::from_static("*"),
    );
    headers.insert(
        "Access-Control-Allow-Methods",
        hyper::header::HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    response
}

/// Not found response
fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    routes::json_response(
        StatusCode::NOT_FOUND,
        &serde_json::json!({
            "error": "Not Found",
            "path": path,
            "hint": "POST /prarthana_script/v1/{deities|shloks|stotras|prarthanas|all}"
        }),
    )
}
