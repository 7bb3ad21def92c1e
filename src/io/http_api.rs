//! Door HTTP API
//!
//! Endpoints:
//! - `GET /api/status` - current door position
//! - `POST /api/toggle` - pulse the relay
//! - `GET /api/logs?limit=N` - newest event log lines first
//! - `GET /health`

use crate::io::event_log::FileEventSink;
use crate::services::door::DoorController;
use bytes::Bytes;
use http_body_util::Full;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::json;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Upper bound for `limit` on /api/logs
const MAX_LOG_LIMIT: usize = 1000;

/// Shared request handler state
pub struct ApiState {
    pub door: Arc<DoorController>,
    pub log: Arc<FileEventSink>,
    pub default_log_limit: usize,
}

fn json_response(status: StatusCode, body: serde_json::Value) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(body.to_string())))
        .expect("static response should not fail")
}

/// Parse `limit` from a query string, falling back to `default`
fn parse_limit(query: Option<&str>, default: usize) -> usize {
    query
        .and_then(|q| {
            q.split('&').find_map(|pair| pair.strip_prefix("limit=")).and_then(|v| v.parse().ok())
        })
        .unwrap_or(default)
        .min(MAX_LOG_LIMIT)
}

/// Handle HTTP requests
async fn handle_request<B>(
    req: Request<B>,
    state: Arc<ApiState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    match (req.method(), req.uri().path()) {
        (&Method::GET, "/api/status") => match state.door.status() {
            Ok(position) => Ok(json_response(StatusCode::OK, json!({ "status": position.as_str() }))),
            Err(e) => {
                error!(error = %e, "api_status_failed");
                Ok(json_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": e.to_string() }),
                ))
            }
        },
        (&Method::POST, "/api/toggle") => match state.door.toggle().await {
            Ok(pulse) => {
                info!(from = %pulse.from.as_str(), "api_toggle");
                Ok(json_response(
                    StatusCode::OK,
                    json!({ "success": true, "message": "Door toggled" }),
                ))
            }
            Err(e) => {
                error!(error = %e, "api_toggle_failed");
                Ok(json_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "success": false, "message": e.to_string() }),
                ))
            }
        },
        (&Method::GET, "/api/logs") => {
            let limit = parse_limit(req.uri().query(), state.default_log_limit);
            match state.log.recent(limit) {
                Ok(logs) => Ok(json_response(StatusCode::OK, json!({ "logs": logs }))),
                Err(e) => {
                    warn!(error = %e, "api_logs_failed");
                    Ok(json_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        json!({ "error": e.to_string() }),
                    ))
                }
            }
        }
        (&Method::GET, "/health") => Ok(Response::builder()
            .status(StatusCode::OK)
            .body(Full::new(Bytes::from("ok")))
            .expect("static response should not fail")),
        _ => Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Full::new(Bytes::from("Not Found")))
            .expect("static response should not fail")),
    }
}

/// Start the door HTTP API
pub async fn start_api_server(
    addr: SocketAddr,
    state: Arc<ApiState>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;

    info!(addr = %addr, "http_api_started");

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, _addr)) => {
                        let io = TokioIo::new(stream);
                        let state = state.clone();

                        tokio::spawn(async move {
                            let service = service_fn(move |req| {
                                let state = state.clone();
                                async move { handle_request(req, state).await }
                            });

                            if let Err(e) = http1::Builder::new()
                                .serve_connection(io, service)
                                .await
                            {
                                error!(error = %e, "http_api_connection_error");
                            }
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "http_api_accept_error");
                    }
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("http_api_shutdown");
                    return Ok(());
                }
            }
        }
    }
}
