//! Loopback HTTP surface of the daemon, plus the client the CLI uses to talk to it.

use std::net::SocketAddr;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::CONTENT_TYPE;
use hyper::{Method, Request};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};

use crate::commands::{Command, SchedulerStatus, parse_interval};
use crate::daemon::DaemonHandle;
use crate::error::{CommandError, ControlError};

pub fn router(daemon: DaemonHandle) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/status", get(status))
        .route("/api/command", post(command))
        .route("/api/timer/start", post(timer_start))
        .route("/api/timer/stop", post(timer_stop))
        .route("/api/timer/interval", post(timer_interval))
        .with_state(daemon)
        .layer(cors)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommandResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SchedulerStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalRequest {
    /// Number or numeric string, in minutes.
    pub interval_minutes: Value,
}

#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    Unavailable,
}

impl From<CommandError> for ApiError {
    fn from(err: CommandError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

impl From<ControlError> for ApiError {
    fn from(_: ControlError) -> Self {
        ApiError::Unavailable
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (code, error) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "daemon is shutting down".to_string(),
            ),
        };
        let body = CommandResponse {
            ok: false,
            status: None,
            error: Some(error),
        };
        (code, Json(body)).into_response()
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn status(State(daemon): State<DaemonHandle>) -> Result<Json<SchedulerStatus>, ApiError> {
    Ok(Json(daemon.status().await?))
}

async fn run(daemon: &DaemonHandle, command: Command) -> Result<Json<CommandResponse>, ApiError> {
    let status = daemon.command(command).await??;
    Ok(Json(CommandResponse {
        ok: true,
        status: Some(status),
        error: None,
    }))
}

async fn command(
    State(daemon): State<DaemonHandle>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<CommandResponse>, ApiError> {
    let Json(raw) = payload?;
    let command = Command::from_json(raw)?;
    run(&daemon, command).await
}

async fn timer_start(
    State(daemon): State<DaemonHandle>,
    payload: Result<Json<IntervalRequest>, JsonRejection>,
) -> Result<Json<CommandResponse>, ApiError> {
    let Json(req) = payload?;
    let interval_minutes = parse_interval(&req.interval_minutes)?;
    run(&daemon, Command::StartTimer { interval_minutes }).await
}

async fn timer_stop(State(daemon): State<DaemonHandle>) -> Result<Json<CommandResponse>, ApiError> {
    run(&daemon, Command::StopTimer).await
}

async fn timer_interval(
    State(daemon): State<DaemonHandle>,
    payload: Result<Json<IntervalRequest>, JsonRejection>,
) -> Result<Json<CommandResponse>, ApiError> {
    let Json(req) = payload?;
    let interval_minutes = parse_interval(&req.interval_minutes)?;
    run(&daemon, Command::SetInterval { interval_minutes }).await
}

/// HTTP client for the control API.
#[derive(Clone)]
pub struct ControlClient {
    addr: SocketAddr,
    http: Client<HttpConnector, Full<Bytes>>,
}

impl ControlClient {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            http: Client::builder(TokioExecutor::new()).build_http(),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    async fn request(&self, method: Method, path: &str, body: Option<Vec<u8>>) -> Result<(u16, Bytes), ControlError> {
        let unreachable_at = |reason: String| ControlError::Unreachable {
            addr: self.addr.to_string(),
            reason,
        };
        let mut builder = Request::builder()
            .method(method)
            .uri(format!("http://{}{}", self.addr, path));
        if body.is_some() {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }
        let req = builder
            .body(Full::new(Bytes::from(body.unwrap_or_default())))
            .map_err(|e| unreachable_at(e.to_string()))?;

        let resp = self
            .http
            .request(req)
            .await
            .map_err(|e| unreachable_at(e.to_string()))?;
        let code = resp.status().as_u16();
        let bytes = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| unreachable_at(e.to_string()))?
            .to_bytes();
        Ok((code, bytes))
    }

    fn rejected(code: u16, bytes: &Bytes) -> ControlError {
        let body = serde_json::from_slice::<CommandResponse>(bytes)
            .ok()
            .and_then(|r| r.error)
            .unwrap_or_else(|| String::from_utf8_lossy(bytes).into_owned());
        ControlError::Rejected { status: code, body }
    }

    pub async fn health(&self) -> Result<bool, ControlError> {
        let (code, bytes) = self.request(Method::GET, "/api/health", None).await?;
        Ok(code == 200 && bytes.as_ref() == b"ok")
    }

    pub async fn status(&self) -> Result<SchedulerStatus, ControlError> {
        let (code, bytes) = self.request(Method::GET, "/api/status", None).await?;
        if code != 200 {
            return Err(Self::rejected(code, &bytes));
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn send(&self, command: Command) -> Result<SchedulerStatus, ControlError> {
        let body = serde_json::to_vec(&command)?;
        let (code, bytes) = self
            .request(Method::POST, "/api/command", Some(body))
            .await?;
        if code != 200 {
            return Err(Self::rejected(code, &bytes));
        }
        let reply: CommandResponse = serde_json::from_slice(&bytes)?;
        reply.status.ok_or_else(|| Self::rejected(code, &bytes))
    }
}
