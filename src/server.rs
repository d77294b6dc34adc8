//! HTTP front door: search relay, liveness, gated pool status and static files.

use crate::error::RelayError;
use crate::pool::ProxyPool;

use axum::extract::{Query, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use log::{debug, error, info, warn};
use serde::Deserialize;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use subtle::ConstantTimeEq;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

/// Shared state for handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<ProxyPool>,
    admin_password: Option<Arc<str>>,
}

impl AppState {
    pub fn new(pool: Arc<ProxyPool>, admin_password: Option<String>) -> Self {
        Self {
            pool,
            admin_password: admin_password.map(Arc::from),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

/// Build the router. Paths without a route are served from `static_dir`.
pub fn router(state: AppState, static_dir: impl AsRef<Path>) -> Router {
    let admin = Router::new()
        .route("/admin/proxies", get(list_proxies))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route("/search", get(search))
        .route("/status", get(status))
        .merge(admin)
        .fallback_service(ServeDir::new(static_dir))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

/// Serve `router` on `addr` until ctrl-c.
pub async fn serve(addr: &str, router: Router) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Server running on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_on(tokio::signal::ctrl_c()))
        .await
}

/// Resolves when `signal` fires. If the handler could not be installed the
/// error is logged and this never resolves, so the server keeps running.
async fn shutdown_on(signal: impl Future<Output = std::io::Result<()>>) {
    match signal.await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Response, RelayError> {
    let query = match params.q {
        Some(q) if !q.is_empty() => q,
        _ => return Ok((StatusCode::BAD_REQUEST, "Query required").into_response()),
    };

    let body = state.pool.search(&query).await?;
    Ok(([(header::CONTENT_TYPE, "text/html; charset=utf-8")], body).into_response())
}

async fn status() -> &'static str {
    "Server running"
}

async fn list_proxies(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.pool.list_status())
}

/// Admit requests carrying `Authorization: Bearer <admin password>`.
async fn require_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, RelayError> {
    let Some(expected) = state.admin_password.as_deref() else {
        warn!("Admin view requested but no admin password is configured");
        return Err(RelayError::Unauthorized);
    };

    let presented = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    if !credentials_match(presented, expected) {
        warn!("Rejected admin request for {}", req.uri());
        return Err(RelayError::Unauthorized);
    }

    Ok(next.run(req).await)
}

/// Compares in constant time for equal-length inputs.
fn credentials_match(presented: Option<&str>, expected: &str) -> bool {
    presented.is_some_and(|p| bool::from(p.as_bytes().ct_eq(expected.as_bytes())))
}

async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().path().to_string();
    let start = Instant::now();

    debug!("{} {} - started", method, uri);
    let response = next.run(req).await;
    info!(
        "{} {} - {} in {:?}",
        method,
        uri,
        response.status(),
        start.elapsed()
    );

    response
}
