//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the job API handlers
//! - Wire up middleware (request id, tracing, read timeout, body limit, metrics)
//! - Keep every error, including middleware ones, in the JSON envelope
//! - Serve until the shutdown handle fires

use axum::{
    body::Body,
    extract::{ConnectInfo, DefaultBodyLimit, MatchedPath},
    http::{header, Request},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServiceConfig;
use crate::http::handlers::{
    add_job, get_status, list_jobs, method_not_allowed, not_found, remove_job, remove_search_job,
    search_jobs,
};
use crate::http::request::{request_id, UuidRequestId, X_REQUEST_ID};
use crate::http::response::ApiError;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::service::JobService;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<JobService>,
}

/// HTTP server for the job API.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
}

impl HttpServer {
    /// Create a server whose service and reloader come from `config`.
    pub fn new(config: ServiceConfig) -> Self {
        let service = Arc::new(JobService::from_config(&config));
        Self::with_service(config, service)
    }

    /// Create a server around an already wired service.
    pub fn with_service(config: ServiceConfig, service: Arc<JobService>) -> Self {
        let state = AppState { service };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Only reads carry the request timeout. A mutation must not be cut off
    /// between save and reload, so it is bounded by the service's lock wait
    /// and reload timeout instead.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        let read_timeout = TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs));

        Router::new()
            .route("/jobs", get(list_jobs).layer(read_timeout).post(add_job))
            .route(
                "/jobs/search",
                get(search_jobs).layer(read_timeout).delete(remove_search_job),
            )
            .route("/jobs/{job_name}", delete(remove_job))
            .route("/status", get(get_status).layer(read_timeout))
            .route_layer(middleware::from_fn(track_metrics))
            .method_not_allowed_fallback(method_not_allowed)
            .fallback(not_found)
            .with_state(state)
            .layer(middleware::map_response(envelope_bare_errors))
            .layer(DefaultBodyLimit::max(config.listener.max_body_bytes))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let peer = request
                    .extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.to_string())
                    .unwrap_or_default();
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id(request),
                    peer = %peer
                )
            }))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            document = %self.config.document.path,
            dry_run = self.config.reload.dry_run,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

/// Record per-route request metrics.
async fn track_metrics(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());
    let method = request.method().to_string();

    let response = next.run(request).await;
    metrics::record_request(&method, &route, response.status().as_u16(), start);
    response
}

/// Wrap error responses produced by middleware (timeouts, body limits) in
/// the JSON envelope. Handler errors already carry a content type.
async fn envelope_bare_errors(response: Response) -> Response {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error())
        || response.headers().contains_key(header::CONTENT_TYPE)
    {
        return response;
    }

    let message = status.canonical_reason().unwrap_or("Request failed");
    let mut wrapped = ApiError::new(status, message).into_response();
    for (name, value) in response.headers() {
        if !wrapped.headers().contains_key(name) && *name != header::CONTENT_LENGTH {
            wrapped.headers_mut().insert(name.clone(), value.clone());
        }
    }
    wrapped
}
