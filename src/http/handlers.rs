//! Job API handlers.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::http::response::{ApiError, ApiResponse};
use crate::http::server::AppState;
use crate::store::JobSummary;

/// Body of `POST /jobs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddJobRequest {
    pub job_name: String,
    pub ip_address: String,
}

/// Query of `GET /jobs/search`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    pub ip: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub document: String,
    pub reload_mode: &'static str,
}

pub async fn list_jobs(State(state): State<AppState>) -> Result<ApiResponse<Vec<JobSummary>>, ApiError> {
    let jobs = state.service.list_jobs().await?;
    Ok(ApiResponse::success("Jobs retrieved successfully", jobs))
}

pub async fn add_job(
    State(state): State<AppState>,
    payload: Result<Json<AddJobRequest>, JsonRejection>,
) -> Result<ApiResponse<JobSummary>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection.body_text(), "Rejected add body");
        ApiError::bad_request("Invalid request body")
    })?;

    let job = state
        .service
        .add_job(&request.job_name, &request.ip_address)
        .await?;
    Ok(ApiResponse::success("Job added successfully", job))
}

pub async fn remove_job(
    State(state): State<AppState>,
    Path(job_name): Path<String>,
) -> Result<ApiResponse<String>, ApiError> {
    remove_named(&state, &job_name).await
}

/// `/jobs/search` shadows `/jobs/{job_name}`, so a job literally named
/// `search` is removed through here.
pub async fn remove_search_job(State(state): State<AppState>) -> Result<ApiResponse<String>, ApiError> {
    remove_named(&state, "search").await
}

async fn remove_named(state: &AppState, job_name: &str) -> Result<ApiResponse<String>, ApiError> {
    let removed = state.service.remove_job(job_name).await?;
    Ok(ApiResponse::success("Job removed successfully", removed))
}

pub async fn search_jobs(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<ApiResponse<Vec<JobSummary>>, ApiError> {
    let ip = query
        .ok()
        .and_then(|Query(q)| q.ip)
        .filter(|ip| !ip.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("IP address is required"))?;

    let jobs = state.service.search_by_address(&ip).await?;
    Ok(ApiResponse::success("Job(s) retrieved successfully", jobs))
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        document: state.service.store().path().display().to_string(),
        reload_mode: state.service.reload_mode(),
    })
}

pub async fn not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "Route not found")
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::new(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}
