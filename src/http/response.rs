//! JSON response envelope and error mapping.
//!
//! Every answer, success or failure, is `{status, message, data}`.
//! - Job rejections map to 4xx with their message
//! - Store and reload failures map to 500 with the underlying error text
//! - Giving up on the document lock maps to 503; nothing was read or written
//! - Reload failures also report `{"persisted": true, "reloaded": false}`
//!   in `data` so callers can tell the file and the collector apart

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::engine::JobError;
use crate::service::ServiceError;

/// The body of every API response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub message: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: "success".into(),
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<serde_json::Value> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".into(),
            message: message.into(),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// An error response with its HTTP status.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ApiResponse<serde_json::Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ApiResponse::error(message),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        let status = match err {
            JobError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            JobError::DuplicateName(_) | JobError::DuplicateAddress { .. } => StatusCode::CONFLICT,
            JobError::JobNotFound(_) | JobError::AddressNotFound(_) => StatusCode::NOT_FOUND,
        };
        Self::new(status, err.to_string())
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Job(e) => e.into(),
            ServiceError::Store(e) => Self::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            e @ ServiceError::Worker(_) => Self::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            e @ ServiceError::Busy(_) => Self::new(StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
            e @ ServiceError::Reload(_) => {
                let mut api = Self::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
                api.body.data = Some(json!({ "persisted": true, "reloaded": false }));
                api
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, self.body).into_response()
    }
}
