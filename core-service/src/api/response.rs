//! Response envelope and error mapping

use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use core_stream::{HealthCheckResult, StreamError};
use provider_radio_browser::DirectoryError;
use serde::Serialize;
use tracing::warn;

/// `{ok, data?, message?}`
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            message: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// Body of `/api/stream/check/{stationId}`. `ok` is always `true`; the
/// verdict lives in `healthy`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponse {
    pub ok: bool,
    pub healthy: bool,
    pub reachable: bool,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub is_audio_like: bool,
    pub message: String,
}

impl CheckResponse {
    pub fn missing_url() -> Self {
        Self {
            ok: true,
            healthy: false,
            reachable: false,
            status: 400,
            content_type: None,
            is_audio_like: false,
            message: "Stream URL is required".to_string(),
        }
    }
}

impl From<HealthCheckResult> for CheckResponse {
    fn from(result: HealthCheckResult) -> Self {
        Self {
            ok: true,
            healthy: result.healthy(),
            reachable: result.reachable,
            status: result.http_status,
            content_type: result.content_type,
            is_audio_like: result.is_audio_like,
            message: result.message,
        }
    }
}

/// Failed request, rendered as `{ok:false, message}` with `status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<DirectoryError> for ApiError {
    fn from(error: DirectoryError) -> Self {
        let status = match &error {
            DirectoryError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            warn!(error = %error, "Directory request failed");
        }
        Self::new(status, error.to_string())
    }
}

impl From<StreamError> for ApiError {
    fn from(error: StreamError) -> Self {
        let status =
            StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::BAD_GATEWAY);
        let message = match error {
            StreamError::RelayUpstreamError { message, .. } => message,
            other => other.to_string(),
        };
        Self::new(status, message)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::failure(self.message))).into_response()
    }
}
