use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    /// The platform's OAuth endpoint rejected the request or was unreachable.
    /// Carries the upstream error body for operator diagnostics.
    #[error("Upstream auth error: {0}")]
    UpstreamAuth(String),

    /// A refresh was requested for a store that holds no refresh token.
    /// The merchant must re-authorize; retrying cannot succeed.
    #[error("Store {0} has no refresh token")]
    MissingRefreshToken(String),

    /// The platform integration is not implemented yet. Distinct from a
    /// transient upstream failure so operators can tell the two apart.
    #[error("Platform not supported: {0}")]
    UnsupportedPlatform(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "Bad request", Some(msg.clone()))
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized", None),
            AppError::UpstreamAuth(msg) => {
                tracing::error!("Upstream auth error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "Authorization failed",
                    Some(msg.clone()),
                )
            }
            AppError::MissingRefreshToken(store_id) => (
                StatusCode::CONFLICT,
                "Missing refresh token",
                Some(format!("store {} must be re-authorized", store_id)),
            ),
            AppError::UnsupportedPlatform(platform) => (
                StatusCode::NOT_IMPLEMENTED,
                "Platform not supported",
                Some(platform.clone()),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    None,
                )
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    None,
                )
            }
            AppError::Json(e) => {
                tracing::error!("JSON error: {}", e);
                (StatusCode::BAD_REQUEST, "Invalid JSON", Some(e.to_string()))
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
