use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use zoneguard_core::error::CoreError;
use zoneguard_core::gateway::GatewayError;
use zoneguard_core::store::StoreError;
use zoneguard_suppression::SuppressionError;

/// Application-level error type for HTTP handlers.
///
/// Wraps domain and storage errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce `{ "error", "code" }` bodies.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// The reporting service was needed to answer the request.
    #[error("Reporting error: {0}")]
    Reporting(GatewayError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<SuppressionError> for AppError {
    fn from(err: SuppressionError) -> Self {
        match err {
            SuppressionError::Core(e) => Self::Core(e),
            SuppressionError::Store(e) => Self::Store(e),
            SuppressionError::Reporting(e) => Self::Reporting(e),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Core(CoreError::Validation(errors.to_string()))
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    internal()
                }
            },

            AppError::Store(err) => {
                tracing::error!(error = %err, "Storage error");
                internal()
            }

            AppError::Reporting(err) if err.is_unconfigured() => (
                StatusCode::BAD_REQUEST,
                "REPORTING_NOT_CONFIGURED",
                format!("No reporting service configured ({err}); supply the data explicitly"),
            ),
            AppError::Reporting(err) => {
                tracing::warn!(error = %err, "Reporting service call failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "REPORTING_UNAVAILABLE",
                    err.to_string(),
                )
            }

            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
