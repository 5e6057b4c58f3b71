use crate::domain::error::AuditError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Newtype over the domain error so the HTTP status mapping lives in the
/// adapter layer, not the domain.
pub struct ApiError(pub AuditError);

impl From<AuditError> for ApiError {
    fn from(err: AuditError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self.0 {
            AuditError::Validation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                msg.clone(),
            ),
            AuditError::Encoding(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "encoding_error",
                msg.clone(),
            ),
            AuditError::InvalidFilter(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid_filter",
                msg.clone(),
            ),
            AuditError::ConcurrentChainWrite { tenant } => (
                StatusCode::CONFLICT,
                "chain_write_conflict",
                format!("concurrent append for tenant {tenant}, retry"),
            ),
            AuditError::ChainHeadResolution(err) => {
                tracing::error!("chain head resolution error: {err}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "head_resolution_error",
                    "transient storage error, retry".to_string(),
                )
            }
            AuditError::Database(err) => {
                tracing::error!("database error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal error".to_string(),
                )
            }
            AuditError::Serialization(err) => {
                tracing::error!("serialization error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal error".to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "error_code": error_code,
            "message": message,
        });

        (status, Json(body)).into_response()
    }
}
