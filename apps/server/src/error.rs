//! Error types for the lookup server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Postgres SQLSTATE for a statement cancelled by `statement_timeout`.
const QUERY_CANCELED: &str = "57014";

#[derive(Debug, Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Query timed out: {0}")]
    QueryTimeout(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Upstream service returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Upstream service timed out")]
    UpstreamTimeout,

    #[error("{0}")]
    FeatureDisabled(String),

    #[error("Region index error: {0}")]
    Region(#[from] jeonse_region::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Convert a driver error, recognising statement-timeout cancellation.
    pub fn from_query(err: sqlx::Error, context: &str) -> Self {
        let cancelled = err
            .as_database_error()
            .and_then(|db| db.code())
            .is_some_and(|code| code == QUERY_CANCELED);
        if cancelled {
            Error::QueryTimeout(context.to_string())
        } else {
            Error::Database(err)
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::QueryTimeout(_) | Error::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            Error::Upstream { .. } => StatusCode::BAD_GATEWAY,
            Error::FeatureDisabled(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Database(_) | Error::Region(_) | Error::Config(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        // Driver details stay in the log.
        let message = match &self {
            Error::Database(_) => "Database error".to_string(),
            other => other.to_string(),
        };

        (
            status,
            Json(json!({
                "success": false,
                "error": message,
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            Error::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::FeatureDisabled("off".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            Error::Upstream {
                status: 404,
                message: "none".into()
            }
            .status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            Error::Upstream {
                status: 500,
                message: "boom".into()
            }
            .status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(Error::UpstreamTimeout.status_code(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn non_database_errors_are_not_timeouts() {
        let err = Error::from_query(sqlx::Error::RowNotFound, "unit lookup");
        assert!(matches!(err, Error::Database(_)));
    }
}
