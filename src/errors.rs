use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failure kinds produced by the query engine.
///
/// `InvalidRequest` and `BackendRejected` are caller-visible client errors;
/// `BackendTransient` means retries were exhausted against the billing
/// backend; `AggregationInconsistency` means the backend or planner broke
/// the merge contract and the response must not be served.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("backend rejected query: {0}")]
    BackendRejected(String),
    #[error("billing backend unavailable: {0}")]
    BackendTransient(String),
    #[error("aggregation inconsistency: {0}")]
    AggregationInconsistency(String),
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub body: ApiError,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ApiError {
                code: "BAD_REQUEST".into(),
                message: msg.into(),
                details: None,
            },
        }
    }

    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            body: ApiError {
                code: "BACKEND_REJECTED".into(),
                message: msg.into(),
                details: None,
            },
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ApiError {
                code: "INTERNAL_ERROR".into(),
                message: msg.into(),
                details: None,
            },
        }
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: ApiError {
                code: "SERVICE_UNAVAILABLE".into(),
                message: msg.into(),
                details: None,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<QueryError> for AppError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::InvalidRequest(msg) => Self::bad_request(msg),
            QueryError::BackendRejected(msg) => Self::unprocessable(msg),
            QueryError::BackendTransient(msg) => {
                tracing::warn!("Backend unavailable: {msg}");
                Self::service_unavailable(msg)
            }
            QueryError::AggregationInconsistency(msg) => {
                tracing::error!("Aggregation inconsistency: {msg}");
                Self::internal(msg)
            }
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!("Internal error: {:?}", err);
        Self::internal(err.to_string())
    }
}
