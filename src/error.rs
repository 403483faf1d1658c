use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tokio_postgres::error::SqlState;

/// Failure kinds reported by a `QuestionStore`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("integrity error: {0}")]
    Integrity(String),

    #[error("query error: {0}")]
    Query(String),
}

impl StoreError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity(message.into())
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Error creating question: {0}")]
    CreateQuestion(#[source] StoreError),

    #[error("Store unavailable: {0}")]
    Unavailable(#[source] StoreError),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Validation(ref message) => {
                tracing::debug!("Request validation failed: {}", message);
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::CreateQuestion(ref err) => {
                match err {
                    StoreError::Connection(_) => tracing::error!("Question write lost the store: {}", err),
                    StoreError::Integrity(_) => tracing::warn!("Question write violated a constraint: {}", err),
                    StoreError::Query(_) => tracing::error!("Question write failed: {}", err),
                }
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Unavailable(ref err) => {
                tracing::warn!("Readiness check failed: {}", err);
                StatusCode::SERVICE_UNAVAILABLE
            }
        };

        let body = Json(json!({ "detail": self.to_string() }));

        (status, body).into_response()
    }
}

// PostgreSQL error mapping
impl From<tokio_postgres::Error> for StoreError {
    fn from(err: tokio_postgres::Error) -> Self {
        if err.is_closed() {
            tracing::error!("PostgreSQL connection closed: {}", err);
            return StoreError::Connection(err.to_string());
        }

        match err.code() {
            Some(&SqlState::FOREIGN_KEY_VIOLATION)
            | Some(&SqlState::NOT_NULL_VIOLATION)
            | Some(&SqlState::UNIQUE_VIOLATION)
            | Some(&SqlState::CHECK_VIOLATION) => StoreError::Integrity(db_message(&err)),
            Some(&SqlState::CONNECTION_EXCEPTION)
            | Some(&SqlState::CONNECTION_DOES_NOT_EXIST)
            | Some(&SqlState::CONNECTION_FAILURE)
            | Some(&SqlState::ADMIN_SHUTDOWN)
            | Some(&SqlState::CANNOT_CONNECT_NOW) => {
                tracing::error!("PostgreSQL connection error: {}", err);
                StoreError::Connection(db_message(&err))
            }
            Some(code) => {
                tracing::error!("Unhandled PostgreSQL error: {} (code: {:?})", err, code);
                StoreError::Query(db_message(&err))
            }
            // No SQLSTATE means the failure happened below the protocol (socket, TLS)
            None => {
                tracing::error!("PostgreSQL transport error: {}", err);
                StoreError::Connection(err.to_string())
            }
        }
    }
}

fn db_message(err: &tokio_postgres::Error) -> String {
    err.as_db_error()
        .map(|db| db.message().to_string())
        .unwrap_or_else(|| err.to_string())
}

// Connection pool error mapping
impl From<deadpool_postgres::PoolError> for StoreError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        match err {
            deadpool_postgres::PoolError::Timeout(_) => {
                tracing::warn!("Database connection pool timeout: {}", err);
                StoreError::Connection("Database connection timeout".to_string())
            }
            deadpool_postgres::PoolError::Closed => {
                tracing::error!("Database connection pool is closed: {}", err);
                StoreError::Connection("Database connection pool is closed".to_string())
            }
            deadpool_postgres::PoolError::Backend(pg_err) => StoreError::from(pg_err),
            _ => {
                tracing::error!("Database connection pool error: {}", err);
                StoreError::Connection(err.to_string())
            }
        }
    }
}

// Result type alias for convenience
pub type ApiResult<T> = Result<T, ApiError>;
