use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::models::catalog::CatalogEntity;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let (status, error_message) = match self {
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Error::Database(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            Error::Csv(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Error::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            Error::Multipart(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An unexpected error occurred".to_string(),
            ),
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource not found".to_string()),
            other => Error::Database(other),
        }
    }
}

/// A data-quality problem confined to one input row.
///
/// Everything except [`RowError::Store`] is recoverable: the row is logged and
/// skipped. `Store` wraps a batch-level failure raised while handling the row
/// and is always re-raised by the caller.
#[derive(Debug, thiserror::Error)]
pub enum RowError {
    #[error("missing required field `{0}`")]
    MissingField(String),

    #[error("`{field}` is not an integer: {value:?}")]
    InvalidInteger { field: String, value: String },

    #[error("`{field}` is not a number: {value:?}")]
    InvalidAmount { field: String, value: String },

    #[error("`{field}` must not be negative: {value}")]
    NegativeAmount { field: String, value: String },

    #[error("`{field}` is too large: {value}")]
    AmountOutOfRange { field: String, value: String },

    #[error("invalid currency code {0:?}")]
    InvalidCurrencyCode(String),

    #[error("`{field}` is not a timestamp: {value:?}")]
    InvalidTimestamp { field: String, value: String },

    #[error("`{field}` is longer than {max} characters")]
    TooLong { field: String, max: usize },

    #[error("`{field}` contains a NUL character")]
    NulCharacter { field: String },

    #[error("{entity} {id} not found")]
    UnknownReference { entity: CatalogEntity, id: i64 },

    #[error("malformed record: {0}")]
    Malformed(String),

    #[error(transparent)]
    Store(#[from] Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn response_parts(err: Error) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn errors_map_to_status_and_message() {
        let (status, body) = response_parts(Error::BadRequest("missing file".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "missing file");

        let (status, body) = response_parts(Error::Config("DATABASE_URL".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "An unexpected error occurred");
    }

    #[test]
    fn store_failure_inside_a_row_keeps_its_message() {
        let err = RowError::from(Error::Internal("connection reset".into()));
        assert_eq!(err.to_string(), "Internal error: connection reset");
    }
}
