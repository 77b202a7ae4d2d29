use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
///
/// Every failure in the recommendation pipeline propagates unchanged to the
/// caller; nothing here is recovered locally.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Ambiguous name '{name}': {matches} catalog entries share it")]
    AmbiguousName { name: String, matches: usize },

    #[error("Insufficient candidates: requested {requested}, only {available} available")]
    InsufficientCandidates { requested: usize, available: usize },

    #[error("Metadata fetch failed: {0}")]
    Fetch(String),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// True for failures of the remote metadata fetch, transport or parse
    pub fn is_fetch_error(&self) -> bool {
        matches!(self, AppError::Fetch(_) | AppError::HttpClient(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AmbiguousName { .. } => StatusCode::CONFLICT,
            AppError::InsufficientCandidates { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Fetch(_) | AppError::HttpClient(_) => StatusCode::BAD_GATEWAY,
            AppError::Cache(_)
            | AppError::Csv(_)
            | AppError::Io(_)
            | AppError::InvalidData(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match self {
            AppError::NotFound(msg) | AppError::InvalidInput(msg) | AppError::Fetch(msg) => msg,
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = vec![
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (
                AppError::AmbiguousName {
                    name: "x".into(),
                    matches: 2,
                },
                StatusCode::CONFLICT,
            ),
            (
                AppError::InsufficientCandidates {
                    requested: 5,
                    available: 4,
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (AppError::Fetch("x".into()), StatusCode::BAD_GATEWAY),
            (AppError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (AppError::InvalidData("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_insufficient_candidates_message() {
        let error = AppError::InsufficientCandidates {
            requested: 5,
            available: 4,
        };
        assert_eq!(
            error.to_string(),
            "Insufficient candidates: requested 5, only 4 available"
        );
    }

    #[test]
    fn test_is_fetch_error() {
        assert!(AppError::Fetch("status 500".into()).is_fetch_error());
        assert!(!AppError::NotFound("x".into()).is_fetch_error());
    }
}
