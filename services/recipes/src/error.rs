//! Custom error types for the recipe service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Custom error type for the recipe service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Payload failed validation
    #[error("{0}")]
    Validation(String),

    /// Path identifier cannot address a recipe
    #[error("Invalid recipe id: {0}")]
    MalformedId(String),

    /// Rejected image upload (type, size, count)
    #[error("{0}")]
    Upload(String),

    /// No recipe with the requested id
    #[error("Recipe not found")]
    NotFound,

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::MalformedId(_) | ApiError::Upload(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.to_string(),
        }));

        (self.status(), body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

/// Log a backend failure and hide its details from the caller
pub fn internal(context: &str) -> impl FnOnce(anyhow::Error) -> ApiError + '_ {
    move |e| {
        tracing::error!("{}: {:#}", context, e);
        ApiError::InternalServerError
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::MalformedId("abc".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::Upload("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::InternalServerError.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_hides_details() {
        let err = internal("Failed to load")(anyhow::anyhow!("connection refused on 10.0.0.3"));
        assert_eq!(err.to_string(), "Internal server error");
    }
}
