use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::models::ValidationError;
use crate::repository::UpdateError;
use crate::store::StoreError;

/// Everything a handler can fail with, and the status each maps to.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    InvalidQuery(String),

    #[error(transparent)]
    Body(#[from] JsonRejection),

    #[error(transparent)]
    Query(#[from] QueryRejection),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<UpdateError> for ApiError {
    fn from(err: UpdateError) -> Self {
        match err {
            UpdateError::Validation(e) => Self::Validation(e),
            UpdateError::Store(e) => Self::Store(e),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) | Self::InvalidQuery(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Body(rejection) => rejection.status(),
            Self::Query(rejection) => rejection.status(),
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            Self::Body(rejection) => rejection.body_text(),
            Self::Query(rejection) => rejection.body_text(),
            Self::Store(e) => {
                error!("Store failure: {}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_status_and_message() {
        let err = ApiError::NotFound("Root");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Root not found");
    }

    #[test]
    fn test_store_error_is_internal() {
        let err = ApiError::from(StoreError::UnknownCollection("verbs".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_invalid_query_is_unprocessable() {
        let err = ApiError::InvalidQuery("q must not be empty".to_string());
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
