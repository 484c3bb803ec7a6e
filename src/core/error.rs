use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::features::contributors::relations::RelationError;
use crate::shared::types::ApiResponse;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

impl From<RelationError> for AppError {
    fn from(err: RelationError) -> Self {
        match err {
            // Services load every entity they touch, so a miss here means a
            // dangling reference in storage rather than bad input.
            RelationError::UnknownContributor(_) | RelationError::UnknownOpenDate(_) => {
                AppError::NotFound(err.to_string())
            }
            RelationError::NotATroupe(_) | RelationError::NotATeam(_) => {
                AppError::BadRequest(err.to_string())
            }
        }
    }
}

impl AppError {
    fn status_message_errors(&self) -> (StatusCode, String, Option<Vec<String>>) {
        match self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                    None,
                )
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                msg.clone(),
                Some(vec![msg.clone()]),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone(), None),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, errors) = self.status_message_errors();

        let body = Json(ApiResponse::<()>::error(Some(message), errors));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_relation_errors_map_to_http_statuses() {
        let id = Uuid::new_v4();

        let missing: AppError = RelationError::UnknownOpenDate(id).into();
        assert_eq!(missing.status_message_errors().0, StatusCode::NOT_FOUND);

        let wrong_kind: AppError = RelationError::NotATroupe(id).into();
        assert_eq!(wrong_kind.status_message_errors().0, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_error_hides_details() {
        let (status, message, _) =
            AppError::Internal("pool exhausted".to_string()).status_message_errors();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Internal server error");
    }

    #[test]
    fn test_validation_error_lists_message() {
        let (status, _, errors) =
            AppError::Validation("name: too long".to_string()).status_message_errors();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(errors, Some(vec!["name: too long".to_string()]));
    }
}
