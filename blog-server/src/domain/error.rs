use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::domain::post::PostId;
use crate::domain::user::UserId;
use crate::domain::validation::ValidationErrors;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0}")]
    Validation(ValidationErrors),
    #[error("post not found: {0}")]
    PostNotFound(PostId),
    #[error("user not found: {0}")]
    UserNotFound(UserId),
    #[error("user already exists: {0}")]
    UserAlreadyExists(String),
    #[error("unauthenticated")]
    Unauthenticated,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ValidationErrors> for DomainError {
    fn from(errors: ValidationErrors) -> Self {
        DomainError::Validation(errors)
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::Internal(format!("database error: {}", err))
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a ValidationErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resource: Option<serde_json::Value>,
}

impl ResponseError for DomainError {
    fn status_code(&self) -> StatusCode {
        match self {
            DomainError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DomainError::PostNotFound(_) | DomainError::UserNotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Unauthenticated => StatusCode::UNAUTHORIZED,
            DomainError::BadRequest(_) => StatusCode::BAD_REQUEST,
            // Registration reports a taken email as a 422 before this is reached.
            DomainError::UserAlreadyExists(_) | DomainError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            DomainError::Validation(errors) => ErrorBody {
                message: errors.summary(),
                errors: Some(errors),
                resource: None,
            },
            DomainError::PostNotFound(id) => ErrorBody {
                message: "Post not found".to_string(),
                errors: None,
                resource: Some(serde_json::json!({ "post": id })),
            },
            DomainError::UserNotFound(id) => ErrorBody {
                message: "User not found".to_string(),
                errors: None,
                resource: Some(serde_json::json!({ "user": id })),
            },
            DomainError::Unauthenticated => ErrorBody {
                message: "Unauthenticated.".to_string(),
                errors: None,
                resource: None,
            },
            DomainError::BadRequest(msg) => ErrorBody {
                message: msg.clone(),
                errors: None,
                resource: None,
            },
            DomainError::UserAlreadyExists(_) | DomainError::Internal(_) => {
                error!(error = %self, "request failed");
                ErrorBody {
                    message: "Server Error".to_string(),
                    errors: None,
                    resource: None,
                }
            }
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn validation_error_body_lists_fields() {
        let mut errors = ValidationErrors::new();
        errors.add("title", "The title field is required.");
        errors.add("author", "The author field is required.");
        let response = DomainError::from(errors).error_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let bytes = to_bytes(response.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "The title field is required. (and 1 more error)");
        assert_eq!(body["errors"]["author"][0], "The author field is required.");
    }

    #[actix_web::test]
    async fn internal_error_hides_details() {
        let response = DomainError::Internal("connection refused".into()).error_response();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Server Error");
    }

    #[actix_web::test]
    async fn unmapped_duplicate_user_is_a_server_error() {
        let response = DomainError::UserAlreadyExists("taro@example.com".into()).error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = to_bytes(response.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Server Error");
    }
}
