use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

/// Field messages in the order the server reported them.
pub type FieldErrors = IndexMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum BlogClientError {
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },
    #[error(transparent)]
    RequestError(#[from] gloo_net::Error),
    #[error("{0}")]
    NotFound(String),
    #[error("Please log in to continue")]
    Unauthorized,
    #[error("{message}")]
    Validation { message: String, errors: FieldErrors },
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: FieldErrors,
}

impl BlogClientError {
    pub fn from_parts(status: u16, body: &str) -> Self {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
        let message = if parsed.message.is_empty() {
            format!("unexpected response ({status})")
        } else {
            parsed.message
        };

        match status {
            401 => BlogClientError::Unauthorized,
            404 => BlogClientError::NotFound(message),
            422 => BlogClientError::Validation {
                message,
                errors: parsed.errors,
            },
            _ => BlogClientError::Http { status, message },
        }
    }

    /// Per-field messages of a validation failure, empty otherwise.
    pub fn field_errors(&self) -> FieldErrors {
        match self {
            BlogClientError::Validation { errors, .. } => errors.clone(),
            _ => FieldErrors::new(),
        }
    }
}
