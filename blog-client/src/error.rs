use indexmap::IndexMap;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Field messages in the order the server reported them.
pub type FieldErrors = IndexMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum BlogClientError {
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        errors: FieldErrors,
    },
    #[error("HTTP {status}: {message}")]
    Http { status: StatusCode, message: String },
    #[error("Session file error: {0}")]
    SessionIo(#[from] std::io::Error),
    #[error("Session data error: {0}")]
    SessionData(#[from] serde_json::Error),
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: FieldErrors,
}

impl BlogClientError {
    pub(crate) async fn from_http_response(resp: reqwest::Response) -> Self {
        let status = resp.status();
        match resp.text().await {
            Ok(body) => Self::from_parts(status, &body),
            Err(err) => err.into(),
        }
    }

    fn from_parts(status: StatusCode, body: &str) -> Self {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
        let message = if parsed.message.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("Unexpected response")
                .to_string()
        } else {
            parsed.message
        };

        match status {
            StatusCode::UNAUTHORIZED => BlogClientError::Unauthorized,
            StatusCode::NOT_FOUND => BlogClientError::NotFound(message),
            StatusCode::UNPROCESSABLE_ENTITY => BlogClientError::Validation {
                message,
                errors: parsed.errors,
            },
            _ => BlogClientError::Http { status, message },
        }
    }

    /// Every validation message as `field: message`, in the order the server sent them.
    pub fn field_messages(&self) -> Vec<String> {
        match self {
            BlogClientError::Validation { errors, .. } => errors
                .iter()
                .flat_map(|(field, messages)| messages.iter().map(move |m| format!("{field}: {m}")))
                .collect(),
            _ => Vec::new(),
        }
    }
}
