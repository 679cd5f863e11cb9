use schema::FieldErrors;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Not enough credits: {0}")]
    InsufficientCredits(String),

    #[error("A lesson is already being generated")]
    AlreadyPending,

    #[error("Not possible right now: {0}")]
    InvalidState(String),

    #[error("Server returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Could not reach the server: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    fields: Option<FieldErrors>,
}

impl ClientError {
    /// Interprets an error response of the API: `{ "error": msg }`, plus `fields` for
    /// validation failures.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<ErrorBody>(body).ok();
        let message = parsed
            .as_ref()
            .and_then(|body| body.error.clone())
            .unwrap_or_else(|| format!("HTTP {}", status));

        match (status, parsed.and_then(|body| body.fields)) {
            (400, Some(fields)) if !fields.is_empty() => ClientError::Validation(fields),
            (402, _) => ClientError::InsufficientCredits(message),
            _ => ClientError::Api { status, message },
        }
    }
}
