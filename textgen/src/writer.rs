use schema::{LessonContent, content::ContentError, forms::GenerateLessonParams};
use thiserror::Error;

use crate::prompt::StudentContext;

#[derive(Debug, Error)]
pub enum TextGenError {
    #[error("Text provider API key is not configured")]
    NotConfigured,

    #[error("Text provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Text provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("Text provider returned an empty completion")]
    EmptyResponse,

    #[error("Text provider reply is not JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Text provider reply is not a usable lesson: {0}")]
    Content(#[from] ContentError),
}

/// Produces the lesson document for a validated request.
#[allow(async_fn_in_trait)]
pub trait LessonWriter {
    async fn write_lesson(
        &self,
        params: &GenerateLessonParams,
        student: Option<&StudentContext>,
    ) -> Result<LessonContent, TextGenError>;
}
