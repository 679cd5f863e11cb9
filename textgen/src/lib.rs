//! Lesson documents from an OpenAI-compatible chat completion endpoint.

pub mod openai;
pub mod prompt;
pub mod writer;

pub use openai::OpenAiWriter;
pub use prompt::{ChatMessage, StudentContext};
pub use writer::{LessonWriter, TextGenError};
