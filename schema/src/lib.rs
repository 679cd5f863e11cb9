//! Shapes shared by the server and the client: the AI-generated lesson document,
//! the enums stored alongside it, and the validated forms that create lessons and
//! students.

pub mod content;
pub mod forms;
pub mod level;
pub mod render;
pub mod storage;
pub mod validation;

pub use content::{Example, LessonContent};
pub use level::{CefrLevel, LessonCategory, SubscriptionTier};
pub use validation::{FieldErrors, ValidationError};
