//! Typed access to the PlanWise API and the generate-then-save flow a teacher goes
//! through for each lesson.

pub mod api;
pub mod cycle;
pub mod error;
pub mod records;

pub use api::{LessonApi, PlanwiseClient};
pub use cycle::{CycleState, GenerationCycle, SaveOptions};
pub use error::ClientError;
