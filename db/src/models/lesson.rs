use chrono::NaiveDateTime;
use schema::{CefrLevel, LessonCategory};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Lesson {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub student_id: Option<Uuid>,
    pub title: String,
    pub topic: String,
    pub cefr_level: CefrLevel,
    pub category: LessonCategory,
    pub is_public: bool,
    /// Storage form of the lesson document, see `schema::storage`.
    pub content: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
