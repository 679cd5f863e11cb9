use chrono::NaiveDateTime;
use db::models::lesson::Lesson;
use schema::{CefrLevel, LessonCategory, storage};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct LessonQuery {
    pub student_id: Option<Uuid>,
    pub level: Option<String>,
    pub category: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// A stored lesson with its document decoded back to JSON. Documents that were saved
/// as plain text come back as a JSON string.
#[derive(Debug, Serialize)]
pub struct LessonResponse {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub student_id: Option<Uuid>,
    pub title: String,
    pub topic: String,
    pub level: CefrLevel,
    pub category: LessonCategory,
    pub is_public: bool,
    pub content: Value,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<Lesson> for LessonResponse {
    fn from(lesson: Lesson) -> Self {
        LessonResponse {
            content: storage::from_storage_string(&lesson.content),
            id: lesson.id,
            teacher_id: lesson.teacher_id,
            student_id: lesson.student_id,
            title: lesson.title,
            topic: lesson.topic,
            level: lesson.cefr_level,
            category: lesson.category,
            is_public: lesson.is_public,
            created_at: lesson.created_at,
            updated_at: lesson.updated_at,
        }
    }
}
