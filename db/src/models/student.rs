use chrono::NaiveDateTime;
use schema::CefrLevel;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Student {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub cefr_level: CefrLevel,
    pub native_language: Option<String>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
