use schema::{CefrLevel, LessonCategory};
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct LessonFilter {
    pub teacher_id: Option<Uuid>,
    pub public_only: bool,
    pub student_id: Option<Uuid>,
    pub level: Option<CefrLevel>,
    pub category: Option<LessonCategory>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
