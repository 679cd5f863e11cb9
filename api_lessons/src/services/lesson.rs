use api_auth::services::user::ensure_user;
use common::{
    error::{AppError, Res},
    jwt::JwtClaims,
};
use db::{dtos::lesson::LessonFilter, models::lesson::Lesson};
use log::info;
use schema::{
    CefrLevel, FieldErrors, LessonCategory, LessonContent,
    forms::{SaveLessonForm, UpdateLessonForm},
    render,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::dtos::lesson::{DEFAULT_PAGE_SIZE, LessonQuery, MAX_PAGE_SIZE};

/// Turns list query parameters into a filter. Unknown levels and categories are
/// reported like any other invalid field.
pub fn filter_from_query(query: &LessonQuery) -> Res<LessonFilter> {
    let mut errors = FieldErrors::new();
    let level = query
        .level
        .as_deref()
        .and_then(|level| errors.parse::<CefrLevel>("level", level));
    let category = query
        .category
        .as_deref()
        .and_then(|category| errors.parse::<LessonCategory>("category", category));
    if query.offset.is_some_and(|offset| offset < 0) {
        errors.add("offset", "must not be negative");
    }
    errors.into_result()?;

    Ok(LessonFilter {
        student_id: query.student_id,
        level,
        category,
        limit: Some(query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)),
        offset: query.offset,
        ..Default::default()
    })
}

pub async fn list_own(pool: &PgPool, teacher_id: Uuid, query: &LessonQuery) -> Res<Vec<Lesson>> {
    let filter = LessonFilter {
        teacher_id: Some(teacher_id),
        ..filter_from_query(query)?
    };
    db::lesson::get_lessons(pool, filter).await
}

/// Lessons any teacher has shared, newest first.
pub async fn list_public(pool: &PgPool, query: &LessonQuery) -> Res<Vec<Lesson>> {
    let filter = LessonFilter {
        public_only: true,
        student_id: None,
        ..filter_from_query(query)?
    };
    db::lesson::get_lessons(pool, filter).await
}

/// A lesson is visible to its author, and to everyone once it is public. Hidden
/// lessons answer 404 so their existence is not revealed.
pub async fn get_visible(pool: &PgPool, teacher_id: Uuid, lesson_id: Uuid) -> Res<Lesson> {
    db::lesson::get_lesson_by_id(pool, lesson_id)
        .await?
        .filter(|lesson| lesson.teacher_id == teacher_id || lesson.is_public)
        .ok_or_else(|| not_found(lesson_id))
}

/// Provisions the teacher row first, like every other write that references it.
pub async fn save(
    pool: &PgPool,
    claims: &JwtClaims,
    initial_credits: i32,
    form: SaveLessonForm,
) -> Res<Lesson> {
    let lesson = form.validate()?;
    let teacher = ensure_user(pool, claims, initial_credits).await?;
    if let Some(student_id) = lesson.student_id {
        ensure_own_student(pool, teacher.id, student_id).await?;
    }
    let lesson = db::lesson::insert_lesson(pool, teacher.id, lesson).await?;
    info!("Teacher {} saved lesson {}", teacher.id, lesson.id);
    Ok(lesson)
}

pub async fn update(
    pool: &PgPool,
    teacher_id: Uuid,
    lesson_id: Uuid,
    form: UpdateLessonForm,
) -> Res<Lesson> {
    let changes = form.validate()?;
    if let Some(Some(student_id)) = changes.student_id {
        ensure_own_student(pool, teacher_id, student_id).await?;
    }
    db::lesson::update_lesson(pool, teacher_id, lesson_id, changes)
        .await?
        .ok_or_else(|| not_found(lesson_id))
}

pub async fn delete(pool: &PgPool, teacher_id: Uuid, lesson_id: Uuid) -> Res<()> {
    if !db::lesson::delete_lesson(pool, teacher_id, lesson_id).await? {
        return Err(not_found(lesson_id));
    }
    info!("Teacher {} deleted lesson {}", teacher_id, lesson_id);
    Ok(())
}

/// Renders a stored lesson as Markdown. Documents saved as free text have no
/// structure to render and are refused.
pub fn export_markdown(lesson: &Lesson) -> Res<String> {
    let mut content = LessonContent::from_storage(&lesson.content).map_err(|e| {
        AppError::BadRequest(format!("Lesson {} cannot be exported: {}", lesson.id, e))
    })?;
    if content.title.is_none() {
        content.title = Some(lesson.title.clone());
    }
    Ok(render::markdown(&content))
}

async fn ensure_own_student(pool: &PgPool, teacher_id: Uuid, student_id: Uuid) -> Res<()> {
    match db::student::get_student(pool, teacher_id, student_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::NotFound(format!("Student {} not found", student_id))),
    }
}

fn not_found(lesson_id: Uuid) -> AppError {
    AppError::NotFound(format!("Lesson {} not found", lesson_id))
}
