use std::sync::Arc;

use actix_web::{HttpResponse, Responder, delete, get, http::header, post, put, web};
use common::{
    env_config::Config,
    error::Res,
    http::{ConfirmQuery, Success},
    jwt::JwtClaims,
};
use schema::forms::{GenerateLessonForm, SaveLessonForm, UpdateLessonForm};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    dtos::lesson::{LessonQuery, LessonResponse},
    services::{self, generation::LessonServices},
};

/// Generates a lesson with the text provider and, optionally, pictures for its
/// illustrations. Costs one credit, charged only when the lesson is produced.
///
/// The lesson is not stored; the client shows it and saves it with `POST /lessons`
/// if the teacher keeps it.
///
/// # Input
/// - `form`: `{ topic, level, category, student_id?, focus?, include_images? }`
///
/// # Output
/// - Success: `{ content, credits_remaining }`
/// - Error: 400 for invalid fields, 402 without credits, 404 for a foreign
///   `student_id`, 502 when the text provider fails
#[post("/generate")]
pub async fn post_generate(
    claims: web::ReqData<JwtClaims>,
    pool: web::Data<Arc<PgPool>>,
    config: web::Data<Arc<Config>>,
    lesson_services: web::Data<Arc<LessonServices>>,
    form: web::Json<GenerateLessonForm>,
) -> Res<impl Responder> {
    let generated = services::generation::generate_lesson(
        &pool,
        &lesson_services,
        &config,
        &claims,
        form.into_inner(),
    )
    .await?;
    Success::ok(generated)
}

/// Saves a lesson to the teacher's library. `content` may be the structured document
/// or its string form; it is stored as a string either way.
#[post("")]
pub async fn post_lesson(
    claims: web::ReqData<JwtClaims>,
    pool: web::Data<Arc<PgPool>>,
    config: web::Data<Arc<Config>>,
    form: web::Json<SaveLessonForm>,
) -> Res<impl Responder> {
    let lesson =
        services::lesson::save(&pool, &claims, config.initial_credits, form.into_inner()).await?;
    Success::created(LessonResponse::from(lesson))
}

/// Lists the teacher's own lessons, newest first.
/// Filters: `student_id`, `level`, `category`, `limit`, `offset`.
#[get("")]
pub async fn get_lessons(
    claims: web::ReqData<JwtClaims>,
    pool: web::Data<Arc<PgPool>>,
    query: web::Query<LessonQuery>,
) -> Res<impl Responder> {
    let lessons = services::lesson::list_own(&pool, claims.user_id, &query).await?;
    Success::ok(lessons.into_iter().map(LessonResponse::from).collect::<Vec<_>>())
}

/// Lessons shared by all teachers. Takes the same filters as the own-library list,
/// except `student_id`.
#[get("/public")]
pub async fn get_public_lessons(
    pool: web::Data<Arc<PgPool>>,
    query: web::Query<LessonQuery>,
) -> Res<impl Responder> {
    let lessons = services::lesson::list_public(&pool, &query).await?;
    Success::ok(lessons.into_iter().map(LessonResponse::from).collect::<Vec<_>>())
}

#[get("/{id}")]
pub async fn get_lesson(
    claims: web::ReqData<JwtClaims>,
    pool: web::Data<Arc<PgPool>>,
    path: web::Path<Uuid>,
) -> Res<impl Responder> {
    let lesson = services::lesson::get_visible(&pool, claims.user_id, path.into_inner()).await?;
    Success::ok(LessonResponse::from(lesson))
}

/// Downloads the lesson as a Markdown file.
#[get("/{id}/export")]
pub async fn get_lesson_export(
    claims: web::ReqData<JwtClaims>,
    pool: web::Data<Arc<PgPool>>,
    path: web::Path<Uuid>,
) -> Res<HttpResponse> {
    let lesson = services::lesson::get_visible(&pool, claims.user_id, path.into_inner()).await?;
    let markdown = services::lesson::export_markdown(&lesson)?;
    Ok(HttpResponse::Ok()
        .content_type("text/markdown; charset=utf-8")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"lesson-{}.md\"", lesson.id),
        ))
        .body(markdown))
}

/// Partial update; fields left out keep their stored value.
#[put("/{id}")]
pub async fn put_lesson(
    claims: web::ReqData<JwtClaims>,
    pool: web::Data<Arc<PgPool>>,
    path: web::Path<Uuid>,
    form: web::Json<UpdateLessonForm>,
) -> Res<impl Responder> {
    let lesson =
        services::lesson::update(&pool, claims.user_id, path.into_inner(), form.into_inner())
            .await?;
    Success::ok(LessonResponse::from(lesson))
}

/// Deletes a lesson for good. Requires `?confirm=true`.
#[delete("/{id}")]
pub async fn delete_lesson(
    claims: web::ReqData<JwtClaims>,
    pool: web::Data<Arc<PgPool>>,
    path: web::Path<Uuid>,
    query: web::Query<ConfirmQuery>,
) -> Res<impl Responder> {
    query.require("lesson")?;
    services::lesson::delete(&pool, claims.user_id, path.into_inner()).await?;
    Success::no_content()
}
