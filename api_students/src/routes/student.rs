use std::sync::Arc;

use actix_web::{Responder, delete, get, post, put, web};
use common::{
    env_config::Config,
    error::Res,
    http::{ConfirmQuery, Success},
    jwt::JwtClaims,
};
use schema::forms::StudentForm;
use sqlx::PgPool;
use uuid::Uuid;

use crate::services;

/// Lists the teacher's students, ordered by name.
#[get("")]
pub async fn get_students(
    claims: web::ReqData<JwtClaims>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    let students = services::student::list(&pool, claims.user_id).await?;
    Success::ok(students)
}

/// Adds a student to the roster.
///
/// # Input
/// - `form`: `{ name, email?, level, native_language?, notes? }`
///
/// # Output
/// - Success: the created student with 201 Created
/// - Error: 400 with a `fields` map when validation fails
#[post("")]
pub async fn post_student(
    claims: web::ReqData<JwtClaims>,
    pool: web::Data<Arc<PgPool>>,
    config: web::Data<Arc<Config>>,
    form: web::Json<StudentForm>,
) -> Res<impl Responder> {
    let student = services::student::create(
        &pool,
        &claims,
        config.initial_credits,
        form.into_inner(),
    )
    .await?;
    Success::created(student)
}

#[get("/{id}")]
pub async fn get_student(
    claims: web::ReqData<JwtClaims>,
    pool: web::Data<Arc<PgPool>>,
    path: web::Path<Uuid>,
) -> Res<impl Responder> {
    let student = services::student::get(&pool, claims.user_id, path.into_inner()).await?;
    Success::ok(student)
}

/// Replaces the student's details with the submitted form.
#[put("/{id}")]
pub async fn put_student(
    claims: web::ReqData<JwtClaims>,
    pool: web::Data<Arc<PgPool>>,
    path: web::Path<Uuid>,
    form: web::Json<StudentForm>,
) -> Res<impl Responder> {
    let student =
        services::student::update(&pool, claims.user_id, path.into_inner(), form.into_inner())
            .await?;
    Success::ok(student)
}

/// Deletes a student for good.
///
/// The request must carry `?confirm=true`; without it nothing is touched and the
/// response is 400. Lessons written for the student stay in the library.
#[delete("/{id}")]
pub async fn delete_student(
    claims: web::ReqData<JwtClaims>,
    pool: web::Data<Arc<PgPool>>,
    path: web::Path<Uuid>,
    query: web::Query<ConfirmQuery>,
) -> Res<impl Responder> {
    query.require("student")?;
    services::student::delete(&pool, claims.user_id, path.into_inner()).await?;
    Success::no_content()
}
