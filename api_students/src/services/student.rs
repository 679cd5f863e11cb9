use api_auth::services::user::ensure_user;
use common::{
    error::{AppError, Res},
    jwt::JwtClaims,
};
use db::models::student::Student;
use log::info;
use schema::forms::StudentForm;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn list(pool: &PgPool, teacher_id: Uuid) -> Res<Vec<Student>> {
    db::student::get_students_by_teacher(pool, teacher_id).await
}

/// Another teacher's student is reported the same as a missing one.
pub async fn get(pool: &PgPool, teacher_id: Uuid, student_id: Uuid) -> Res<Student> {
    db::student::get_student(pool, teacher_id, student_id)
        .await?
        .ok_or_else(|| not_found(student_id))
}

/// The teacher row is provisioned first, so a roster can be started before any
/// other request has been made.
pub async fn create(
    pool: &PgPool,
    claims: &JwtClaims,
    initial_credits: i32,
    form: StudentForm,
) -> Res<Student> {
    let fields = form.validate()?;
    let teacher = ensure_user(pool, claims, initial_credits).await?;
    let student = db::student::insert_student(pool, teacher.id, fields).await?;
    info!("Teacher {} added student {}", teacher.id, student.id);
    Ok(student)
}

pub async fn update(
    pool: &PgPool,
    teacher_id: Uuid,
    student_id: Uuid,
    form: StudentForm,
) -> Res<Student> {
    let fields = form.validate()?;
    db::student::update_student(pool, teacher_id, student_id, fields)
        .await?
        .ok_or_else(|| not_found(student_id))
}

/// Removes the student in one statement. Their lessons are kept and unlinked.
pub async fn delete(pool: &PgPool, teacher_id: Uuid, student_id: Uuid) -> Res<()> {
    if !db::student::delete_student(pool, teacher_id, student_id).await? {
        return Err(not_found(student_id));
    }
    info!("Teacher {} deleted student {}", teacher_id, student_id);
    Ok(())
}

fn not_found(student_id: Uuid) -> AppError {
    AppError::NotFound(format!("Student {} not found", student_id))
}
