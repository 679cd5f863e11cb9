use common::error::{AppError, Res};
use schema::forms::StudentFields;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::student::Student;

pub async fn get_students_by_teacher<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    teacher_id: Uuid,
) -> Res<Vec<Student>> {
    sqlx::query_as::<_, Student>("SELECT * FROM students WHERE teacher_id = $1 ORDER BY name")
        .bind(teacher_id)
        .fetch_all(executor)
        .await
        .map_err(AppError::from)
}

pub async fn get_student<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    teacher_id: Uuid,
    student_id: Uuid,
) -> Res<Option<Student>> {
    sqlx::query_as::<_, Student>("SELECT * FROM students WHERE id = $1 AND teacher_id = $2")
        .bind(student_id)
        .bind(teacher_id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

pub async fn insert_student<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    teacher_id: Uuid,
    data: StudentFields,
) -> Res<Student> {
    sqlx::query_as::<_, Student>(
        r#"
        INSERT INTO students (teacher_id, name, email, cefr_level, native_language, notes)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(teacher_id)
    .bind(data.name)
    .bind(data.email)
    .bind(data.level)
    .bind(data.native_language)
    .bind(data.notes)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

pub async fn update_student<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    teacher_id: Uuid,
    student_id: Uuid,
    data: StudentFields,
) -> Res<Option<Student>> {
    sqlx::query_as::<_, Student>(
        r#"
        UPDATE students
        SET name = $3, email = $4, cefr_level = $5, native_language = $6, notes = $7,
            updated_at = NOW()
        WHERE id = $1 AND teacher_id = $2
        RETURNING *
        "#,
    )
    .bind(student_id)
    .bind(teacher_id)
    .bind(data.name)
    .bind(data.email)
    .bind(data.level)
    .bind(data.native_language)
    .bind(data.notes)
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}

/// Returns whether a row was removed. Lessons linked to the student stay and lose
/// the link through the foreign key.
pub async fn delete_student<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    teacher_id: Uuid,
    student_id: Uuid,
) -> Res<bool> {
    let result = sqlx::query("DELETE FROM students WHERE id = $1 AND teacher_id = $2")
        .bind(student_id)
        .bind(teacher_id)
        .execute(executor)
        .await
        .map_err(AppError::from)?;
    Ok(result.rows_affected() > 0)
}
