use common::error::{AppError, Res};
use schema::forms::{LessonChanges, NewLesson};
use sqlx::{Executor, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{dtos::lesson::LessonFilter, models::lesson::Lesson};

pub async fn get_lessons<'e, E>(executor: E, filter: LessonFilter) -> Res<Vec<Lesson>>
where
    E: Executor<'e, Database = Postgres>,
{
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM lessons");
    let mut conditions_added = false;

    // Helper to add WHERE or AND
    let mut add_condition_separator = |qb: &mut QueryBuilder<Postgres>| {
        if !conditions_added {
            qb.push(" WHERE ");
            conditions_added = true;
        } else {
            qb.push(" AND ");
        }
    };

    if let Some(teacher_id) = filter.teacher_id {
        add_condition_separator(&mut qb);
        qb.push("teacher_id = ").push_bind(teacher_id);
    }

    if filter.public_only {
        add_condition_separator(&mut qb);
        qb.push("is_public = TRUE");
    }

    if let Some(student_id) = filter.student_id {
        add_condition_separator(&mut qb);
        qb.push("student_id = ").push_bind(student_id);
    }

    if let Some(level) = filter.level {
        add_condition_separator(&mut qb);
        qb.push("cefr_level = ").push_bind(level);
    }

    if let Some(category) = filter.category {
        add_condition_separator(&mut qb);
        qb.push("category = ").push_bind(category);
    }

    qb.push(" ORDER BY created_at DESC");

    if let Some(limit) = filter.limit {
        qb.push(" LIMIT ").push_bind(limit);
    }

    if let Some(offset) = filter.offset {
        qb.push(" OFFSET ").push_bind(offset);
    }

    qb.build_query_as::<Lesson>()
        .fetch_all(executor)
        .await
        .map_err(AppError::from)
}

pub async fn get_lesson_by_id<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    lesson_id: Uuid,
) -> Res<Option<Lesson>> {
    sqlx::query_as::<_, Lesson>("SELECT * FROM lessons WHERE id = $1")
        .bind(lesson_id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

pub async fn insert_lesson<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    teacher_id: Uuid,
    data: NewLesson,
) -> Res<Lesson> {
    sqlx::query_as::<_, Lesson>(
        r#"
        INSERT INTO lessons (teacher_id, student_id, title, topic, cefr_level, category, is_public, content)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(teacher_id)
    .bind(data.student_id)
    .bind(data.title)
    .bind(data.topic)
    .bind(data.level)
    .bind(data.category)
    .bind(data.is_public)
    .bind(data.content)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

pub async fn update_lesson<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    teacher_id: Uuid,
    lesson_id: Uuid,
    changes: LessonChanges,
) -> Res<Option<Lesson>> {
    sqlx::query_as::<_, Lesson>(
        r#"
        UPDATE lessons
        SET title = COALESCE($3, title),
            topic = COALESCE($4, topic),
            cefr_level = COALESCE($5, cefr_level),
            category = COALESCE($6, category),
            student_id = CASE WHEN $7 THEN $8 ELSE student_id END,
            is_public = COALESCE($9, is_public),
            content = COALESCE($10, content),
            updated_at = NOW()
        WHERE id = $1 AND teacher_id = $2
        RETURNING *
        "#,
    )
    .bind(lesson_id)
    .bind(teacher_id)
    .bind(changes.title)
    .bind(changes.topic)
    .bind(changes.level)
    .bind(changes.category)
    .bind(changes.student_id.is_some())
    .bind(changes.student_id.flatten())
    .bind(changes.is_public)
    .bind(changes.content)
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}

pub async fn delete_lesson<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    teacher_id: Uuid,
    lesson_id: Uuid,
) -> Res<bool> {
    let result = sqlx::query("DELETE FROM lessons WHERE id = $1 AND teacher_id = $2")
        .bind(lesson_id)
        .bind(teacher_id)
        .execute(executor)
        .await
        .map_err(AppError::from)?;
    Ok(result.rows_affected() > 0)
}
