use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{dtos::user::UserProvisionRequest, models::user::User};

pub async fn get_user_by_id<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
) -> Res<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

/// Inserts the teacher on first contact; later calls only refresh contact details
/// and never touch the credit balance.
pub async fn provision_user<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: UserProvisionRequest,
) -> Res<User> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, email, display_name, credits)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (id) DO UPDATE SET
            email = COALESCE(EXCLUDED.email, users.email),
            display_name = COALESCE(EXCLUDED.display_name, users.display_name)
        RETURNING *
        "#,
    )
    .bind(data.id)
    .bind(data.email)
    .bind(data.display_name)
    .bind(data.initial_credits.max(0))
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

/// Takes one credit. Returns the remaining balance, or `None` when the balance was
/// already empty; the row is never driven below zero.
pub async fn consume_credit<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
) -> Res<Option<i32>> {
    sqlx::query_scalar::<_, i32>(
        r#"
        UPDATE users
        SET credits = credits - 1, updated_at = NOW()
        WHERE id = $1 AND credits >= 1
        RETURNING credits
        "#,
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}
