use std::sync::Arc;

use actix_web::{Responder, get, web};
use common::{env_config::Config, error::Res, http::Success, jwt::JwtClaims};
use sqlx::PgPool;

use crate::{dtos::user::UserProfile, services};

/// Endpoint to retrieve the current teacher's profile and credit balance.
///
/// The teacher row is created on the first call with the configured starting
/// credits, so a client can call this right after sign-in.
///
/// # Input
/// - `claims`: The JWT claims extracted from the bearer token
/// - `pool`: A database connection pool
/// - `config`: Application configuration, for the starting credit balance
///
/// # Output
/// - Success: the teacher's profile, including `credits`, `subscription_tier` and
///   `can_generate`
/// - Error: 401 Unauthorized when no valid token is provided
#[get("")]
pub async fn get_me(
    claims: web::ReqData<JwtClaims>,
    pool: web::Data<Arc<PgPool>>,
    config: web::Data<Arc<Config>>,
) -> Res<impl Responder> {
    let user = services::user::ensure_user(&pool, &claims, config.initial_credits).await?;
    Success::ok(UserProfile::from(user))
}
