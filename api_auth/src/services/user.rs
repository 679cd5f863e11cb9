use common::{error::Res, jwt::JwtClaims};
use db::{dtos::user::UserProvisionRequest, models::user::User};
use log::info;
use sqlx::PgPool;

/// Loads the teacher behind `claims`, creating the row on first contact.
///
/// Sign-up happens at the identity provider, so the first authenticated request is
/// the first time this service hears about a teacher. New rows start with
/// `initial_credits`; existing rows keep their balance.
pub async fn ensure_user(pool: &PgPool, claims: &JwtClaims, initial_credits: i32) -> Res<User> {
    if let Some(user) = db::user::get_user_by_id(pool, claims.user_id).await? {
        return Ok(user);
    }

    let user = db::user::provision_user(
        pool,
        UserProvisionRequest {
            id: claims.user_id,
            email: claims.email.clone(),
            display_name: claims.name.clone(),
            initial_credits,
        },
    )
    .await?;
    info!(
        "Provisioned teacher {} with {} credits",
        user.id, user.credits
    );
    Ok(user)
}
