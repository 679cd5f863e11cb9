use chrono::NaiveDateTime;
use db::models::user::User;
use schema::SubscriptionTier;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a teacher sees about their own account. Billing identifiers stay server-side.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub credits: i32,
    pub subscription_tier: SubscriptionTier,
    pub can_generate: bool,
    pub created_at: NaiveDateTime,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        UserProfile {
            can_generate: user.can_generate(),
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            credits: user.credits,
            subscription_tier: user.subscription_tier,
            created_at: user.created_at,
        }
    }
}
