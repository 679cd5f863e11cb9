use schema::{CefrLevel, LessonCategory, SubscriptionTier};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub credits: i32,
    pub subscription_tier: SubscriptionTier,
    pub can_generate: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    #[serde(rename = "cefr_level")]
    pub level: CefrLevel,
    pub native_language: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonRecord {
    pub id: Uuid,
    pub student_id: Option<Uuid>,
    pub title: String,
    pub topic: String,
    pub level: CefrLevel,
    pub category: LessonCategory,
    pub is_public: bool,
    /// The lesson document, or a plain string for lessons saved as free text.
    pub content: Value,
}
