//! Form payloads as submitted, and the typed values they validate into.
//!
//! Forms carry raw strings so a bad level or category comes back as a field
//! message rather than a body deserialization failure.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    content::LessonContent,
    level::{CefrLevel, LessonCategory},
    storage,
    validation::{FieldErrors, ValidationError},
};

pub const TOPIC_MAX: usize = 200;
pub const TITLE_MAX: usize = 200;
pub const FOCUS_MAX: usize = 500;
pub const NAME_MAX: usize = 100;
pub const EMAIL_MAX: usize = 254;
pub const LANGUAGE_MAX: usize = 60;
pub const NOTES_MAX: usize = 2000;

fn default_true() -> bool {
    true
}

/// Keeps an explicit `null` apart from an absent field: absent is `None`, `null` is
/// `Some(None)`.
fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateLessonForm {
    pub topic: String,
    pub level: String,
    pub category: String,
    #[serde(default)]
    pub student_id: Option<Uuid>,
    /// Extra instructions for the provider, e.g. a grammar point to stress.
    #[serde(default)]
    pub focus: Option<String>,
    #[serde(default = "default_true")]
    pub include_images: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateLessonParams {
    pub topic: String,
    pub level: CefrLevel,
    pub category: LessonCategory,
    pub student_id: Option<Uuid>,
    pub focus: Option<String>,
    pub include_images: bool,
}

impl GenerateLessonForm {
    pub fn validate(&self) -> Result<GenerateLessonParams, ValidationError> {
        let mut errors = FieldErrors::new();
        let topic = errors.required_text("topic", &self.topic, TOPIC_MAX);
        let level = errors.parse::<CefrLevel>("level", &self.level);
        let category = errors.parse::<LessonCategory>("category", &self.category);
        let focus = errors.optional_text("focus", self.focus.as_deref(), FOCUS_MAX);

        match (level, category) {
            (Some(level), Some(category)) if errors.is_empty() => Ok(GenerateLessonParams {
                topic,
                level,
                category,
                student_id: self.student_id,
                focus,
                include_images: self.include_images,
            }),
            _ => Err(ValidationError(errors)),
        }
    }
}

/// What the generate endpoint hands back: the document plus the balance left after
/// paying for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedLesson {
    pub content: Value,
    pub credits_remaining: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveLessonForm {
    #[serde(default)]
    pub title: Option<String>,
    pub topic: String,
    pub level: String,
    pub category: String,
    #[serde(default)]
    pub student_id: Option<Uuid>,
    #[serde(default)]
    pub is_public: bool,
    /// Either the structured document or its already-serialized string form.
    pub content: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewLesson {
    pub title: String,
    pub topic: String,
    pub level: CefrLevel,
    pub category: LessonCategory,
    pub student_id: Option<Uuid>,
    pub is_public: bool,
    /// Storage form, ready for the text column.
    pub content: String,
}

impl SaveLessonForm {
    pub fn validate(&self) -> Result<NewLesson, ValidationError> {
        let mut errors = FieldErrors::new();
        let topic = errors.required_text("topic", &self.topic, TOPIC_MAX);
        let level = errors.parse::<CefrLevel>("level", &self.level);
        let category = errors.parse::<LessonCategory>("category", &self.category);
        let title = errors.optional_text("title", self.title.as_deref(), TITLE_MAX);
        let content_title = check_content(&mut errors, &self.content);

        match (level, category) {
            (Some(level), Some(category)) if errors.is_empty() => Ok(NewLesson {
                title: title.or(content_title).unwrap_or_else(|| topic.clone()),
                topic,
                level,
                category,
                student_id: self.student_id,
                is_public: self.is_public,
                content: storage::to_storage_string(self.content.clone()),
            }),
            _ => Err(ValidationError(errors)),
        }
    }
}

/// Structured documents are checked against the lesson schema; the string form is
/// taken as already stored. Returns the document's own title if it has one.
fn check_content(errors: &mut FieldErrors, content: &Value) -> Option<String> {
    match content {
        Value::String(text) if text.trim().is_empty() => {
            errors.add("content", "is required");
            None
        }
        Value::String(_) => None,
        Value::Object(_) => match LessonContent::from_value(content.clone()) {
            Ok(lesson) => lesson.title,
            Err(e) => {
                errors.add("content", e.to_string());
                None
            }
        },
        Value::Null => {
            errors.add("content", "is required");
            None
        }
        _ => {
            errors.add("content", "must be a lesson document");
            None
        }
    }
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateLessonForm {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Absent keeps the link, a student id relinks, `null` unlinks the lesson.
    #[serde(
        default,
        deserialize_with = "explicit_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub student_id: Option<Option<Uuid>>,
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default)]
    pub content: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LessonChanges {
    pub title: Option<String>,
    pub topic: Option<String>,
    pub level: Option<CefrLevel>,
    pub category: Option<LessonCategory>,
    /// `Some(None)` clears the link.
    pub student_id: Option<Option<Uuid>>,
    pub is_public: Option<bool>,
    pub content: Option<String>,
}

impl UpdateLessonForm {
    pub fn validate(&self) -> Result<LessonChanges, ValidationError> {
        let mut errors = FieldErrors::new();
        let title = self
            .title
            .as_deref()
            .map(|t| errors.required_text("title", t, TITLE_MAX));
        let topic = self
            .topic
            .as_deref()
            .map(|t| errors.required_text("topic", t, TOPIC_MAX));
        let level = self
            .level
            .as_deref()
            .and_then(|l| errors.parse::<CefrLevel>("level", l));
        let category = self
            .category
            .as_deref()
            .and_then(|c| errors.parse::<LessonCategory>("category", c));
        if let Some(content) = &self.content {
            check_content(&mut errors, content);
        }

        errors.into_result()?;
        Ok(LessonChanges {
            title,
            topic,
            level,
            category,
            student_id: self.student_id,
            is_public: self.is_public,
            content: self.content.clone().map(storage::to_storage_string),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentForm {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub level: String,
    #[serde(default)]
    pub native_language: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudentFields {
    pub name: String,
    pub email: Option<String>,
    pub level: CefrLevel,
    pub native_language: Option<String>,
    pub notes: Option<String>,
}

impl StudentForm {
    pub fn validate(&self) -> Result<StudentFields, ValidationError> {
        let mut errors = FieldErrors::new();
        let name = errors.required_text("name", &self.name, NAME_MAX);
        let email = errors.optional_text("email", self.email.as_deref(), EMAIL_MAX);
        if let Some(email) = &email {
            let looks_valid = email
                .split_once('@')
                .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
            if !looks_valid {
                errors.add("email", "must be a valid email address");
            }
        }
        let level = errors.parse::<CefrLevel>("level", &self.level);
        let native_language =
            errors.optional_text("native_language", self.native_language.as_deref(), LANGUAGE_MAX);
        let notes = errors.optional_text("notes", self.notes.as_deref(), NOTES_MAX);

        match level {
            Some(level) if errors.is_empty() => Ok(StudentFields {
                name,
                email,
                level,
                native_language,
                notes,
            }),
            _ => Err(ValidationError(errors)),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn generate_form() -> GenerateLessonForm {
        GenerateLessonForm {
            topic: "  Travel plans ".to_string(),
            level: "b1".to_string(),
            category: "conversation".to_string(),
            student_id: None,
            focus: Some("".to_string()),
            include_images: true,
        }
    }

    #[test]
    fn test_generate_form_validates_into_params() {
        let params = generate_form().validate().unwrap();
        assert_eq!(params.topic, "Travel plans");
        assert_eq!(params.level, CefrLevel::B1);
        assert_eq!(params.category, LessonCategory::Conversation);
        assert_eq!(params.focus, None);
    }

    #[test]
    fn test_generate_form_reports_every_bad_field() {
        let form = GenerateLessonForm {
            topic: "   ".to_string(),
            level: "Z9".to_string(),
            category: "cooking".to_string(),
            focus: Some("x".repeat(FOCUS_MAX + 1)),
            ..generate_form()
        };
        let ValidationError(errors) = form.validate().unwrap_err();
        assert_eq!(errors.get("topic"), Some("is required"));
        assert!(errors.get("level").is_some());
        assert!(errors.get("category").is_some());
        assert!(errors.get("focus").is_some());
    }

    #[test]
    fn test_include_images_defaults_on() {
        let form: GenerateLessonForm = serde_json::from_value(json!({
            "topic": "Food", "level": "A1", "category": "vocabulary"
        }))
        .unwrap();
        assert!(form.include_images);
    }

    fn save_form(content: Value) -> SaveLessonForm {
        SaveLessonForm {
            title: None,
            topic: "Food".to_string(),
            level: "A2".to_string(),
            category: "vocabulary".to_string(),
            student_id: None,
            is_public: false,
            content,
        }
    }

    #[test]
    fn test_save_serializes_structured_content() {
        let lesson = save_form(json!({
            "title": "At the market",
            "pattern": "How much is ___?",
            "examples": ["How much is this?"]
        }))
        .validate()
        .unwrap();
        assert_eq!(
            lesson.content,
            r#"{"title":"At the market","pattern":"How much is ___?","examples":["How much is this?"]}"#
        );
        assert_eq!(lesson.title, "At the market");
    }

    #[test]
    fn test_save_passes_string_content_through() {
        let stored = r#"{"pattern":"How much is ___?","examples":[]}"#.to_string();
        let lesson = save_form(Value::String(stored.clone())).validate().unwrap();
        assert_eq!(lesson.content, stored);
        assert_eq!(lesson.title, "Food");
    }

    #[test]
    fn test_save_rejects_unusable_content() {
        for bad in [json!(null), json!(""), json!(5), json!({ "examples": [] })] {
            let ValidationError(errors) = save_form(bad).validate().unwrap_err();
            assert!(errors.get("content").is_some());
        }
    }

    #[test]
    fn test_update_form_only_touches_given_fields() {
        let changes = UpdateLessonForm {
            is_public: Some(true),
            level: Some("c2".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(changes.is_public, Some(true));
        assert_eq!(changes.level, Some(CefrLevel::C2));
        assert!(changes.title.is_none());
        assert!(changes.content.is_none());

        let err = UpdateLessonForm {
            title: Some(" ".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.0.get("title"), Some("is required"));
    }

    #[test]
    fn test_update_form_tells_null_student_from_absent() {
        let student_id = Uuid::new_v4();
        let cases = [
            (json!({}), None),
            (json!({ "student_id": null }), Some(None)),
            (json!({ "student_id": student_id }), Some(Some(student_id))),
        ];
        for (body, expected) in cases {
            let form: UpdateLessonForm = serde_json::from_value(body).unwrap();
            assert_eq!(form.validate().unwrap().student_id, expected);
        }
    }

    #[test]
    fn test_student_form() {
        let form = StudentForm {
            name: "Ana".to_string(),
            email: Some("ana@example.com".to_string()),
            level: "A1".to_string(),
            native_language: Some("Portuguese".to_string()),
            notes: None,
        };
        let fields = form.validate().unwrap();
        assert_eq!(fields.level, CefrLevel::A1);

        let bad = StudentForm {
            email: Some("not-an-email".to_string()),
            ..form
        };
        let ValidationError(errors) = bad.validate().unwrap_err();
        assert_eq!(errors.get("email"), Some("must be a valid email address"));
    }
}
