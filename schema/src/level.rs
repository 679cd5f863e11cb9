use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// CEFR proficiency tier used to tag students and lessons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(type_name = "cefr_level"))]
pub enum CefrLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl CefrLevel {
    pub const ALL: [CefrLevel; 6] = [
        CefrLevel::A1,
        CefrLevel::A2,
        CefrLevel::B1,
        CefrLevel::B2,
        CefrLevel::C1,
        CefrLevel::C2,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CefrLevel::A1 => "A1",
            CefrLevel::A2 => "A2",
            CefrLevel::B1 => "B1",
            CefrLevel::B2 => "B2",
            CefrLevel::C1 => "C1",
            CefrLevel::C2 => "C2",
        }
    }

    /// Short learner-facing description, used when prompting the text provider.
    pub fn description(&self) -> &'static str {
        match self {
            CefrLevel::A1 => "beginner",
            CefrLevel::A2 => "elementary",
            CefrLevel::B1 => "intermediate",
            CefrLevel::B2 => "upper intermediate",
            CefrLevel::C1 => "advanced",
            CefrLevel::C2 => "proficient",
        }
    }
}

impl fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CefrLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        CefrLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == normalized)
            .ok_or_else(|| format!("must be one of A1, A2, B1, B2, C1, C2 (got '{}')", s.trim()))
    }
}

/// Lesson category chosen on the generation form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(
    feature = "db",
    sqlx(type_name = "lesson_category", rename_all = "snake_case")
)]
pub enum LessonCategory {
    Grammar,
    Vocabulary,
    Conversation,
    Reading,
    Writing,
    Business,
    ExamPrep,
}

impl LessonCategory {
    pub const ALL: [LessonCategory; 7] = [
        LessonCategory::Grammar,
        LessonCategory::Vocabulary,
        LessonCategory::Conversation,
        LessonCategory::Reading,
        LessonCategory::Writing,
        LessonCategory::Business,
        LessonCategory::ExamPrep,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LessonCategory::Grammar => "grammar",
            LessonCategory::Vocabulary => "vocabulary",
            LessonCategory::Conversation => "conversation",
            LessonCategory::Reading => "reading",
            LessonCategory::Writing => "writing",
            LessonCategory::Business => "business",
            LessonCategory::ExamPrep => "exam_prep",
        }
    }

    /// Human-readable name, e.g. "exam prep".
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl fmt::Display for LessonCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LessonCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        LessonCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| {
                let allowed: Vec<&str> = LessonCategory::ALL.iter().map(|c| c.as_str()).collect();
                format!("must be one of {}", allowed.join(", "))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(
    feature = "db",
    sqlx(type_name = "subscription_tier", rename_all = "lowercase")
)]
pub enum SubscriptionTier {
    Free,
    Basic,
    Premium,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cefr_level_parse_is_case_insensitive() {
        assert_eq!("b2".parse::<CefrLevel>(), Ok(CefrLevel::B2));
        assert_eq!(" C1 ".parse::<CefrLevel>(), Ok(CefrLevel::C1));
        assert!("D1".parse::<CefrLevel>().is_err());
    }

    #[test]
    fn test_category_parse_accepts_separators() {
        assert_eq!("exam-prep".parse::<LessonCategory>(), Ok(LessonCategory::ExamPrep));
        assert_eq!("Exam Prep".parse::<LessonCategory>(), Ok(LessonCategory::ExamPrep));
        assert_eq!("grammar".parse::<LessonCategory>(), Ok(LessonCategory::Grammar));
        assert!("cooking".parse::<LessonCategory>().is_err());
    }

    #[test]
    fn test_serde_names_match_display() {
        let json = serde_json::to_string(&LessonCategory::ExamPrep).unwrap();
        assert_eq!(json, "\"exam_prep\"");
        let json = serde_json::to_string(&CefrLevel::A2).unwrap();
        assert_eq!(json, "\"A2\"");
    }
}
