use schema::{CefrLevel, forms::GenerateLessonParams};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// What the provider is told about the learner when the lesson targets one student.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentContext {
    pub name: String,
    pub level: Option<CefrLevel>,
    pub native_language: Option<String>,
    pub notes: Option<String>,
}

const SYSTEM_PROMPT: &str = r#"You are an experienced ESL teacher who designs lessons around a single sentence frame.
Reply with one JSON object and nothing else. Use exactly these keys:
- "title": short lesson title
- "level": the CEFR level
- "topic": the lesson topic
- "pattern_template": the sentence frame, with ___ marking each slot
- "examples": array of objects {"sentence": string, "breakdown": {part: explanation}, "note": string}
- "learning_objectives": array of strings
- "grammar_focus": string
- "pattern_breakdown": object mapping each part of the frame to an explanation
- "vocabulary": array of {"word", "definition", "example"}
- "common_mistakes": array of {"incorrect", "correct", "explanation"}
- "practice_activities": array of {"title", "instructions", "items": [string]}
- "illustrations": array of {"prompt", "caption"}; prompts describe simple, text-free classroom pictures
- "teacher_notes": string
"pattern_template" and at least three "examples" are required."#;

/// Builds the system and user messages for one lesson request.
pub fn build_messages(
    params: &GenerateLessonParams,
    student: Option<&StudentContext>,
) -> Vec<ChatMessage> {
    let mut request = format!(
        "Create an ESL lesson for CEFR level {} ({}).\nCategory: {}\nTopic: {}",
        params.level,
        params.level.description(),
        params.category.label(),
        params.topic
    );
    if let Some(focus) = &params.focus {
        request.push_str(&format!("\nFocus: {}", focus));
    }
    if let Some(student) = student {
        request.push_str(&format!("\nThe lesson is for {}", student.name));
        if let Some(level) = student.level.filter(|level| *level != params.level) {
            request.push_str(&format!(", currently assessed at {}", level));
        }
        if let Some(language) = &student.native_language {
            request.push_str(&format!(
                ", a native {} speaker; include mistakes typical for that language",
                language
            ));
        }
        request.push('.');
        if let Some(notes) = &student.notes {
            request.push_str(&format!("\nTeacher's notes about the student: {}", notes));
        }
    }
    if params.include_images {
        request.push_str("\nInclude two or three illustrations.");
    } else {
        request.push_str("\nLeave \"illustrations\" empty.");
    }

    vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(request)]
}
