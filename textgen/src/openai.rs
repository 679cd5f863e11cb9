use log::{debug, info, warn};
use reqwest::Client;
use schema::{LessonContent, content::ContentError, forms::GenerateLessonParams};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    prompt::{self, StudentContext},
    writer::{LessonWriter, TextGenError},
};

#[derive(Debug, Deserialize)]
struct Completion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiWriter {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OpenAiWriter {
    pub fn new(api_key: String, base_url: String, model: String, temperature: f32) -> Self {
        OpenAiWriter {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            temperature,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl LessonWriter for OpenAiWriter {
    async fn write_lesson(
        &self,
        params: &GenerateLessonParams,
        student: Option<&StudentContext>,
    ) -> Result<LessonContent, TextGenError> {
        if !self.is_configured() {
            return Err(TextGenError::NotConfigured);
        }

        let url = format!("{}/chat/completions", self.base_url);
        debug!("Requesting {} lesson on {:?} from {}", params.level, params.topic, url);
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "temperature": self.temperature,
                "response_format": { "type": "json_object" },
                "messages": prompt::build_messages(params, student),
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|body| body["error"]["message"].as_str().map(str::to_string))
                .unwrap_or_else(|| status.to_string());
            warn!("Text provider rejected request: {} {}", status, message);
            return Err(TextGenError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let completion = response.json::<Completion>().await?;
        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(TextGenError::EmptyResponse)?;

        let lesson = parse_lesson(&text)?;
        info!(
            "Text provider produced {:?} with {} examples",
            lesson.title.as_deref().unwrap_or(&params.topic),
            lesson.examples.len()
        );
        Ok(lesson)
    }
}

/// Turns the completion text into a lesson. Markdown code fences around the JSON are
/// tolerated; a lesson without a single example is rejected.
pub fn parse_lesson(text: &str) -> Result<LessonContent, TextGenError> {
    let json = strip_code_fence(text);
    if json.is_empty() {
        return Err(TextGenError::EmptyResponse);
    }
    let lesson = LessonContent::from_value(serde_json::from_str(json)?)?;
    if lesson.examples.is_empty() {
        return Err(ContentError::MissingExamples.into());
    }
    Ok(lesson)
}

fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // drop the language tag on the opening fence
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().trim_end_matches("```").trim()
}

#[cfg(test)]
mod tests {
    use schema::{CefrLevel, LessonCategory};

    use super::*;

    const LESSON: &str = r#"{
        "title": "Wishes",
        "pattern": "I wish I could ___.",
        "examples": [
            "I wish I could swim.",
            {"text": "I wish I could fly.", "components": {"I wish": "desire", "could fly": "ability"}}
        ]
    }"#;

    #[test]
    fn test_parse_plain_json() {
        let lesson = parse_lesson(LESSON).unwrap();
        assert_eq!(lesson.pattern_template, "I wish I could ___.");
        assert_eq!(lesson.examples.len(), 2);
        assert_eq!(lesson.examples[1].breakdown().len(), 2);
    }

    #[test]
    fn test_parse_fenced_json() {
        let fenced = format!("```json\n{}\n```", LESSON);
        assert_eq!(parse_lesson(&fenced).unwrap().title.as_deref(), Some("Wishes"));

        let bare_fence = format!("```\n{}```", LESSON);
        assert!(parse_lesson(&bare_fence).is_ok());
    }

    #[test]
    fn test_parse_rejects_unusable_replies() {
        assert!(matches!(parse_lesson("  "), Err(TextGenError::EmptyResponse)));
        assert!(matches!(
            parse_lesson("Sure! Here is your lesson"),
            Err(TextGenError::InvalidJson(_))
        ));
        assert!(matches!(
            parse_lesson(r#"{"pattern": "I ___.", "examples": []}"#),
            Err(TextGenError::Content(ContentError::MissingExamples))
        ));
        assert!(matches!(
            parse_lesson(r#"{"examples": ["x"]}"#),
            Err(TextGenError::Content(ContentError::MissingTemplate))
        ));
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_request() {
        let writer = OpenAiWriter::new(
            String::new(),
            "http://127.0.0.1:9/".to_string(),
            "gpt-4o-mini".to_string(),
            0.7,
        );
        let params = GenerateLessonParams {
            topic: "Weather".to_string(),
            level: CefrLevel::A1,
            category: LessonCategory::Vocabulary,
            student_id: None,
            focus: None,
            include_images: false,
        };
        assert!(matches!(
            writer.write_lesson(&params, None).await,
            Err(TextGenError::NotConfigured)
        ));
    }
}
