use std::time::Duration;

use common::{
    env_config::Config,
    error::{AppError, Res},
    jwt::JwtClaims,
};
use db::models::student::Student;
use imagegen::{GeneratedImage, ImageBackend, ImageGenerator, ImagePrompt, PollPolicy, ReplicateBackend};
use log::{info, warn};
use schema::{
    LessonContent,
    forms::{GenerateLessonForm, GenerateLessonParams, GeneratedLesson},
};
use sqlx::PgPool;
use textgen::{LessonWriter, OpenAiWriter, StudentContext, TextGenError};

/// The two external providers behind lesson generation.
pub struct LessonServices {
    pub writer: OpenAiWriter,
    pub images: ImageGenerator<ReplicateBackend>,
}

impl LessonServices {
    pub fn from_config(config: &Config) -> Self {
        let text = &config.text_provider;
        let image = &config.image_provider;
        let images = ImageGenerator::new(
            ReplicateBackend::new(
                image.api_token.clone(),
                image.base_url.clone(),
                image.model.clone(),
            ),
            PollPolicy {
                interval: Duration::from_secs(image.poll_interval_secs),
                max_attempts: image.max_poll_attempts,
            },
        );
        if !images.is_enabled() {
            warn!("IMAGE_API_TOKEN is not set, lessons will be generated without pictures");
        }

        LessonServices {
            writer: OpenAiWriter::new(
                text.api_key.clone(),
                text.base_url.clone(),
                text.model.clone(),
                text.temperature,
            ),
            images,
        }
    }
}

/// Writes the lesson and, when asked for, illustrates it. Pictures are attached to
/// `illustrations` by position; an illustration whose picture could not be made is
/// kept without one. Only a failure of the text provider fails the whole lesson.
pub async fn compose_lesson<W, B>(
    writer: &W,
    images: &ImageGenerator<B>,
    params: &GenerateLessonParams,
    student: Option<&StudentContext>,
) -> Result<LessonContent, TextGenError>
where
    W: LessonWriter,
    B: ImageBackend,
{
    let mut lesson = writer.write_lesson(params, student).await?;
    if !params.include_images || lesson.illustrations.is_empty() || !images.is_enabled() {
        return Ok(lesson);
    }

    let prompts: Vec<ImagePrompt> = lesson
        .image_prompts()
        .into_iter()
        .enumerate()
        .map(|(i, prompt)| ImagePrompt {
            id: format!("illustration-{}", i + 1),
            prompt,
        })
        .collect();
    let outcome = images.generate_batch(&prompts).await;
    if outcome.succeeded < prompts.len() {
        warn!(
            "Only {}/{} illustrations could be generated for {:?}",
            outcome.succeeded,
            prompts.len(),
            params.topic
        );
    }
    lesson.attach_images(
        outcome
            .images
            .iter()
            .map(|image| image.as_ref().map(GeneratedImage::data_url)),
    );
    Ok(lesson)
}

/// Maps text provider failures onto responses. A missing key is our own
/// misconfiguration; everything else is the provider's fault.
pub fn text_error(error: TextGenError) -> AppError {
    match error {
        TextGenError::NotConfigured => AppError::Internal(error.to_string()),
        error => AppError::Upstream(error.to_string()),
    }
}

fn student_context(student: Student) -> StudentContext {
    StudentContext {
        name: student.name,
        level: Some(student.cefr_level),
        native_language: student.native_language,
        notes: student.notes,
    }
}

/// Generates one lesson for the teacher and charges one credit for it.
///
/// The balance is checked up front so nobody waits on the providers just to be told
/// they cannot pay. The credit itself is taken only after the document exists, with
/// an atomic decrement, so a failed generation costs nothing and two concurrent
/// requests cannot drive the balance below zero.
pub async fn generate_lesson(
    pool: &PgPool,
    services: &LessonServices,
    config: &Config,
    claims: &JwtClaims,
    form: GenerateLessonForm,
) -> Res<GeneratedLesson> {
    let params = form.validate()?;

    let user = api_auth::services::user::ensure_user(pool, claims, config.initial_credits).await?;
    if !user.can_generate() {
        return Err(AppError::PaymentRequired(
            "No credits left to generate a lesson".to_string(),
        ));
    }

    let student = match params.student_id {
        Some(student_id) => Some(
            db::student::get_student(pool, user.id, student_id)
                .await?
                .map(student_context)
                .ok_or_else(|| AppError::NotFound(format!("Student {} not found", student_id)))?,
        ),
        None => None,
    };

    let lesson = compose_lesson(&services.writer, &services.images, &params, student.as_ref())
        .await
        .map_err(text_error)?;
    let content = lesson.to_value()?;

    let credits_remaining = db::user::consume_credit(pool, user.id)
        .await?
        .ok_or_else(|| {
            AppError::PaymentRequired("Credits were spent by another request".to_string())
        })?;
    info!(
        "Teacher {} generated a {} {} lesson, {} credits left",
        user.id, params.level, params.category, credits_remaining
    );

    Ok(GeneratedLesson {
        content,
        credits_remaining,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use imagegen::{FetchedAsset, ImageError, Prediction, PredictionStatus};
    use schema::{CefrLevel, LessonCategory};
    use serde_json::json;

    use super::*;

    struct FakeWriter {
        reply: serde_json::Value,
    }

    impl LessonWriter for FakeWriter {
        async fn write_lesson(
            &self,
            _params: &GenerateLessonParams,
            _student: Option<&StudentContext>,
        ) -> Result<LessonContent, TextGenError> {
            Ok(LessonContent::from_value(self.reply.clone())?)
        }
    }

    struct FailingWriter;

    impl LessonWriter for FailingWriter {
        async fn write_lesson(
            &self,
            _params: &GenerateLessonParams,
            _student: Option<&StudentContext>,
        ) -> Result<LessonContent, TextGenError> {
            Err(TextGenError::Provider {
                status: 503,
                message: "overloaded".to_string(),
            })
        }
    }

    /// Finishes every job on submit. Prompts containing "broken" fail.
    #[derive(Default)]
    struct InstantBackend {
        submits: AtomicUsize,
    }

    impl ImageBackend for InstantBackend {
        fn is_configured(&self) -> bool {
            true
        }

        async fn submit(&self, prompt: &str) -> Result<Prediction, ImageError> {
            self.submits.fetch_add(1, Ordering::SeqCst);
            let status = if prompt.contains("broken") {
                PredictionStatus::Failed
            } else {
                PredictionStatus::Succeeded
            };
            Ok(Prediction {
                id: prompt.to_string(),
                status,
                output: Some(json!(prompt)),
                error: None,
            })
        }

        async fn status(&self, _prediction_id: &str) -> Result<Prediction, ImageError> {
            Err(ImageError::Parse("not polled".to_string()))
        }

        async fn fetch(&self, url: &str) -> Result<FetchedAsset, ImageError> {
            Ok(FetchedAsset {
                bytes: url.as_bytes().to_vec(),
                content_type: "image/png".to_string(),
            })
        }
    }

    fn params(include_images: bool) -> GenerateLessonParams {
        GenerateLessonParams {
            topic: "Daily routines".to_string(),
            level: CefrLevel::A2,
            category: LessonCategory::Grammar,
            student_id: None,
            focus: None,
            include_images,
        }
    }

    fn writer() -> FakeWriter {
        FakeWriter {
            reply: json!({
                "pattern_template": "Every morning I ___.",
                "examples": ["Every morning I run."],
                "illustrations": [
                    { "prompt": "a person jogging", "caption": "run" },
                    { "prompt": "broken", "caption": "nothing" },
                    { "prompt": "a cup of coffee" }
                ]
            }),
        }
    }

    fn generator() -> ImageGenerator<InstantBackend> {
        ImageGenerator::new(InstantBackend::default(), PollPolicy::default())
    }

    #[tokio::test]
    async fn test_images_are_attached_by_position() {
        let lesson = compose_lesson(&writer(), &generator(), &params(true), None)
            .await
            .unwrap();

        let images: Vec<Option<&str>> = lesson
            .illustrations
            .iter()
            .map(|i| i.image.as_deref())
            .collect();
        assert_eq!(images[1], None);
        // data URL of the fake asset, which echoes the prompt
        assert_eq!(images[0], Some("data:image/png;base64,YSBwZXJzb24gam9nZ2luZw=="));
        assert!(images[2].is_some_and(|url| url.starts_with("data:image/png;base64,")));
        assert_eq!(lesson.illustrations[1].caption.as_deref(), Some("nothing"));
    }

    #[tokio::test]
    async fn test_images_can_be_skipped() {
        let images = generator();
        let lesson = compose_lesson(&writer(), &images, &params(false), None)
            .await
            .unwrap();
        assert!(lesson.illustrations.iter().all(|i| i.image.is_none()));
        assert_eq!(images.backend().submits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_text_failure_fails_the_lesson() {
        let err = compose_lesson(&FailingWriter, &generator(), &params(true), None)
            .await
            .unwrap_err();
        assert!(matches!(text_error(err), AppError::Upstream(_)));
        assert!(matches!(
            text_error(TextGenError::NotConfigured),
            AppError::Internal(_)
        ));
    }
}
