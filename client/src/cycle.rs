//! One lesson from request to library.
//!
//! ```text
//! Idle -> Generating -> Generated -> Saved
//!              |             |
//!              v             v
//!            Failed        Idle (discard)
//! ```
//!
//! Generating and saving are separate requests. A generated lesson lives only in
//! the cycle until it is saved; dropping the cycle loses it, and the credit spent on
//! it is not returned.

use log::{info, warn};
use schema::{
    forms::{GenerateLessonForm, GeneratedLesson, SaveLessonForm},
    storage,
};
use serde_json::Value;

use crate::{api::LessonApi, error::ClientError, records::LessonRecord};

#[derive(Debug, Clone, PartialEq)]
pub enum CycleState {
    Idle,
    Generating,
    Generated {
        form: GenerateLessonForm,
        lesson: GeneratedLesson,
    },
    Failed(String),
    Saved(LessonRecord),
}

impl CycleState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CycleState::Failed(_) | CycleState::Saved(_))
    }
}

/// Library options chosen when keeping a generated lesson.
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    pub title: Option<String>,
    pub is_public: bool,
}

pub struct GenerationCycle {
    state: CycleState,
    credits: i32,
}

impl GenerationCycle {
    /// Starts a cycle for a teacher holding `credits`, as last reported by the server.
    pub fn new(credits: i32) -> Self {
        GenerationCycle {
            state: CycleState::Idle,
            credits,
        }
    }

    pub fn state(&self) -> &CycleState {
        &self.state
    }

    pub fn credits(&self) -> i32 {
        self.credits
    }

    pub fn lesson(&self) -> Option<&GeneratedLesson> {
        match &self.state {
            CycleState::Generated { lesson, .. } => Some(lesson),
            _ => None,
        }
    }

    /// Requests a lesson. Refused without a network call when a request is already
    /// pending, when the cycle is over, when there are no credits left, or when the
    /// form is invalid; in those cases the state does not change.
    pub async fn generate<A: LessonApi>(
        &mut self,
        api: &A,
        form: GenerateLessonForm,
    ) -> Result<GeneratedLesson, ClientError> {
        match &self.state {
            CycleState::Idle => {}
            CycleState::Generating => return Err(ClientError::AlreadyPending),
            CycleState::Generated { .. } => {
                return Err(ClientError::InvalidState(
                    "save or discard the current lesson first".to_string(),
                ));
            }
            CycleState::Failed(_) | CycleState::Saved(_) => {
                return Err(ClientError::InvalidState("this cycle is finished".to_string()));
            }
        }
        if self.credits < 1 {
            return Err(ClientError::InsufficientCredits(
                "buy more credits to generate lessons".to_string(),
            ));
        }
        form.validate().map_err(|e| ClientError::Validation(e.0))?;

        self.state = CycleState::Generating;
        match api.generate_lesson(&form).await {
            Ok(lesson) => {
                info!(
                    "Lesson on {:?} generated, {} credits left",
                    form.topic, lesson.credits_remaining
                );
                self.credits = lesson.credits_remaining;
                self.state = CycleState::Generated {
                    form,
                    lesson: lesson.clone(),
                };
                Ok(lesson)
            }
            Err(e) => {
                warn!("Lesson generation failed: {}", e);
                self.state = CycleState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Stores the generated lesson in the teacher's library. The document is sent in
    /// its string form. A failed save keeps the lesson so it can be saved again.
    pub async fn save<A: LessonApi>(
        &mut self,
        api: &A,
        options: SaveOptions,
    ) -> Result<LessonRecord, ClientError> {
        let CycleState::Generated { form, lesson } = &self.state else {
            return Err(ClientError::InvalidState(
                "there is no generated lesson to save".to_string(),
            ));
        };

        let save_form = SaveLessonForm {
            title: options.title,
            topic: form.topic.clone(),
            level: form.level.clone(),
            category: form.category.clone(),
            student_id: form.student_id,
            is_public: options.is_public,
            content: Value::String(storage::to_storage_string(lesson.content.clone())),
        };
        let record = api.save_lesson(&save_form).await?;
        info!("Lesson saved as {}", record.id);
        self.state = CycleState::Saved(record.clone());
        Ok(record)
    }

    /// Throws away a generated lesson and starts over. The credit stays spent.
    ///
    /// Also resets a cycle left in `Generating` because its `generate` future was
    /// dropped before the response arrived. The server may still charge for that
    /// request; the next `generate` picks up the new balance.
    pub fn discard(&mut self) -> Result<(), ClientError> {
        match self.state {
            CycleState::Idle => Ok(()),
            CycleState::Generating | CycleState::Generated { .. } => {
                self.state = CycleState::Idle;
                Ok(())
            }
            _ => Err(ClientError::InvalidState(
                "only a generated lesson can be discarded".to_string(),
            )),
        }
    }
}
