use std::time::Duration;

use base64::{Engine, engine::general_purpose};
use futures::future::join_all;
use log::{debug, info, warn};

use crate::backend::{ImageBackend, PredictionStatus};

/// How long to wait for a submitted job: a fixed interval between status checks and
/// a fixed number of checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    /// 3 seconds x 30 attempts, roughly a 90 second ceiling.
    fn default() -> Self {
        PollPolicy {
            interval: Duration::from_secs(3),
            max_attempts: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    /// Caller-chosen label, echoed back for logging and correlation.
    pub id: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl GeneratedImage {
    /// Re-encodes the asset as a `data:` URL so it can live inside a JSON document.
    pub fn data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.content_type,
            general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

#[derive(Debug, Clone)]
pub struct ImagePrompt {
    pub id: String,
    pub prompt: String,
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// `images[i]` belongs to the i-th prompt of the batch.
    pub images: Vec<Option<GeneratedImage>>,
    pub succeeded: usize,
}

pub struct ImageGenerator<B> {
    backend: B,
    policy: PollPolicy,
}

impl<B: ImageBackend> ImageGenerator<B> {
    pub fn new(backend: B, policy: PollPolicy) -> Self {
        ImageGenerator { backend, policy }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_configured()
    }

    /// Submits `prompt`, waits for the job and downloads the result.
    /// Every failure along the way is logged and reported as `None`.
    pub async fn generate(&self, prompt: &str, id: &str) -> Option<GeneratedImage> {
        if !self.backend.is_configured() {
            warn!("[{}] Image provider has no API token, skipping", id);
            return None;
        }
        let prompt = prompt.trim();
        if prompt.is_empty() {
            warn!("[{}] Empty image prompt, skipping", id);
            return None;
        }

        let submitted = match self.backend.submit(prompt).await {
            Ok(prediction) => prediction,
            Err(e) => {
                warn!("[{}] Image submission failed: {}", id, e);
                return None;
            }
        };
        debug!("[{}] Submitted prediction {}", id, submitted.id);

        let url = match submitted.status {
            PredictionStatus::Succeeded => submitted.output_url().map(str::to_string),
            PredictionStatus::Failed | PredictionStatus::Canceled => {
                warn!("[{}] Prediction {} rejected: {:?}", id, submitted.id, submitted.error);
                None
            }
            _ => self.wait_for_output(&submitted.id, id).await,
        }?;

        match self.backend.fetch(&url).await {
            Ok(asset) => {
                info!("[{}] Image ready ({} bytes)", id, asset.bytes.len());
                Some(GeneratedImage {
                    id: id.to_string(),
                    content_type: asset.content_type,
                    bytes: asset.bytes,
                })
            }
            Err(e) => {
                warn!("[{}] Could not download image {}: {}", id, url, e);
                None
            }
        }
    }

    /// Polls until the job reaches a terminal state or the attempt budget runs out.
    /// A failed status check still uses up an attempt.
    async fn wait_for_output(&self, prediction_id: &str, id: &str) -> Option<String> {
        for attempt in 1..=self.policy.max_attempts {
            tokio::time::sleep(self.policy.interval).await;

            let prediction = match self.backend.status(prediction_id).await {
                Ok(prediction) => prediction,
                Err(e) => {
                    warn!(
                        "[{}] Status check {}/{} failed: {}",
                        id, attempt, self.policy.max_attempts, e
                    );
                    continue;
                }
            };

            match prediction.status {
                PredictionStatus::Succeeded => {
                    let url = prediction.output_url().map(str::to_string);
                    if url.is_none() {
                        warn!("[{}] Prediction {} succeeded without output", id, prediction_id);
                    }
                    return url;
                }
                PredictionStatus::Failed | PredictionStatus::Canceled => {
                    warn!(
                        "[{}] Prediction {} ended as {:?}: {:?}",
                        id, prediction_id, prediction.status, prediction.error
                    );
                    return None;
                }
                status => {
                    debug!(
                        "[{}] Prediction {} is {:?} ({}/{})",
                        id, prediction_id, status, attempt, self.policy.max_attempts
                    );
                }
            }
        }

        warn!(
            "[{}] Prediction {} not finished after {} attempts, giving up",
            id, prediction_id, self.policy.max_attempts
        );
        None
    }

    /// Runs every prompt concurrently. Results stay in input order no matter which
    /// job finishes first; some of them may be `None`.
    pub async fn generate_batch(&self, prompts: &[ImagePrompt]) -> BatchOutcome {
        let images = join_all(
            prompts
                .iter()
                .map(|prompt| self.generate(&prompt.prompt, &prompt.id)),
        )
        .await;
        let succeeded = images.iter().filter(|image| image.is_some()).count();
        info!("Generated {}/{} images", succeeded, prompts.len());
        BatchOutcome { images, succeeded }
    }
}
