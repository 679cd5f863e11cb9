use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("Unexpected provider response: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl PredictionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PredictionStatus::Succeeded | PredictionStatus::Failed | PredictionStatus::Canceled
        )
    }
}

/// A prediction job as reported by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct Prediction {
    pub id: String,
    pub status: PredictionStatus,
    /// A single URL or a list of URLs, depending on the model.
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl Prediction {
    /// First asset URL in the output, whichever shape it came in.
    pub fn output_url(&self) -> Option<&str> {
        match self.output.as_ref()? {
            Value::String(url) => Some(url),
            Value::Array(items) => items.iter().find_map(Value::as_str),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchedAsset {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// The three provider calls the generator needs: submit a job, check on it, and
/// download what it produced.
#[allow(async_fn_in_trait)]
pub trait ImageBackend {
    /// False when the provider has no credentials; the generator then skips all calls.
    fn is_configured(&self) -> bool;

    async fn submit(&self, prompt: &str) -> Result<Prediction, ImageError>;

    async fn status(&self, prediction_id: &str) -> Result<Prediction, ImageError>;

    async fn fetch(&self, url: &str) -> Result<FetchedAsset, ImageError>;
}
