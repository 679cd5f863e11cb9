use log::debug;
use reqwest::{Client, Response, header};
use serde_json::json;

use crate::backend::{FetchedAsset, ImageBackend, ImageError, Prediction};

/// Replicate-style prediction API: `POST /v1/models/{model}/predictions`,
/// `GET /v1/predictions/{id}`, then a plain GET on the output URL.
pub struct ReplicateBackend {
    client: Client,
    api_token: String,
    base_url: String,
    model: String,
}

impl ReplicateBackend {
    pub fn new(api_token: String, base_url: String, model: String) -> Self {
        ReplicateBackend {
            client: Client::new(),
            api_token,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        }
    }

    async fn read_prediction(response: Response) -> Result<Prediction, ImageError> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|body| body["detail"].as_str().map(str::to_string))
                .unwrap_or_else(|| "no detail".to_string());
            return Err(ImageError::Provider {
                status: status.as_u16(),
                message,
            });
        }
        response
            .json::<Prediction>()
            .await
            .map_err(|e| ImageError::Parse(e.to_string()))
    }
}

impl ImageBackend for ReplicateBackend {
    fn is_configured(&self) -> bool {
        !self.api_token.trim().is_empty()
    }

    async fn submit(&self, prompt: &str) -> Result<Prediction, ImageError> {
        let url = format!("{}/v1/models/{}/predictions", self.base_url, self.model);
        debug!("Submitting image prediction to {}", url);
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_token)
            .json(&json!({
                "input": {
                    "prompt": prompt,
                    "num_outputs": 1,
                    "output_format": "png"
                }
            }))
            .send()
            .await?;
        Self::read_prediction(response).await
    }

    async fn status(&self, prediction_id: &str) -> Result<Prediction, ImageError> {
        let url = format!("{}/v1/predictions/{}", self.base_url, prediction_id);
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_token)
            .send()
            .await?;
        Self::read_prediction(response).await
    }

    async fn fetch(&self, url: &str) -> Result<FetchedAsset, ImageError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .filter(|value| value.starts_with("image/"))
            .unwrap_or("image/png")
            .to_string();
        let bytes = response.bytes().await?.to_vec();
        if bytes.is_empty() {
            return Err(ImageError::Parse("empty image body".to_string()));
        }
        Ok(FetchedAsset {
            bytes,
            content_type,
        })
    }
}
