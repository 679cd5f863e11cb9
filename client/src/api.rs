use log::debug;
use reqwest::{Client, RequestBuilder};
use schema::forms::{GenerateLessonForm, GeneratedLesson, SaveLessonForm, StudentForm};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::{
    error::ClientError,
    records::{LessonRecord, Profile, StudentRecord},
};

/// The two calls a generation cycle makes.
#[allow(async_fn_in_trait)]
pub trait LessonApi {
    async fn generate_lesson(&self, form: &GenerateLessonForm) -> Result<GeneratedLesson, ClientError>;

    async fn save_lesson(&self, form: &SaveLessonForm) -> Result<LessonRecord, ClientError>;
}

/// Authenticated client for one teacher.
pub struct PlanwiseClient {
    http: Client,
    base_url: String,
    token: String,
}

impl PlanwiseClient {
    /// `base_url` points at the API root, e.g. `https://planwise.example/api`.
    pub fn new(base_url: &str, token: String) -> Self {
        PlanwiseClient {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.bearer_auth(&self.token).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!("Request failed with {}: {}", status, body);
            return Err(ClientError::from_response(status.as_u16(), &body));
        }
        Ok(response.json::<T>().await?)
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<(), ClientError> {
        let response = request.bearer_auth(&self.token).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_response(status.as_u16(), &body));
        }
        Ok(())
    }

    pub async fn me(&self) -> Result<Profile, ClientError> {
        self.send(self.http.get(self.url("/me"))).await
    }

    pub async fn list_students(&self) -> Result<Vec<StudentRecord>, ClientError> {
        self.send(self.http.get(self.url("/students"))).await
    }

    /// Checks the form locally first so obvious mistakes never leave the machine.
    pub async fn create_student(&self, form: &StudentForm) -> Result<StudentRecord, ClientError> {
        form.validate().map_err(|e| ClientError::Validation(e.0))?;
        self.send(self.http.post(self.url("/students")).json(form))
            .await
    }

    /// Irreversible. The server also deletes nothing unless the confirmation flag
    /// is present, which this call always sends.
    pub async fn delete_student(&self, student_id: Uuid) -> Result<(), ClientError> {
        let url = self.url(&format!("/students/{}", student_id));
        self.send_empty(self.http.delete(url).query(&[("confirm", "true")]))
            .await
    }

    pub async fn list_lessons(&self) -> Result<Vec<LessonRecord>, ClientError> {
        self.send(self.http.get(self.url("/lessons"))).await
    }

    pub async fn delete_lesson(&self, lesson_id: Uuid) -> Result<(), ClientError> {
        let url = self.url(&format!("/lessons/{}", lesson_id));
        self.send_empty(self.http.delete(url).query(&[("confirm", "true")]))
            .await
    }
}

impl LessonApi for PlanwiseClient {
    async fn generate_lesson(&self, form: &GenerateLessonForm) -> Result<GeneratedLesson, ClientError> {
        self.send(self.http.post(self.url("/lessons/generate")).json(form))
            .await
    }

    async fn save_lesson(&self, form: &SaveLessonForm) -> Result<LessonRecord, ClientError> {
        self.send(self.http.post(self.url("/lessons")).json(form))
            .await
    }
}
