//! HTTP client for the quiz backend service.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use futures::future::try_join_all;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use quizgrade_core::model::{make_ids_unique, Difficulty, Question, RawQuestion};
use quizgrade_core::statistics::UserStats;
use quizgrade_core::traits::{
    AuthToken, Credentials, GenerateQuestionRequest, HealthStatus, QuestionRequest, QuizBackend,
    QuizResult, Registration,
};

use crate::error::BackendError;
use crate::retry::{retry, RetryPolicy};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Quiz backend reached over HTTP.
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
    timeout_secs: u64,
    retry: RetryPolicy,
}

#[derive(Deserialize)]
struct TopicsResponse {
    topics: HashMap<String, u64>,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout_secs: u64, retry: RetryPolicy) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
            retry,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and decode the JSON body, mapping failures to [`BackendError`].
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value, BackendError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                BackendError::Timeout(self.timeout_secs)
            } else {
                BackendError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status >= 400 {
            let retry_after_ms = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5)
                * 1000;
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body, retry_after_ms));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| BackendError::InvalidResponse(format!("failed to parse response: {e}")))
    }

    async fn get(&self, operation: &str, path: &str, token: Option<&str>) -> Result<Value, BackendError> {
        retry(&self.retry, operation, || {
            let mut request = self.client.get(self.url(path));
            if let Some(token) = token {
                request = request.bearer_auth(token);
            }
            self.send(request)
        })
        .await
    }

    /// One random question from the backend question bank.
    pub async fn fetch_random(
        &self,
        topic: Option<&str>,
        difficulty: Option<Difficulty>,
    ) -> Result<Question, BackendError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(topic) = topic {
            params.push(("topic", topic.to_string()));
        }
        if let Some(level) = difficulty {
            params.push(("level", level.to_string()));
        }

        let value = retry(&self.retry, "random_question", || {
            self.send(self.client.get(self.url("/questions/random")).query(&params))
        })
        .await?;
        question_from(value)
    }
}

/// Map an HTTP error status to a typed error.
fn status_error(status: u16, body: &str, retry_after_ms: u64) -> BackendError {
    let message = detail_message(body);
    match status {
        401 => BackendError::Unauthorized(message),
        403 => BackendError::Forbidden(message),
        404 => BackendError::NotFound(message),
        429 => BackendError::RateLimited { retry_after_ms },
        _ => BackendError::ApiError { status, message },
    }
}

/// The `detail` field of an error body if there is one, else the raw body.
fn detail_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

/// Some endpoints answer 200 with `{"status": "error", "detail": ...}`.
fn embedded_error(value: &Value) -> Option<String> {
    if value.get("status").and_then(Value::as_str) == Some("error") {
        let detail = value
            .get("detail")
            .and_then(Value::as_str)
            .unwrap_or("unspecified error");
        return Some(detail.to_string());
    }
    None
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, BackendError> {
    if let Some(detail) = embedded_error(&value) {
        return Err(BackendError::ApiError {
            status: 200,
            message: detail,
        });
    }
    serde_json::from_value(value).map_err(|e| BackendError::InvalidResponse(e.to_string()))
}

fn question_from(value: Value) -> Result<Question, BackendError> {
    if let Some(detail) = embedded_error(&value) {
        return Err(BackendError::NoQuestionAvailable(detail));
    }
    if let Some(error) = value.get("error") {
        return Err(BackendError::InvalidResponse(format!(
            "question generation failed: {error}"
        )));
    }
    let raw: RawQuestion =
        serde_json::from_value(value).map_err(|e| BackendError::InvalidResponse(e.to_string()))?;
    Question::try_from(raw).map_err(|e| BackendError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl QuizBackend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self))]
    async fn health(&self) -> anyhow::Result<HealthStatus> {
        let value = self.get("health", "/health", None).await?;
        Ok(decode(value)?)
    }

    #[instrument(skip(self))]
    async fn topics(&self) -> anyhow::Result<HashMap<String, u64>> {
        let value = self.get("topics", "/topics", None).await?;
        let response: TopicsResponse = decode(value)?;
        Ok(response.topics)
    }

    #[instrument(skip(self, request), fields(topic = %request.topic, count = request.count))]
    async fn fetch_questions(&self, request: &QuestionRequest) -> anyhow::Result<Vec<Question>> {
        let fetches = (0..request.count)
            .map(|_| self.fetch_random(Some(&request.topic), Some(request.difficulty)));
        let mut questions = try_join_all(fetches).await?;
        let renamed = make_ids_unique(&mut questions);
        if renamed > 0 {
            tracing::debug!(renamed, "backend repeated questions; ids suffixed");
        }
        tracing::debug!(fetched = questions.len(), "questions fetched");
        Ok(questions)
    }

    #[instrument(skip(self))]
    async fn random_question(
        &self,
        topic: Option<&str>,
        difficulty: Option<Difficulty>,
    ) -> anyhow::Result<Question> {
        Ok(self.fetch_random(topic, difficulty).await?)
    }

    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    async fn login(&self, credentials: &Credentials) -> anyhow::Result<AuthToken> {
        let form = [
            ("username", credentials.username.as_str()),
            ("password", credentials.password.as_str()),
        ];
        let value = self
            .send(self.client.post(self.url("/auth/login")).form(&form))
            .await?;
        Ok(decode(value)?)
    }

    #[instrument(skip(self, registration), fields(username = %registration.username))]
    async fn register(&self, registration: &Registration) -> anyhow::Result<AuthToken> {
        let value = self
            .send(self.client.post(self.url("/auth/register")).json(registration))
            .await?;
        Ok(decode(value)?)
    }

    #[instrument(skip(self, token, result), fields(topic = %result.topic))]
    async fn submit_result(&self, token: &str, result: &QuizResult) -> anyhow::Result<()> {
        self.send(
            self.client
                .post(self.url("/auth/submit-result"))
                .bearer_auth(token)
                .json(result),
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self, token))]
    async fn user_stats(&self, token: &str) -> anyhow::Result<UserStats> {
        let value = self.get("user_stats", "/auth/stats", Some(token)).await?;
        Ok(decode(value)?)
    }

    #[instrument(skip(self, token, request), fields(topic = %request.topic, qtype = %request.qtype))]
    async fn generate_question(
        &self,
        token: &str,
        request: &GenerateQuestionRequest,
    ) -> anyhow::Result<Question> {
        let params = [
            ("topic", request.topic.clone()),
            ("level", request.difficulty.to_string()),
            ("qtype", request.qtype.clone()),
        ];
        let value = self
            .send(
                self.client
                    .post(self.url("/admin/generate-question"))
                    .query(&params)
                    .bearer_auth(token),
            )
            .await?;
        Ok(question_from(value)?)
    }

    #[instrument(skip(self, token))]
    async fn generate_random_question(&self, token: &str) -> anyhow::Result<Question> {
        let value = self
            .send(
                self.client
                    .post(self.url("/admin/generate-random-question"))
                    .bearer_auth(token),
            )
            .await?;
        Ok(question_from(value)?)
    }

    #[instrument(skip(self, token))]
    async fn delete_question(&self, token: &str, question_id: &str) -> anyhow::Result<()> {
        self.send(
            self.client
                .delete(self.url(&format!("/admin/questions/{question_id}")))
                .bearer_auth(token),
        )
        .await?;
        Ok(())
    }
}
