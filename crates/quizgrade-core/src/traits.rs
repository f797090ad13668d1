//! The backend service boundary.
//!
//! Question storage, accounts, and question generation all live in an
//! external service. [`QuizBackend`] is the only way the rest of the
//! workspace reaches it; `quizgrade-client` provides the HTTP and mock
//! implementations.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::{Difficulty, Question};
use crate::statistics::UserStats;

// ---------------------------------------------------------------------------
// Backend trait
// ---------------------------------------------------------------------------

/// Operations offered by the quiz backend.
#[async_trait]
pub trait QuizBackend: Send + Sync {
    /// Human-readable backend name (e.g. "http").
    fn name(&self) -> &str;

    /// Liveness check.
    async fn health(&self) -> anyhow::Result<HealthStatus>;

    /// Topics known to the backend with their indexed chunk counts.
    async fn topics(&self) -> anyhow::Result<HashMap<String, u64>>;

    /// Fetch `request.count` questions for a topic and difficulty.
    async fn fetch_questions(&self, request: &QuestionRequest) -> anyhow::Result<Vec<Question>>;

    /// Fetch one random question, optionally filtered.
    async fn random_question(
        &self,
        topic: Option<&str>,
        difficulty: Option<Difficulty>,
    ) -> anyhow::Result<Question>;

    /// Exchange credentials for an access token.
    async fn login(&self, credentials: &Credentials) -> anyhow::Result<AuthToken>;

    /// Create an account and return its access token.
    async fn register(&self, registration: &Registration) -> anyhow::Result<AuthToken>;

    /// Record a finished quiz for the authenticated user.
    async fn submit_result(&self, token: &str, result: &QuizResult) -> anyhow::Result<()>;

    /// Aggregated statistics for the authenticated user.
    async fn user_stats(&self, token: &str) -> anyhow::Result<UserStats>;

    /// Admin: generate and store a question with the given parameters.
    async fn generate_question(
        &self,
        token: &str,
        request: &GenerateQuestionRequest,
    ) -> anyhow::Result<Question>;

    /// Admin: generate and store a random question.
    async fn generate_random_question(&self, token: &str) -> anyhow::Result<Question>;

    /// Admin: delete a stored question (used to reject a generated one).
    async fn delete_question(&self, token: &str, question_id: &str) -> anyhow::Result<()>;
}

// ---------------------------------------------------------------------------
// Request / response shapes
// ---------------------------------------------------------------------------

/// Response of the health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
}

/// Which questions to fetch for a quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRequest {
    pub topic: String,
    pub difficulty: Difficulty,
    pub count: usize,
}

/// Login form fields.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Registration payload.
#[derive(Clone, Serialize, Deserialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Access token returned by login and registration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub username: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthToken")
            .field("access_token", &"***")
            .field("token_type", &self.token_type)
            .field("username", &self.username)
            .finish()
    }
}

/// A finished quiz as the backend stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
    pub topic: String,
    pub difficulty: String,
    pub total_questions: u64,
    pub correct_answers: u64,
    /// RFC 3339 completion timestamp.
    pub completed_at: String,
}

/// Admin question-generation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateQuestionRequest {
    pub topic: String,
    pub difficulty: Difficulty,
    /// Raw question type as the backend expects it (e.g. "mcq").
    pub qtype: String,
}
