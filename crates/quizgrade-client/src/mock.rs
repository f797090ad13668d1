//! In-memory backend for offline use and tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use quizgrade_core::model::{make_ids_unique, Difficulty, Question, QuestionKind};
use quizgrade_core::statistics::UserStats;
use quizgrade_core::traits::{
    AuthToken, Credentials, GenerateQuestionRequest, HealthStatus, QuestionRequest, QuizBackend,
    QuizResult, Registration,
};

use crate::error::BackendError;

const MOCK_TOKEN: &str = "mock-token";

/// A backend that serves a fixed question bank and keeps results in memory.
///
/// Questions are handed out round-robin. Any non-empty username/password
/// pair logs in; submitted results feed [`QuizBackend::user_stats`].
pub struct MockBackend {
    questions: Mutex<Vec<Question>>,
    next: AtomicU32,
    call_count: AtomicU32,
    submissions: Mutex<Vec<QuizResult>>,
    admins: Vec<String>,
}

impl MockBackend {
    /// A mock seeded with the sample question bank.
    pub fn new() -> Self {
        Self::with_questions(sample_questions())
    }

    pub fn with_questions(questions: Vec<Question>) -> Self {
        Self {
            questions: Mutex::new(questions),
            next: AtomicU32::new(0),
            call_count: AtomicU32::new(0),
            submissions: Mutex::new(Vec::new()),
            admins: vec!["admin".to_string()],
        }
    }

    /// Number of backend calls made.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Results submitted so far.
    pub fn submissions(&self) -> Vec<QuizResult> {
        self.submissions
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    fn record_call(&self) {
        self.call_count.fetch_add(1, Ordering::Relaxed);
    }

    fn authorize(&self, token: &str) -> Result<(), BackendError> {
        if token.is_empty() {
            return Err(BackendError::Unauthorized(
                "Could not validate credentials".into(),
            ));
        }
        Ok(())
    }

    fn authorize_admin(&self, token: &str) -> Result<(), BackendError> {
        self.authorize(token)?;
        let is_admin = self
            .admins
            .iter()
            .any(|name| token == format!("{MOCK_TOKEN}:{name}"));
        if !is_admin {
            return Err(BackendError::Forbidden("admin privileges required".into()));
        }
        Ok(())
    }

    fn issue_token(&self, username: &str) -> AuthToken {
        AuthToken {
            access_token: format!("{MOCK_TOKEN}:{username}"),
            token_type: "bearer".into(),
            username: username.to_string(),
        }
    }

    fn pick(
        &self,
        topic: Option<&str>,
        difficulty: Option<Difficulty>,
    ) -> Result<Question, BackendError> {
        let questions = self
            .questions
            .lock()
            .map_err(|_| BackendError::InvalidResponse("question bank poisoned".into()))?;

        let level = difficulty.map(|d| d.to_string());
        let matching: Vec<&Question> = questions
            .iter()
            .filter(|q| topic.is_none_or(|t| q.topic.as_deref().is_none_or(|qt| qt == t)))
            .filter(|q| {
                level
                    .as_deref()
                    .is_none_or(|l| q.level.as_deref().is_none_or(|ql| ql == l))
            })
            .collect();

        if matching.is_empty() {
            return Err(BackendError::NoQuestionAvailable(
                "no matching question in the mock bank".into(),
            ));
        }
        let index = self.next.fetch_add(1, Ordering::Relaxed) as usize % matching.len();
        Ok(matching[index].clone())
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// The three sample questions served in mock mode.
pub fn sample_questions() -> Vec<Question> {
    let mut use_state = Question::multiple_choice(
        "mock-1",
        "What is the primary purpose of React's useState hook?",
        vec![
            "To manage component state".into(),
            "To fetch data from APIs".into(),
            "To style components".into(),
            "To handle routing".into(),
        ],
        "To manage component state",
    )
    .with_rationale("useState lets function components hold state between renders.");
    use_state.topic = Some("React".into());
    use_state.level = Some("beginner".into());

    let mut compiled = Question::true_false("mock-2", "JavaScript is a compiled language.", false)
        .with_rationale("JavaScript is interpreted or JIT-compiled at runtime.");
    compiled.topic = Some("JavaScript".into());
    compiled.level = Some("beginner".into());

    let mut api = Question::short_answer(
        "mock-3",
        "What does API stand for?",
        "Application Programming Interface",
    )
    .with_rationale("An API defines how software components talk to each other.");
    api.topic = Some("Web Development".into());
    api.level = Some("beginner".into());

    vec![use_state, compiled, api]
}

#[async_trait]
impl QuizBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn health(&self) -> anyhow::Result<HealthStatus> {
        self.record_call();
        Ok(HealthStatus {
            status: "ok (mock)".into(),
            service: Some("mock".into()),
        })
    }

    async fn topics(&self) -> anyhow::Result<HashMap<String, u64>> {
        self.record_call();
        Ok(HashMap::from([
            ("React".to_string(), 5),
            ("JavaScript".to_string(), 8),
            ("Web Development".to_string(), 3),
            ("TypeScript".to_string(), 4),
        ]))
    }

    async fn fetch_questions(&self, request: &QuestionRequest) -> anyhow::Result<Vec<Question>> {
        self.record_call();
        let bank = self
            .questions
            .lock()
            .map_err(|_| BackendError::InvalidResponse("question bank poisoned".into()))?
            .clone();
        if bank.is_empty() {
            return Err(BackendError::NoQuestionAvailable("mock bank is empty".into()).into());
        }
        // topic filter ignored in mock mode
        let mut questions: Vec<Question> =
            bank.iter().cycle().take(request.count).cloned().collect();
        make_ids_unique(&mut questions);
        Ok(questions)
    }

    async fn random_question(
        &self,
        topic: Option<&str>,
        difficulty: Option<Difficulty>,
    ) -> anyhow::Result<Question> {
        self.record_call();
        Ok(self.pick(topic, difficulty)?)
    }

    async fn login(&self, credentials: &Credentials) -> anyhow::Result<AuthToken> {
        self.record_call();
        if credentials.username.trim().is_empty() || credentials.password.is_empty() {
            return Err(BackendError::Unauthorized("wrong username or password".into()).into());
        }
        Ok(self.issue_token(&credentials.username))
    }

    async fn register(&self, registration: &Registration) -> anyhow::Result<AuthToken> {
        self.record_call();
        if registration.username.trim().is_empty() || registration.password.is_empty() {
            return Err(BackendError::ApiError {
                status: 400,
                message: "username and password are required".into(),
            }
            .into());
        }
        Ok(self.issue_token(&registration.username))
    }

    async fn submit_result(&self, token: &str, result: &QuizResult) -> anyhow::Result<()> {
        self.record_call();
        self.authorize(token)?;
        self.submissions
            .lock()
            .map_err(|_| BackendError::InvalidResponse("submission log poisoned".into()))?
            .push(result.clone());
        Ok(())
    }

    async fn user_stats(&self, token: &str) -> anyhow::Result<UserStats> {
        self.record_call();
        self.authorize(token)?;
        let mut stats = UserStats::default();
        for r in self.submissions() {
            stats.record(&r.topic, r.correct_answers, r.total_questions, &r.completed_at);
        }
        Ok(stats)
    }

    async fn generate_question(
        &self,
        token: &str,
        request: &GenerateQuestionRequest,
    ) -> anyhow::Result<Question> {
        self.record_call();
        self.authorize_admin(token)?;
        let id = format!("mock-gen-{}", self.next.fetch_add(1, Ordering::Relaxed));
        let topic = &request.topic;
        let mut question = match QuestionKind::from_raw_or_manual(&request.qtype) {
            QuestionKind::MultipleChoice => Question::multiple_choice(
                &id,
                &format!("Which statement about {topic} is accurate?"),
                vec![
                    format!("{topic} is covered by the docs"),
                    format!("{topic} is undocumented"),
                ],
                &format!("{topic} is covered by the docs"),
            ),
            QuestionKind::TrueFalse => {
                Question::true_false(&id, &format!("{topic} is covered by the docs."), true)
            }
            QuestionKind::ShortAnswer => {
                Question::short_answer(&id, &format!("Name the topic of this question ({topic})."), topic)
            }
            QuestionKind::OpenEnded => {
                Question::open_ended(&id, &format!("Describe one key idea of {topic}."), "")
            }
            QuestionKind::Scenario => Question::scenario(
                &id,
                &format!("A customer asks about {topic}."),
                vec![
                    ("What do you check first?".into(), "the documentation".into()),
                    ("What do you reply?".into(), "a summary".into()),
                ],
            ),
        };
        question.topic = Some(request.topic.clone());
        question.level = Some(request.difficulty.to_string());
        self.questions
            .lock()
            .map_err(|_| BackendError::InvalidResponse("question bank poisoned".into()))?
            .push(question.clone());
        Ok(question)
    }

    async fn generate_random_question(&self, token: &str) -> anyhow::Result<Question> {
        self.authorize_admin(token)?;
        let request = GenerateQuestionRequest {
            topic: "Web Development".into(),
            difficulty: Difficulty::Beginner,
            qtype: "short_answer".into(),
        };
        self.generate_question(token, &request).await
    }

    async fn delete_question(&self, token: &str, question_id: &str) -> anyhow::Result<()> {
        self.record_call();
        self.authorize_admin(token)?;
        let mut questions = self
            .questions
            .lock()
            .map_err(|_| BackendError::InvalidResponse("question bank poisoned".into()))?;
        let before = questions.len();
        questions.retain(|q| q.id != question_id);
        if questions.len() == before {
            return Err(BackendError::NotFound("Question not found".into()).into());
        }
        Ok(())
    }
}
