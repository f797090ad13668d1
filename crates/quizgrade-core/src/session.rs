//! Quiz session state machine.
//!
//! The front-end moves through a fixed set of screens. Each screen that
//! needs data carries it, so a results screen without an outcome or a
//! feedback screen without an active run cannot be constructed. Every
//! transition either succeeds or returns a [`TransitionError`] and leaves
//! the session untouched.

use std::collections::HashSet;
use std::mem;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TransitionError;
use crate::grading::{feedback, Feedback, GradingPolicy};
use crate::model::{AnswerSheet, Difficulty, Question, QuizMode, Response, ScenarioStep};
use crate::scoring::{grade_quiz, QuizOutcome};
use crate::traits::QuizResult;

/// Hours between two daily quizzes.
pub const DAILY_COOLDOWN_HOURS: i64 = 24;

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// Settings chosen on the home screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizConfig {
    pub mode: QuizMode,
    pub topic: String,
    pub difficulty: Difficulty,
}

/// A quiz in progress.
#[derive(Debug, Clone)]
pub struct QuizRun {
    pub config: QuizConfig,
    questions: Vec<Question>,
    current: usize,
    answers: AnswerSheet,
    pub started_at: DateTime<Utc>,
}

impl QuizRun {
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn answers(&self) -> &AnswerSheet {
        &self.answers
    }

    pub fn current_question(&self) -> &Question {
        &self.questions[self.current]
    }

    /// 1-based number of the current question.
    pub fn question_number(&self) -> usize {
        self.current + 1
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn is_last_question(&self) -> bool {
        self.current + 1 >= self.questions.len()
    }

    /// Progress through the quiz, 0-100.
    pub fn progress_percent(&self) -> u32 {
        (self.question_number() as f64 / self.total_questions() as f64 * 100.0).round() as u32
    }
}

/// A finished quiz.
#[derive(Debug, Clone)]
pub struct FinishedQuiz {
    pub run: QuizRun,
    pub outcome: QuizOutcome,
    pub completed_at: DateTime<Utc>,
}

impl FinishedQuiz {
    /// The shape the backend records for this quiz.
    pub fn to_quiz_result(&self) -> QuizResult {
        QuizResult {
            topic: self.run.config.topic.clone(),
            difficulty: self.run.config.difficulty.to_string(),
            total_questions: self.outcome.score.total_auto_graded as u64,
            correct_answers: self.outcome.score.correct_count as u64,
            completed_at: self.completed_at.to_rfc3339(),
        }
    }
}

/// The screens of the application.
#[derive(Debug, Clone)]
pub enum Screen {
    Auth,
    Home,
    Quiz(QuizRun),
    Feedback { run: QuizRun, feedback: Feedback },
    Results(FinishedQuiz),
    Stats,
    Admin,
}

impl Screen {
    /// Short name for messages.
    pub fn name(&self) -> &'static str {
        match self {
            Screen::Auth => "auth",
            Screen::Home => "home",
            Screen::Quiz(_) => "quiz",
            Screen::Feedback { .. } => "feedback",
            Screen::Results(_) => "results",
            Screen::Stats => "stats",
            Screen::Admin => "admin",
        }
    }
}

/// Tracks when the daily quiz may be taken again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyGate {
    #[serde(default)]
    pub last_completion: Option<DateTime<Utc>>,
}

impl DailyGate {
    /// Time left until the daily quiz reopens, `None` if it is open.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        let last = self.last_completion?;
        let reopens = last + Duration::hours(DAILY_COOLDOWN_HOURS);
        (reopens > now).then(|| reopens - now)
    }

    pub fn is_available(&self, now: DateTime<Utc>) -> bool {
        self.remaining(now).is_none()
    }

    pub fn record_completion(&mut self, at: DateTime<Utc>) {
        self.last_completion = Some(at);
    }
}

/// Step-by-step collection of responses to a scenario question.
#[derive(Debug, Clone)]
pub struct ScenarioProgress {
    steps: Vec<ScenarioStep>,
    responses: Vec<String>,
}

/// What happened after answering a scenario step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// More steps remain.
    Next,
    /// All steps answered; submit this response.
    Complete(Response),
}

impl ScenarioProgress {
    /// Start collecting answers; `None` if the question has no steps.
    pub fn new(question: &Question) -> Option<Self> {
        if question.steps.is_empty() {
            return None;
        }
        Some(Self {
            steps: question.steps.clone(),
            responses: Vec::with_capacity(question.steps.len()),
        })
    }

    pub fn current_step(&self) -> &ScenarioStep {
        &self.steps[self.responses.len().min(self.steps.len() - 1)]
    }

    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }

    /// Record the response to the current step.
    pub fn answer_step(&mut self, text: &str) -> Result<StepOutcome, TransitionError> {
        if text.trim().is_empty() {
            return Err(TransitionError::BlankAnswer);
        }
        if self.responses.len() < self.steps.len() {
            self.responses.push(text.to_string());
        }
        if self.responses.len() < self.steps.len() {
            Ok(StepOutcome::Next)
        } else {
            Ok(StepOutcome::Complete(Response::Steps(self.responses.clone())))
        }
    }
}

/// The application session: who is signed in and which screen is showing.
#[derive(Debug)]
pub struct QuizSession {
    user: Option<User>,
    screen: Screen,
    policy: GradingPolicy,
    daily: DailyGate,
}

impl QuizSession {
    pub fn new(policy: GradingPolicy) -> Self {
        Self::with_daily_gate(policy, DailyGate::default())
    }

    /// Resume with a previously persisted daily gate.
    pub fn with_daily_gate(policy: GradingPolicy, daily: DailyGate) -> Self {
        Self {
            user: None,
            screen: Screen::Auth,
            policy,
            daily,
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn daily_gate(&self) -> &DailyGate {
        &self.daily
    }

    pub fn policy(&self) -> &GradingPolicy {
        &self.policy
    }

    /// The question currently on screen (quiz or feedback).
    pub fn current_question(&self) -> Option<&Question> {
        match &self.screen {
            Screen::Quiz(run) | Screen::Feedback { run, .. } => Some(run.current_question()),
            _ => None,
        }
    }

    pub fn finished(&self) -> Option<&FinishedQuiz> {
        match &self.screen {
            Screen::Results(finished) => Some(finished),
            _ => None,
        }
    }

    fn invalid(&self, action: &'static str) -> TransitionError {
        TransitionError::InvalidTransition {
            action,
            screen: self.screen.name(),
        }
    }

    /// Auth → Home.
    pub fn sign_in(&mut self, user: User) -> Result<(), TransitionError> {
        if !matches!(self.screen, Screen::Auth) {
            return Err(self.invalid("sign in"));
        }
        tracing::info!(user = %user.username, "signed in");
        self.user = Some(user);
        self.screen = Screen::Home;
        Ok(())
    }

    /// Any signed-in screen → Auth. Discards an active run.
    pub fn sign_out(&mut self) -> Result<(), TransitionError> {
        if matches!(self.screen, Screen::Auth) {
            return Err(self.invalid("sign out"));
        }
        self.user = None;
        self.screen = Screen::Auth;
        Ok(())
    }

    /// Home → Quiz.
    pub fn start_quiz(
        &mut self,
        config: QuizConfig,
        questions: Vec<Question>,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        if !matches!(self.screen, Screen::Home) {
            return Err(self.invalid("start a quiz"));
        }
        if questions.is_empty() {
            return Err(TransitionError::EmptyQuiz);
        }
        let mut seen = HashSet::new();
        if let Some(dup) = questions.iter().find(|q| !seen.insert(q.id.as_str())) {
            return Err(TransitionError::DuplicateQuestion { id: dup.id.clone() });
        }
        if config.mode == QuizMode::Daily {
            if let Some(remaining) = self.daily.remaining(now) {
                return Err(TransitionError::DailyUnavailable {
                    remaining_minutes: remaining.num_minutes(),
                });
            }
        }
        tracing::info!(
            mode = %config.mode,
            topic = %config.topic,
            questions = questions.len(),
            "quiz started"
        );
        self.screen = Screen::Quiz(QuizRun {
            config,
            questions,
            current: 0,
            answers: AnswerSheet::new(),
            started_at: now,
        });
        Ok(())
    }

    /// Quiz → Feedback. The response is recorded and never changed.
    pub fn submit_answer(&mut self, response: Response) -> Result<Feedback, TransitionError> {
        if matches!(self.screen, Screen::Quiz(_)) && response.is_blank() {
            return Err(TransitionError::BlankAnswer);
        }
        let mut run = match mem::replace(&mut self.screen, Screen::Home) {
            Screen::Quiz(run) => run,
            other => {
                self.screen = other;
                return Err(self.invalid("submit an answer"));
            }
        };
        let question = run.current_question();
        let result = feedback(question, Some(&response), &self.policy);
        let id = question.id.clone();
        run.answers.insert(id, response);
        self.screen = Screen::Feedback {
            run,
            feedback: result.clone(),
        };
        Ok(result)
    }

    /// Feedback → next Quiz question, or Results after the last one.
    pub fn next(&mut self, now: DateTime<Utc>) -> Result<(), TransitionError> {
        let mut run = match mem::replace(&mut self.screen, Screen::Home) {
            Screen::Feedback { run, .. } => run,
            other => {
                self.screen = other;
                return Err(self.invalid("advance"));
            }
        };

        if !run.is_last_question() {
            run.current += 1;
            self.screen = Screen::Quiz(run);
            return Ok(());
        }

        let outcome = grade_quiz(&run.questions, &run.answers, &self.policy);
        if run.config.mode == QuizMode::Daily {
            self.daily.record_completion(now);
        }
        tracing::info!(
            percentage = outcome.score.percentage,
            status = %outcome.score.status,
            "quiz finished"
        );
        self.screen = Screen::Results(FinishedQuiz {
            run,
            outcome,
            completed_at: now,
        });
        Ok(())
    }

    /// Quiz, Feedback or Results → Home, discarding the run.
    pub fn restart(&mut self) -> Result<(), TransitionError> {
        match self.screen {
            Screen::Quiz(_) | Screen::Feedback { .. } | Screen::Results(_) => {
                self.screen = Screen::Home;
                Ok(())
            }
            _ => Err(self.invalid("restart")),
        }
    }

    /// Home → Stats.
    pub fn open_stats(&mut self) -> Result<(), TransitionError> {
        if !matches!(self.screen, Screen::Home) {
            return Err(self.invalid("open statistics"));
        }
        self.screen = Screen::Stats;
        Ok(())
    }

    /// Home → Admin, admins only.
    pub fn open_admin(&mut self) -> Result<(), TransitionError> {
        if !matches!(self.screen, Screen::Home) {
            return Err(self.invalid("open the admin panel"));
        }
        if !self.user.as_ref().is_some_and(|u| u.is_admin) {
            return Err(TransitionError::NotAdmin);
        }
        self.screen = Screen::Admin;
        Ok(())
    }

    /// Stats or Admin → Home.
    pub fn back(&mut self) -> Result<(), TransitionError> {
        match self.screen {
            Screen::Stats | Screen::Admin => {
                self.screen = Screen::Home;
                Ok(())
            }
            _ => Err(self.invalid("go back")),
        }
    }
}
