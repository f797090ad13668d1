//! Quiz scoring.
//!
//! Aggregates per-question verdicts into a [`Score`]. Only auto-graded
//! questions contribute; manual-review questions are returned alongside the
//! score with their raw answers and no correctness attached.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::grading::{classify, evaluate, is_correct, GradingPolicy};
use crate::model::{AnswerSheet, Question, QuestionKind, Response};

/// Status label derived from the percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Excellent,
    Good,
    KeepPracticing,
}

impl Status {
    /// Map a percentage onto the policy's status bands.
    pub fn for_percentage(percentage: u32, policy: &GradingPolicy) -> Self {
        if percentage >= policy.excellent_threshold {
            Status::Excellent
        } else if percentage >= policy.good_threshold {
            Status::Good
        } else {
            Status::KeepPracticing
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Excellent => write!(f, "Excellent"),
            Status::Good => write!(f, "Good"),
            Status::KeepPracticing => write!(f, "Keep Practicing"),
        }
    }
}

/// Aggregate result over the auto-graded questions of one quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub correct_count: usize,
    pub incorrect_count: usize,
    pub total_auto_graded: usize,
    /// Rounded `correct / total * 100`, 0 when nothing was auto-graded.
    pub percentage: u32,
    pub status: Status,
}

impl Score {
    fn tally(correct_count: usize, total: usize, policy: &GradingPolicy) -> Self {
        let percentage = if total == 0 {
            0
        } else {
            (correct_count as f64 / total as f64 * 100.0).round() as u32
        };
        Self {
            correct_count,
            incorrect_count: total - correct_count,
            total_auto_graded: total,
            percentage,
            status: Status::for_percentage(percentage, policy),
        }
    }
}

/// Score a set of auto-graded questions against the submitted answers.
///
/// Every question passed in is graded with [`is_correct`]; callers pass the
/// `auto_graded` half of [`classify`].
pub fn score(auto_graded: &[&Question], answers: &AnswerSheet, policy: &GradingPolicy) -> Score {
    let correct = auto_graded
        .iter()
        .filter(|q| is_correct(q, answers.get(&q.id), policy))
        .count();
    Score::tally(correct, auto_graded.len(), policy)
}

/// Per-question verdict for an auto-graded question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub question_id: String,
    pub kind: QuestionKind,
    pub correct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
}

/// A manual-review question paired with what the user submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualReviewItem {
    pub question: Question,
    #[serde(default)]
    pub answer: Option<Response>,
}

/// Everything the results screen needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizOutcome {
    pub score: Score,
    /// One verdict per auto-graded question, in quiz order.
    pub verdicts: Vec<Verdict>,
    pub manual_review: Vec<ManualReviewItem>,
}

/// Grade a whole quiz: classify, judge every auto-graded answer, and score.
pub fn grade_quiz(questions: &[Question], answers: &AnswerSheet, policy: &GradingPolicy) -> QuizOutcome {
    let classification = classify(questions);

    let verdicts: Vec<Verdict> = classification
        .auto_graded
        .iter()
        .map(|q| {
            let eval = evaluate(q, answers.get(&q.id), policy);
            Verdict {
                question_id: q.id.clone(),
                kind: q.kind,
                correct: eval.correct,
                similarity: eval.similarity,
            }
        })
        .collect();

    let correct = verdicts.iter().filter(|v| v.correct).count();
    let score = Score::tally(correct, verdicts.len(), policy);

    let manual_review = classification
        .manual_review
        .into_iter()
        .map(|q| ManualReviewItem {
            question: q.clone(),
            answer: answers.get(&q.id).cloned(),
        })
        .collect();

    tracing::debug!(
        correct = score.correct_count,
        total = score.total_auto_graded,
        percentage = score.percentage,
        "quiz graded"
    );

    QuizOutcome {
        score,
        verdicts,
        manual_review,
    }
}
