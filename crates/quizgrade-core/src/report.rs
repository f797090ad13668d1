//! Grade report types with JSON persistence and attempt comparison.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::QuizSet;
use crate::scoring::QuizOutcome;
use crate::traits::QuizResult;

/// A graded attempt at one quiz.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the attempt was graded.
    pub created_at: DateTime<Utc>,
    pub quiz: QuizSummary,
    pub outcome: QuizOutcome,
}

/// Summary of a quiz set (without the questions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    pub question_count: usize,
}

impl From<&QuizSet> for QuizSummary {
    fn from(set: &QuizSet) -> Self {
        Self {
            id: set.id.clone(),
            name: set.name.clone(),
            topic: set.topic.clone(),
            difficulty: set.difficulty.map(|d| d.to_string()),
            question_count: set.questions.len(),
        }
    }
}

impl GradeReport {
    pub fn new(set: &QuizSet, outcome: QuizOutcome) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            quiz: QuizSummary::from(set),
            outcome,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: GradeReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// The record submitted to the backend for this attempt.
    ///
    /// Only auto-graded questions count towards the totals.
    pub fn to_quiz_result(&self) -> QuizResult {
        QuizResult {
            topic: self
                .quiz
                .topic
                .clone()
                .unwrap_or_else(|| self.quiz.id.clone()),
            difficulty: self
                .quiz
                .difficulty
                .clone()
                .unwrap_or_else(|| "beginner".to_string()),
            total_questions: self.outcome.score.total_auto_graded as u64,
            correct_answers: self.outcome.score.correct_count as u64,
            completed_at: self.created_at.to_rfc3339(),
        }
    }

    /// Compare this attempt against an earlier one, question by question.
    pub fn compare(&self, baseline: &GradeReport) -> AttemptComparison {
        let verdicts = |report: &GradeReport| -> HashMap<String, bool> {
            report
                .outcome
                .verdicts
                .iter()
                .map(|v| (v.question_id.clone(), v.correct))
                .collect()
        };
        let before = verdicts(baseline);
        let after = verdicts(self);

        let mut newly_incorrect = Vec::new();
        let mut newly_correct = Vec::new();
        let mut unchanged = 0usize;
        let mut new_questions = 0usize;

        for (id, &now) in &after {
            match before.get(id) {
                Some(&was) if was && !now => newly_incorrect.push(id.clone()),
                Some(&was) if !was && now => newly_correct.push(id.clone()),
                Some(_) => unchanged += 1,
                None => new_questions += 1,
            }
        }
        newly_incorrect.sort();
        newly_correct.sort();

        let removed_questions = before.keys().filter(|k| !after.contains_key(*k)).count();

        AttemptComparison {
            baseline_percentage: baseline.outcome.score.percentage,
            current_percentage: self.outcome.score.percentage,
            newly_incorrect,
            newly_correct,
            unchanged,
            new_questions,
            removed_questions,
        }
    }
}

/// Result of comparing two attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptComparison {
    pub baseline_percentage: u32,
    pub current_percentage: u32,
    /// Questions answered correctly before but not now.
    pub newly_incorrect: Vec<String>,
    /// Questions answered incorrectly before but correctly now.
    pub newly_correct: Vec<String>,
    pub unchanged: usize,
    /// Questions in the current attempt only.
    pub new_questions: usize,
    /// Questions in the baseline only.
    pub removed_questions: usize,
}

impl AttemptComparison {
    /// Signed change in percentage points.
    pub fn delta(&self) -> i64 {
        self.current_percentage as i64 - self.baseline_percentage as i64
    }

    pub fn has_regressions(&self) -> bool {
        !self.newly_incorrect.is_empty()
    }

    /// Format the comparison as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Summary:** {}% -> {}% ({:+} points), {} regressions, {} improvements, {} unchanged\n\n",
            self.baseline_percentage,
            self.current_percentage,
            self.delta(),
            self.newly_incorrect.len(),
            self.newly_correct.len(),
            self.unchanged
        ));

        if !self.newly_incorrect.is_empty() {
            md.push_str("### Regressions\n\n");
            for id in &self.newly_incorrect {
                md.push_str(&format!("- {id}\n"));
            }
            md.push('\n');
        }

        if !self.newly_correct.is_empty() {
            md.push_str("### Improvements\n\n");
            for id in &self.newly_correct {
                md.push_str(&format!("- {id}\n"));
            }
        }

        md
    }
}
