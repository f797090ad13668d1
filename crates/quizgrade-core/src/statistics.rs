//! Per-user statistics as reported by the backend.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Rounded accuracy percentage, 0 when `total` is 0.
pub fn accuracy(correct: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    (correct as f64 / total as f64 * 100.0).round() as u32
}

/// Correct/total counts for one topic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicStats {
    #[serde(default)]
    pub correct: u64,
    #[serde(default)]
    pub total: u64,
}

impl TopicStats {
    pub fn accuracy(&self) -> u32 {
        accuracy(self.correct, self.total)
    }
}

/// Aggregated history of one user's quizzes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    #[serde(default)]
    pub total_quizzes: u64,
    #[serde(default)]
    pub total_questions: u64,
    #[serde(default)]
    pub correct_answers: u64,
    #[serde(default)]
    pub last_quiz_date: Option<String>,
    #[serde(default)]
    pub topic_stats: HashMap<String, TopicStats>,
}

impl UserStats {
    /// Overall accuracy across every quiz.
    pub fn accuracy(&self) -> u32 {
        accuracy(self.correct_answers, self.total_questions)
    }

    /// Accuracy for one topic, if the user has played it.
    pub fn topic_accuracy(&self, topic: &str) -> Option<u32> {
        self.topic_stats.get(topic).map(TopicStats::accuracy)
    }

    /// Topics sorted by name, for stable display.
    pub fn topics_sorted(&self) -> Vec<(&str, &TopicStats)> {
        let mut topics: Vec<(&str, &TopicStats)> = self
            .topic_stats
            .iter()
            .map(|(name, stats)| (name.as_str(), stats))
            .collect();
        topics.sort_by(|a, b| a.0.cmp(b.0));
        topics
    }

    /// Fold one finished quiz into the totals.
    pub fn record(&mut self, topic: &str, correct: u64, total: u64, completed_at: &str) {
        self.total_quizzes += 1;
        self.total_questions += total;
        self.correct_answers += correct;
        let newer = match self.last_quiz_date.as_deref() {
            Some(last) => completed_at > last,
            None => true,
        };
        if newer {
            self.last_quiz_date = Some(completed_at.to_string());
        }
        let entry = self.topic_stats.entry(topic.to_string()).or_default();
        entry.correct += correct;
        entry.total += total;
    }
}
