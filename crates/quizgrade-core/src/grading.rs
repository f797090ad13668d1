//! Answer grading.
//!
//! Decides whether a single response is correct. Multiple-choice and
//! true/false answers are compared exactly after [`normalize`]; short
//! answers are compared by Levenshtein similarity against a threshold;
//! scenario answers are compared as sets of normalized step responses.

use serde::{Deserialize, Serialize};

use crate::model::{ExpectedAnswer, Question, QuestionKind, Response};

/// Minimum similarity (0-100) for a short answer to count as correct.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 85.0;
/// Minimum percentage for the "Excellent" status.
pub const DEFAULT_EXCELLENT_THRESHOLD: u32 = 80;
/// Minimum percentage for the "Good" status.
pub const DEFAULT_GOOD_THRESHOLD: u32 = 60;

/// Characters removed by [`normalize`].
const STRIPPED_PUNCTUATION: &[char] = &['.', ',', '!', '?', ';', ':'];

/// Tunable grading thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingPolicy {
    /// Short-answer similarity threshold, inclusive.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    /// Percentage at or above which a quiz is "Excellent".
    #[serde(default = "default_excellent_threshold")]
    pub excellent_threshold: u32,
    /// Percentage at or above which a quiz is "Good".
    #[serde(default = "default_good_threshold")]
    pub good_threshold: u32,
}

fn default_similarity_threshold() -> f64 {
    DEFAULT_SIMILARITY_THRESHOLD
}
fn default_excellent_threshold() -> u32 {
    DEFAULT_EXCELLENT_THRESHOLD
}
fn default_good_threshold() -> u32 {
    DEFAULT_GOOD_THRESHOLD
}

impl Default for GradingPolicy {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            excellent_threshold: DEFAULT_EXCELLENT_THRESHOLD,
            good_threshold: DEFAULT_GOOD_THRESHOLD,
        }
    }
}

/// Canonicalize a text answer before comparison.
///
/// Lower-cases, strips `. , ! ? ; :`, trims, and collapses whitespace runs
/// to a single space.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped: String = lowered
        .chars()
        .filter(|c| !STRIPPED_PUNCTUATION.contains(c))
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Levenshtein edit distance over Unicode scalar values.
///
/// Classic `(len(a)+1) x (len(b)+1)` dynamic-programming table with unit
/// cost for insertion, deletion, and substitution.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut table = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for (i, row) in table.iter_mut().enumerate() {
        row[0] = i;
    }
    for (j, cell) in table[0].iter_mut().enumerate() {
        *cell = j;
    }

    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            table[i][j] = (table[i - 1][j] + 1)
                .min(table[i][j - 1] + 1)
                .min(table[i - 1][j - 1] + cost);
        }
    }

    table[a.len()][b.len()]
}

/// Similarity of two already-normalized strings on a 0-100 scale.
///
/// `(max_len - distance) / max_len * 100`, and exactly 100 when the strings
/// are identical (including both empty).
pub fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 100.0;
    }
    let max_len = a.chars().count().max(b.chars().count());
    let distance = levenshtein(a, b);
    // Multiply before dividing so exact ratios like 17/20 land on 85.0.
    (max_len - distance) as f64 * 100.0 / max_len as f64
}

/// Result of grading one response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub correct: bool,
    /// Similarity score, only for short answers.
    pub similarity: Option<f64>,
}

impl Evaluation {
    fn exact(correct: bool) -> Self {
        Self {
            correct,
            similarity: None,
        }
    }
}

/// Grade one response, returning the similarity where it applies.
pub fn evaluate(
    question: &Question,
    answer: Option<&Response>,
    policy: &GradingPolicy,
) -> Evaluation {
    let Some(answer) = answer.filter(|a| !a.is_blank()) else {
        return Evaluation::exact(false);
    };

    if !question.kind.is_auto_graded() {
        tracing::debug!(
            question = %question.id,
            kind = %question.kind,
            "grading a manual-review question"
        );
    }

    match (&question.correct_answer, answer) {
        (ExpectedAnswer::Steps(expected), Response::Steps(given)) => {
            Evaluation::exact(same_step_set(expected, given))
        }
        (ExpectedAnswer::Steps(_), Response::Text(_))
        | (ExpectedAnswer::Single(_), Response::Steps(_)) => Evaluation::exact(false),
        (ExpectedAnswer::Single(expected), Response::Text(given)) => {
            let expected = normalize(expected);
            let given = normalize(given);
            match question.kind {
                QuestionKind::ShortAnswer => {
                    let score = similarity(&given, &expected);
                    let correct = score >= policy.similarity_threshold;
                    tracing::debug!(question = %question.id, similarity = score, correct);
                    Evaluation {
                        correct,
                        similarity: Some(score),
                    }
                }
                _ => Evaluation::exact(given == expected),
            }
        }
    }
}

/// Whether `answer` is a correct response to `question`.
///
/// An absent or blank answer is never correct.
pub fn is_correct(question: &Question, answer: Option<&Response>, policy: &GradingPolicy) -> bool {
    evaluate(question, answer, policy).correct
}

/// Compare two step sequences ignoring order.
fn same_step_set(expected: &[String], given: &[String]) -> bool {
    if expected.len() != given.len() {
        return false;
    }
    let mut expected: Vec<String> = expected.iter().map(|s| normalize(s)).collect();
    let mut given: Vec<String> = given.iter().map(|s| normalize(s)).collect();
    expected.sort();
    given.sort();
    expected == given
}

/// The question set split by grading strategy.
#[derive(Debug, Clone, Default)]
pub struct Classification<'a> {
    pub auto_graded: Vec<&'a Question>,
    pub manual_review: Vec<&'a Question>,
}

/// Partition questions into auto-graded and manual-review subsets,
/// preserving input order within each.
pub fn classify(questions: &[Question]) -> Classification<'_> {
    let (auto_graded, manual_review): (Vec<&Question>, Vec<&Question>) =
        questions.iter().partition(|q| q.kind.is_auto_graded());
    Classification {
        auto_graded,
        manual_review,
    }
}

/// What the feedback screen shows after one answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Feedback {
    Correct,
    Incorrect { expected: String },
    PendingReview,
}

/// Immediate feedback for one answered question.
pub fn feedback(question: &Question, answer: Option<&Response>, policy: &GradingPolicy) -> Feedback {
    if !question.kind.is_auto_graded() {
        return Feedback::PendingReview;
    }
    if is_correct(question, answer, policy) {
        Feedback::Correct
    } else {
        Feedback::Incorrect {
            expected: question.correct_answer.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Response {
        Response::Text(s.to_string())
    }

    fn steps(items: &[&str]) -> Response {
        Response::Steps(items.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn normalize_strips_case_punctuation_and_spacing() {
        assert_eq!(normalize("  Hello,   World!  "), "hello world");
        assert_eq!(normalize("A . B"), "a b");
        assert_eq!(normalize("what?;:"), "what");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("tabs\tand\nnewlines"), "tabs and newlines");
    }

    #[test]
    fn normalize_is_idempotent() {
        for s in [
            "  Application  Programming Interface! ",
            "a . , b",
            "ÇOKTAN   Seçmeli?",
            "",
            "   ",
            "x;y:z",
        ] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn levenshtein_textbook_values() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("flaw", "lawn"), 2);
        assert_eq!(levenshtein("ğüş", "gus"), 3);
        assert_eq!(levenshtein("ğüş", "güş"), 1);
    }

    #[test]
    fn levenshtein_symmetric_and_zero_on_self() {
        let pairs = [("kitten", "sitting"), ("", "x"), ("react", "redact"), ("ab", "ba")];
        for (a, b) in pairs {
            assert_eq!(levenshtein(a, b), levenshtein(b, a));
            assert_eq!(levenshtein(a, a), 0);
            assert_eq!(levenshtein(b, b), 0);
        }
    }

    #[test]
    fn similarity_of_identical_strings_is_100() {
        assert_eq!(similarity("api", "api"), 100.0);
        assert_eq!(similarity("", ""), 100.0);
    }

    #[test]
    fn similarity_of_disjoint_strings_is_0() {
        assert_eq!(similarity("abc", "xyz"), 0.0);
        assert_eq!(similarity("", "abc"), 0.0);
    }

    #[test]
    fn choice_grading_ignores_case_and_whitespace() {
        let policy = GradingPolicy::default();
        let q = Question::true_false("tf", "The sky is blue.", true);
        assert!(is_correct(&q, Some(&text(" TRUE ")), &policy));
        assert_eq!(
            is_correct(&q, Some(&text(" TRUE ")), &policy),
            is_correct(&q, Some(&text("true")), &policy)
        );
        assert!(!is_correct(&q, Some(&text("false")), &policy));

        let mcq = Question::multiple_choice(
            "m",
            "Capital of France?",
            vec!["Paris".into(), "Lyon".into()],
            "Paris",
        );
        assert!(is_correct(&mcq, Some(&text("paris.")), &policy));
        // choices are exact, no fuzzy tolerance
        assert!(!is_correct(&mcq, Some(&text("Pariss")), &policy));
    }

    #[test]
    fn missing_or_blank_answer_is_incorrect() {
        let policy = GradingPolicy::default();
        let q = Question::short_answer("s", "?", "anything");
        assert!(!is_correct(&q, None, &policy));
        assert!(!is_correct(&q, Some(&text("   ")), &policy));
        assert!(!is_correct(&q, Some(&steps(&[])), &policy));
    }

    #[test]
    fn short_answer_threshold_is_inclusive_at_85() {
        let policy = GradingPolicy::default();

        // 20 chars, 3 edits: (20 - 3) * 100 / 20 = 85
        let expected = "abcdefghijklmnopqrst";
        let at_85 = "xyzdefghijklmnopqrst";
        assert_eq!(similarity(at_85, expected), 85.0);
        let q = Question::short_answer("s85", "?", expected);
        assert!(is_correct(&q, Some(&text(at_85)), &policy));

        // 25 chars, 4 edits: (25 - 4) * 100 / 25 = 84
        let expected = "abcdefghijklmnopqrstuvwxy";
        let at_84 = "wxyzefghijklmnopqrstuvwxy";
        assert_eq!(similarity(at_84, expected), 84.0);
        let q = Question::short_answer("s84", "?", expected);
        assert!(!is_correct(&q, Some(&text(at_84)), &policy));
    }

    #[test]
    fn short_answer_tolerates_small_typos() {
        let policy = GradingPolicy::default();
        let q = Question::short_answer("api", "What does API stand for?", "Application Programming Interface");
        assert!(is_correct(&q, Some(&text("application programming interface!")), &policy));
        assert!(is_correct(&q, Some(&text("Aplication Programing Interface")), &policy));
        assert!(!is_correct(&q, Some(&text("Advanced Program Integration")), &policy));

        let eval = evaluate(&q, Some(&text("application programming interface!")), &policy);
        assert_eq!(eval.similarity, Some(100.0));
    }

    #[test]
    fn custom_threshold_is_respected() {
        let strict = GradingPolicy {
            similarity_threshold: 100.0,
            ..Default::default()
        };
        let q = Question::short_answer("api", "?", "interface");
        assert!(!is_correct(&q, Some(&text("interfase")), &strict));
        assert!(is_correct(&q, Some(&text("Interface")), &strict));
    }

    #[test]
    fn scenario_ignores_response_order() {
        let policy = GradingPolicy::default();
        let q = Question::scenario(
            "sc",
            "?",
            vec![
                ("one".into(), "alpha".into()),
                ("two".into(), "beta".into()),
            ],
        );
        assert!(is_correct(&q, Some(&steps(&["beta", "alpha"])), &policy));
        assert!(is_correct(&q, Some(&steps(&[" Alpha.", "BETA"])), &policy));
        assert!(!is_correct(&q, Some(&steps(&["alpha"])), &policy));
        assert!(!is_correct(&q, Some(&steps(&["alpha", "gamma"])), &policy));
        assert!(!is_correct(&q, Some(&text("alpha beta")), &policy));
    }

    #[test]
    fn steps_answer_to_single_answer_question_is_incorrect() {
        let policy = GradingPolicy::default();
        let q = Question::short_answer("s", "?", "alpha");
        assert!(!is_correct(&q, Some(&steps(&["alpha"])), &policy));
    }

    #[test]
    fn classify_partitions_by_kind() {
        let questions = vec![
            Question::multiple_choice("1", "?", vec!["a".into()], "a"),
            Question::open_ended("2", "?", ""),
            Question::true_false("3", "?", true),
            Question::scenario("4", "?", vec![("p".into(), "e".into())]),
            Question::short_answer("5", "?", "x"),
        ];
        let c = classify(&questions);
        let auto: Vec<&str> = c.auto_graded.iter().map(|q| q.id.as_str()).collect();
        let manual: Vec<&str> = c.manual_review.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(auto, vec!["1", "3", "5"]);
        assert_eq!(manual, vec!["2", "4"]);
    }

    #[test]
    fn classify_empty() {
        let c = classify(&[]);
        assert!(c.auto_graded.is_empty());
        assert!(c.manual_review.is_empty());
    }

    #[test]
    fn feedback_variants() {
        let policy = GradingPolicy::default();
        let q = Question::multiple_choice("m", "?", vec!["Paris".into(), "Rome".into()], "Paris");
        assert_eq!(feedback(&q, Some(&text("Paris")), &policy), Feedback::Correct);
        assert_eq!(
            feedback(&q, Some(&text("Rome")), &policy),
            Feedback::Incorrect {
                expected: "Paris".into()
            }
        );
        let open = Question::open_ended("o", "Explain.", "");
        assert_eq!(
            feedback(&open, Some(&text("because")), &policy),
            Feedback::PendingReview
        );
    }

    #[test]
    fn policy_defaults_fill_missing_fields() {
        let policy: GradingPolicy = toml::from_str("similarity_threshold = 90.0").unwrap();
        assert_eq!(policy.similarity_threshold, 90.0);
        assert_eq!(policy.excellent_threshold, 80);
        assert_eq!(policy.good_threshold, 60);
    }
}
