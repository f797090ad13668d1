//! Core data model types for quizgrade.
//!
//! Questions are normalized into these types at the system boundary
//! (see [`RawQuestion`] and [`QuestionKind::from_raw`]). Grading code never
//! looks at raw backend strings.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ModelError;

/// The closed set of question kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionKind {
    #[serde(rename = "mcq")]
    MultipleChoice,
    #[serde(rename = "true_false")]
    TrueFalse,
    #[serde(rename = "short_answer")]
    ShortAnswer,
    #[serde(rename = "open_ended")]
    OpenEnded,
    #[serde(rename = "scenario")]
    Scenario,
}

/// Raw type strings observed from the backend and hand-written quiz files.
///
/// Keys are compared after lower-casing and replacing `-`, `/` and spaces
/// with `_`.
const KIND_TABLE: &[(&str, QuestionKind)] = &[
    ("mcq", QuestionKind::MultipleChoice),
    ("multiple_choice", QuestionKind::MultipleChoice),
    ("choice", QuestionKind::MultipleChoice),
    ("coktan_secmeli", QuestionKind::MultipleChoice),
    ("çoktan_seçmeli", QuestionKind::MultipleChoice),
    ("true_false", QuestionKind::TrueFalse),
    ("truefalse", QuestionKind::TrueFalse),
    ("tf", QuestionKind::TrueFalse),
    ("boolean", QuestionKind::TrueFalse),
    ("dogru_yanlis", QuestionKind::TrueFalse),
    ("doğru_yanlış", QuestionKind::TrueFalse),
    ("short_answer", QuestionKind::ShortAnswer),
    ("short", QuestionKind::ShortAnswer),
    ("shortanswer", QuestionKind::ShortAnswer),
    ("kisa_cevap", QuestionKind::ShortAnswer),
    ("kısa_cevap", QuestionKind::ShortAnswer),
    ("open_ended", QuestionKind::OpenEnded),
    ("openended", QuestionKind::OpenEnded),
    ("open", QuestionKind::OpenEnded),
    ("essay", QuestionKind::OpenEnded),
    ("acik_uclu", QuestionKind::OpenEnded),
    ("açık_uçlu", QuestionKind::OpenEnded),
    ("scenario", QuestionKind::Scenario),
    ("senaryo", QuestionKind::Scenario),
    ("multi_step", QuestionKind::Scenario),
];

impl QuestionKind {
    /// Look up a raw type string in the mapping table.
    pub fn from_raw(raw: &str) -> Option<Self> {
        let key: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if matches!(c, '-' | '/' | ' ') { '_' } else { c })
            .collect();
        KIND_TABLE
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, kind)| *kind)
    }

    /// Like [`QuestionKind::from_raw`], but unknown strings fall back to
    /// [`QuestionKind::OpenEnded`] so the question lands in manual review.
    pub fn from_raw_or_manual(raw: &str) -> Self {
        Self::from_raw(raw).unwrap_or_else(|| {
            tracing::warn!("unrecognized question type '{raw}', routing to manual review");
            QuestionKind::OpenEnded
        })
    }

    /// Whether answers of this kind are graded without human judgment.
    pub fn is_auto_graded(self) -> bool {
        matches!(
            self,
            QuestionKind::MultipleChoice | QuestionKind::TrueFalse | QuestionKind::ShortAnswer
        )
    }

    /// Human-readable label for display.
    pub fn label(self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice => "Multiple Choice",
            QuestionKind::TrueFalse => "True/False",
            QuestionKind::ShortAnswer => "Short Answer",
            QuestionKind::OpenEnded => "Open Ended",
            QuestionKind::Scenario => "Scenario",
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionKind::MultipleChoice => write!(f, "mcq"),
            QuestionKind::TrueFalse => write!(f, "true_false"),
            QuestionKind::ShortAnswer => write!(f, "short_answer"),
            QuestionKind::OpenEnded => write!(f, "open_ended"),
            QuestionKind::Scenario => write!(f, "scenario"),
        }
    }
}

impl FromStr for QuestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_raw(s).ok_or_else(|| format!("unknown question type: {s}"))
    }
}

/// The expected answer of a question.
///
/// `Steps` is used by scenario questions and only by them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExpectedAnswer {
    Single(String),
    Steps(Vec<String>),
}

impl fmt::Display for ExpectedAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpectedAnswer::Single(s) => write!(f, "{s}"),
            ExpectedAnswer::Steps(steps) => write!(f, "{}", steps.join(", ")),
        }
    }
}

/// A user's submitted response to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Text(String),
    Steps(Vec<String>),
}

impl Response {
    /// True when nothing meaningful was submitted.
    pub fn is_blank(&self) -> bool {
        match self {
            Response::Text(s) => s.trim().is_empty(),
            Response::Steps(steps) => steps.iter().all(|s| s.trim().is_empty()),
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Text(s) => write!(f, "{s}"),
            Response::Steps(steps) => write!(f, "{}", steps.join(", ")),
        }
    }
}

impl From<&str> for Response {
    fn from(s: &str) -> Self {
        Response::Text(s.to_string())
    }
}

/// Question id → submitted response.
pub type AnswerSheet = HashMap<String, Response>;

/// One step of a multi-step scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioStep {
    /// 1-based step number.
    pub number: u32,
    pub prompt: String,
    pub expected_answer: String,
}

/// Where a question's content came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub document: String,
    #[serde(default)]
    pub chunk: u32,
    #[serde(default)]
    pub topic: String,
}

/// A single quiz item.
///
/// Use the kind-specific constructors; they keep `correct_answer` a
/// sequence exactly when the question is a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier.
    pub id: String,
    /// Question kind.
    pub kind: QuestionKind,
    /// The question text.
    pub stem: String,
    /// Choices, only for multiple choice.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// The expected answer.
    pub correct_answer: ExpectedAnswer,
    /// Scenario steps, only for scenarios.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<ScenarioStep>,
    /// Explanation shown after answering.
    #[serde(default)]
    pub rationale: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceRef>,
}

impl Question {
    fn base(id: &str, kind: QuestionKind, stem: &str, correct_answer: ExpectedAnswer) -> Self {
        Self {
            id: id.to_string(),
            kind,
            stem: stem.to_string(),
            options: Vec::new(),
            correct_answer,
            steps: Vec::new(),
            rationale: String::new(),
            topic: None,
            level: None,
            source: None,
        }
    }

    pub fn multiple_choice(id: &str, stem: &str, options: Vec<String>, correct: &str) -> Self {
        let mut q = Self::base(
            id,
            QuestionKind::MultipleChoice,
            stem,
            ExpectedAnswer::Single(correct.to_string()),
        );
        q.options = options;
        q
    }

    pub fn true_false(id: &str, stem: &str, answer: bool) -> Self {
        Self::base(
            id,
            QuestionKind::TrueFalse,
            stem,
            ExpectedAnswer::Single(answer.to_string()),
        )
    }

    pub fn short_answer(id: &str, stem: &str, expected: &str) -> Self {
        Self::base(
            id,
            QuestionKind::ShortAnswer,
            stem,
            ExpectedAnswer::Single(expected.to_string()),
        )
    }

    pub fn open_ended(id: &str, stem: &str, expected: &str) -> Self {
        Self::base(
            id,
            QuestionKind::OpenEnded,
            stem,
            ExpectedAnswer::Single(expected.to_string()),
        )
    }

    /// A scenario whose steps are `(prompt, expected answer)` pairs.
    pub fn scenario(id: &str, stem: &str, steps: Vec<(String, String)>) -> Self {
        let steps: Vec<ScenarioStep> = steps
            .into_iter()
            .enumerate()
            .map(|(i, (prompt, expected_answer))| ScenarioStep {
                number: i as u32 + 1,
                prompt,
                expected_answer,
            })
            .collect();
        let expected = steps.iter().map(|s| s.expected_answer.clone()).collect();
        let mut q = Self::base(id, QuestionKind::Scenario, stem, ExpectedAnswer::Steps(expected));
        q.steps = steps;
        q
    }

    pub fn with_rationale(mut self, rationale: &str) -> Self {
        self.rationale = rationale.to_string();
        self
    }

    pub fn is_auto_graded(&self) -> bool {
        self.kind.is_auto_graded()
    }
}

/// Quiz modes offered on the home screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizMode {
    Quick,
    Daily,
    Scenario,
}

impl QuizMode {
    /// Number of questions fetched for this mode.
    pub fn question_count(self) -> usize {
        match self {
            QuizMode::Quick => 5,
            QuizMode::Daily => 1,
            QuizMode::Scenario => 3,
        }
    }
}

impl fmt::Display for QuizMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizMode::Quick => write!(f, "quick"),
            QuizMode::Daily => write!(f, "daily"),
            QuizMode::Scenario => write!(f, "scenario"),
        }
    }
}

impl FromStr for QuizMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "quick" => Ok(QuizMode::Quick),
            "daily" => Ok(QuizMode::Daily),
            "scenario" => Ok(QuizMode::Scenario),
            other => Err(format!("unknown quiz mode: {other}")),
        }
    }
}

/// Difficulty levels understood by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Beginner => write!(f, "beginner"),
            Difficulty::Intermediate => write!(f, "intermediate"),
            Difficulty::Advanced => write!(f, "advanced"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "beginner" | "easy" => Ok(Difficulty::Beginner),
            "intermediate" | "medium" => Ok(Difficulty::Intermediate),
            "advanced" | "hard" => Ok(Difficulty::Advanced),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// A named collection of questions loaded from a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSet {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    pub questions: Vec<Question>,
}

impl QuizSet {
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }
}

/// Give repeated question ids a `-<n>` suffix so every id in the list is
/// unique. The first occurrence keeps its id. Returns how many questions
/// were renamed.
pub fn make_ids_unique(questions: &mut [Question]) -> usize {
    let mut taken: HashSet<String> = HashSet::new();
    let mut repeats: HashMap<String, usize> = HashMap::new();
    let mut renamed = 0;
    for q in questions.iter_mut() {
        if taken.insert(q.id.clone()) {
            continue;
        }
        let n = repeats.entry(q.id.clone()).or_insert(0);
        let id = loop {
            *n += 1;
            let candidate = format!("{}-{n}", q.id);
            if !taken.contains(&candidate) {
                break candidate;
            }
        };
        taken.insert(id.clone());
        q.id = id;
        renamed += 1;
    }
    renamed
}

// ---------------------------------------------------------------------------
// Backend wire shape
// ---------------------------------------------------------------------------

/// A question as the backend serves it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawQuestion {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    pub stem: String,
    #[serde(default)]
    pub choices: Option<Vec<String>>,
    #[serde(default)]
    pub answer_index: Option<usize>,
    #[serde(default)]
    pub answer: Option<bool>,
    #[serde(default)]
    pub expected: Option<String>,
    #[serde(default)]
    pub expected_points: Option<Vec<String>>,
    #[serde(default)]
    pub rationale: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub source: Option<RawSource>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSource {
    #[serde(default)]
    pub doc: String,
    #[serde(default)]
    pub chunk: u32,
    #[serde(default)]
    pub topic: String,
}

impl TryFrom<RawQuestion> for Question {
    type Error = ModelError;

    fn try_from(raw: RawQuestion) -> Result<Self, Self::Error> {
        let kind = QuestionKind::from_raw_or_manual(&raw.kind);
        let id = raw
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut question = match kind {
            QuestionKind::MultipleChoice => {
                let choices = raw.choices.unwrap_or_default();
                let index = raw
                    .answer_index
                    .ok_or_else(|| ModelError::MissingAnswerIndex { id: id.clone() })?;
                let correct = choices.get(index).cloned().ok_or(
                    ModelError::AnswerIndexOutOfRange {
                        id: id.clone(),
                        index,
                        len: choices.len(),
                    },
                )?;
                Question::multiple_choice(&id, &raw.stem, choices, &correct)
            }
            QuestionKind::TrueFalse => match (raw.answer, raw.expected.as_deref()) {
                (Some(answer), _) => Question::true_false(&id, &raw.stem, answer),
                (None, Some(expected)) => {
                    let mut q = Question::true_false(&id, &raw.stem, false);
                    q.correct_answer = ExpectedAnswer::Single(expected.trim().to_lowercase());
                    q
                }
                (None, None) => return Err(ModelError::MissingExpectedAnswer { id }),
            },
            QuestionKind::ShortAnswer => {
                Question::short_answer(&id, &raw.stem, raw.expected.as_deref().unwrap_or(""))
            }
            QuestionKind::OpenEnded => {
                Question::open_ended(&id, &raw.stem, raw.expected.as_deref().unwrap_or(""))
            }
            QuestionKind::Scenario => {
                let points = raw.expected_points.unwrap_or_default();
                if points.is_empty() {
                    return Err(ModelError::MissingScenarioSteps { id });
                }
                let steps = points.into_iter().map(|p| (p.clone(), p)).collect();
                Question::scenario(&id, &raw.stem, steps)
            }
        };

        question.rationale = raw.rationale.unwrap_or_default();
        question.topic = raw.topic;
        question.level = raw.level;
        question.source = raw.source.map(|s| SourceRef {
            document: s.doc,
            chunk: s.chunk,
            topic: s.topic,
        });
        Ok(question)
    }
}

impl From<&Question> for RawQuestion {
    fn from(q: &Question) -> Self {
        let mut raw = RawQuestion {
            id: Some(q.id.clone()),
            kind: q.kind.to_string(),
            topic: q.topic.clone(),
            level: q.level.clone(),
            stem: q.stem.clone(),
            rationale: (!q.rationale.is_empty()).then(|| q.rationale.clone()),
            source: q.source.as_ref().map(|s| RawSource {
                doc: s.document.clone(),
                chunk: s.chunk,
                topic: s.topic.clone(),
            }),
            ..Default::default()
        };

        match (&q.kind, &q.correct_answer) {
            (QuestionKind::MultipleChoice, ExpectedAnswer::Single(correct)) => {
                raw.answer_index = q.options.iter().position(|o| o == correct);
                raw.choices = Some(q.options.clone());
            }
            (QuestionKind::TrueFalse, ExpectedAnswer::Single(expected)) => {
                match expected.trim().to_lowercase().as_str() {
                    "true" => raw.answer = Some(true),
                    "false" => raw.answer = Some(false),
                    _ => raw.expected = Some(expected.clone()),
                }
            }
            (_, ExpectedAnswer::Steps(points)) => raw.expected_points = Some(points.clone()),
            (_, ExpectedAnswer::Single(expected)) => raw.expected = Some(expected.clone()),
        }
        raw
    }
}
