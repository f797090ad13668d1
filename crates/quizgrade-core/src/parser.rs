//! Quiz set and answer sheet parsers.
//!
//! Quiz sets are TOML files (hand-written) or JSON lists of backend
//! questions (written by `quizgrade fetch`). Answer sheets are TOML.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{
    AnswerSheet, Difficulty, ExpectedAnswer, Question, QuestionKind, QuizSet, RawQuestion,
};

/// Intermediate TOML structure for quiz set files.
#[derive(Debug, Deserialize)]
struct TomlQuizFile {
    quiz: TomlQuizHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlQuizHeader {
    id: String,
    name: String,
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    difficulty: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    stem: String,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    correct_answer: Option<ExpectedAnswer>,
    #[serde(default)]
    steps: Vec<TomlStep>,
    #[serde(default)]
    rationale: String,
    #[serde(default)]
    topic: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TomlStep {
    prompt: String,
    expected_answer: String,
}

#[derive(Debug, Deserialize)]
struct TomlAnswerFile {
    #[serde(default)]
    answers: AnswerSheet,
}

impl TomlQuestion {
    fn into_question(self) -> Result<Question> {
        let kind = QuestionKind::from_raw_or_manual(&self.kind);
        let id = self.id;

        let mut question = match (kind, self.correct_answer) {
            (QuestionKind::Scenario, answer) => {
                let steps: Vec<(String, String)> = if !self.steps.is_empty() {
                    self.steps
                        .into_iter()
                        .map(|s| (s.prompt, s.expected_answer))
                        .collect()
                } else if let Some(ExpectedAnswer::Steps(points)) = answer {
                    points.into_iter().map(|p| (p.clone(), p)).collect()
                } else {
                    anyhow::bail!("scenario question {id} has no steps");
                };
                if steps.is_empty() {
                    anyhow::bail!("scenario question {id} has no steps");
                }
                Question::scenario(&id, &self.stem, steps)
            }
            (_, Some(ExpectedAnswer::Single(expected))) => match kind {
                QuestionKind::MultipleChoice => {
                    Question::multiple_choice(&id, &self.stem, self.options, &expected)
                }
                QuestionKind::TrueFalse => {
                    let mut q = Question::true_false(&id, &self.stem, false);
                    q.correct_answer = ExpectedAnswer::Single(expected);
                    q
                }
                QuestionKind::ShortAnswer => Question::short_answer(&id, &self.stem, &expected),
                _ => Question::open_ended(&id, &self.stem, &expected),
            },
            (QuestionKind::OpenEnded, None) => Question::open_ended(&id, &self.stem, ""),
            (_, Some(ExpectedAnswer::Steps(_))) => {
                anyhow::bail!("question {id}: a list answer is only valid for scenarios")
            }
            (_, None) => anyhow::bail!("question {id} has no correct_answer"),
        };

        question.rationale = self.rationale;
        question.topic = self.topic;
        Ok(question)
    }
}

/// Parse a quiz set file. `.json` files are read as backend question lists,
/// everything else as TOML.
pub fn parse_quiz_set(path: &Path) -> Result<QuizSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read quiz file: {}", path.display()))?;

    if path.extension().is_some_and(|ext| ext == "json") {
        parse_raw_questions_str(&content, path)
    } else {
        parse_quiz_set_str(&content, path)
    }
}

/// Parse a TOML quiz set from a string.
pub fn parse_quiz_set_str(content: &str, source_path: &Path) -> Result<QuizSet> {
    let parsed: TomlQuizFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let difficulty = parsed
        .quiz
        .difficulty
        .map(|d| d.parse::<Difficulty>().map_err(|e| anyhow::anyhow!("{}", e)))
        .transpose()?;

    let mut questions = parsed
        .questions
        .into_iter()
        .map(TomlQuestion::into_question)
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("invalid question in {}", source_path.display()))?;

    for q in &mut questions {
        if q.topic.is_none() {
            q.topic = parsed.quiz.topic.clone();
        }
        if q.level.is_none() {
            q.level = difficulty.map(|d| d.to_string());
        }
    }

    Ok(QuizSet {
        id: parsed.quiz.id,
        name: parsed.quiz.name,
        topic: parsed.quiz.topic,
        difficulty,
        questions,
    })
}

/// Parse a JSON list of backend questions into a quiz set named after the file.
pub fn parse_raw_questions_str(content: &str, source_path: &Path) -> Result<QuizSet> {
    let raw: Vec<RawQuestion> = serde_json::from_str(content)
        .with_context(|| format!("failed to parse JSON: {}", source_path.display()))?;

    let questions = raw
        .into_iter()
        .map(Question::try_from)
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("invalid question in {}", source_path.display()))?;

    let name = source_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "quiz".to_string());

    let topic = questions.first().and_then(|q| q.topic.clone());
    let difficulty = questions
        .first()
        .and_then(|q| q.level.as_deref())
        .and_then(|l| l.parse().ok());

    Ok(QuizSet {
        id: name.clone(),
        name,
        topic,
        difficulty,
        questions,
    })
}

/// Parse an answer sheet file.
pub fn parse_answer_sheet(path: &Path) -> Result<AnswerSheet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answer sheet: {}", path.display()))?;
    parse_answer_sheet_str(&content, path)
}

/// Parse an answer sheet from a TOML string.
pub fn parse_answer_sheet_str(content: &str, source_path: &Path) -> Result<AnswerSheet> {
    let parsed: TomlAnswerFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;
    Ok(parsed.answers)
}

/// Load every quiz set in a directory, recursively, in file name order.
///
/// Files that fail to parse are skipped with a warning. Answer sheets
/// (`*-answers.toml`) are ignored.
pub fn load_quiz_directory(dir: &Path) -> Result<Vec<QuizSet>> {
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    paths.sort();

    let mut sets = Vec::new();
    for path in paths {
        if path.is_dir() {
            sets.extend(load_quiz_directory(&path)?);
            continue;
        }
        let is_quiz = path
            .extension()
            .is_some_and(|ext| ext == "toml" || ext == "json");
        let is_answers = path
            .file_stem()
            .is_some_and(|stem| stem.to_string_lossy().ends_with("-answers"));
        if !is_quiz || is_answers {
            continue;
        }
        match parse_quiz_set(&path) {
            Ok(set) => sets.push(set),
            Err(e) => tracing::warn!("skipping {}: {:#}", path.display(), e),
        }
    }

    Ok(sets)
}

/// A warning from quiz set validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    pub message: String,
}

/// Check a quiz set for common authoring mistakes.
pub fn validate_quiz_set(set: &QuizSet) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let mut warn = |id: &str, message: String| {
        warnings.push(ValidationWarning {
            question_id: Some(id.to_string()),
            message,
        })
    };

    let mut seen = HashSet::new();
    for q in &set.questions {
        if !seen.insert(q.id.as_str()) {
            warn(&q.id, format!("duplicate question ID: {}", q.id));
        }
        if q.stem.trim().is_empty() {
            warn(&q.id, "stem is empty".into());
        }

        let ExpectedAnswer::Single(expected) = &q.correct_answer else {
            continue;
        };
        match q.kind {
            QuestionKind::MultipleChoice if q.options.is_empty() => {
                warn(&q.id, "multiple choice question has no options".into());
            }
            QuestionKind::MultipleChoice if !q.options.contains(expected) => {
                warn(
                    &q.id,
                    format!("correct answer {expected:?} is not one of the options"),
                );
            }
            QuestionKind::TrueFalse => {
                let value = expected.trim().to_lowercase();
                if value != "true" && value != "false" {
                    warn(
                        &q.id,
                        format!("true/false answer must be \"true\" or \"false\", got {expected:?}"),
                    );
                }
            }
            _ => {}
        }
    }

    if set.questions.is_empty() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "quiz has no questions".into(),
        });
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Response;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[quiz]
id = "basics"
name = "Product Basics"
topic = "product_basics"
difficulty = "beginner"

[[questions]]
id = "capital"
type = "mcq"
stem = "What is the capital of France?"
options = ["Berlin", "Paris", "Madrid"]
correct_answer = "Paris"
rationale = "Paris has been the capital since 987."

[[questions]]
id = "tf"
type = "Doğru/Yanlış"
stem = "Rust has a garbage collector."
correct_answer = "false"

[[questions]]
id = "incident"
type = "scenario"
stem = "Production is down."

[[questions.steps]]
prompt = "What do you check first?"
expected_answer = "the alerts"

[[questions.steps]]
prompt = "What next?"
expected_answer = "roll back"
"#;

    #[test]
    fn parse_valid_toml() {
        let set = parse_quiz_set_str(VALID_TOML, &PathBuf::from("basics.toml")).unwrap();
        assert_eq!(set.id, "basics");
        assert_eq!(set.difficulty, Some(Difficulty::Beginner));
        assert_eq!(set.questions.len(), 3);
        assert_eq!(set.questions[0].kind, QuestionKind::MultipleChoice);
        assert_eq!(set.questions[0].options.len(), 3);
        assert_eq!(set.questions[1].kind, QuestionKind::TrueFalse);
        assert_eq!(set.questions[2].steps.len(), 2);
        assert_eq!(set.questions[2].steps[1].number, 2);
        assert_eq!(set.questions[0].topic.as_deref(), Some("product_basics"));
        assert_eq!(set.questions[0].level.as_deref(), Some("beginner"));
        assert!(validate_quiz_set(&set).is_empty());
    }

    #[test]
    fn scenario_from_answer_list() {
        let toml = r#"
[quiz]
id = "s"
name = "S"

[[questions]]
id = "sc"
type = "senaryo"
stem = "Outage"
correct_answer = ["check alerts", "roll back"]
"#;
        let set = parse_quiz_set_str(toml, &PathBuf::from("s.toml")).unwrap();
        assert_eq!(
            set.questions[0].correct_answer,
            ExpectedAnswer::Steps(vec!["check alerts".into(), "roll back".into()])
        );
    }

    #[test]
    fn unknown_type_is_manual_review() {
        let toml = r#"
[quiz]
id = "u"
name = "U"

[[questions]]
id = "m"
type = "matching"
stem = "Match the pairs"
"#;
        let set = parse_quiz_set_str(toml, &PathBuf::from("u.toml")).unwrap();
        assert_eq!(set.questions[0].kind, QuestionKind::OpenEnded);
    }

    #[test]
    fn missing_answer_is_an_error() {
        let toml = r#"
[quiz]
id = "x"
name = "X"

[[questions]]
id = "q"
type = "short"
stem = "What?"
"#;
        let err = parse_quiz_set_str(toml, &PathBuf::from("x.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("no correct_answer"));
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        assert!(parse_quiz_set_str(bad, &PathBuf::from("bad.toml")).is_err());
    }

    #[test]
    fn validate_reports_authoring_mistakes() {
        let toml = r#"
[quiz]
id = "bad"
name = "Bad"

[[questions]]
id = "same"
type = "mcq"
stem = "Pick"
options = ["a", "b"]
correct_answer = "c"

[[questions]]
id = "same"
type = "true_false"
stem = " "
correct_answer = "maybe"

[[questions]]
id = "noopts"
type = "mcq"
stem = "Pick"
correct_answer = "a"
"#;
        let set = parse_quiz_set_str(toml, &PathBuf::from("bad.toml")).unwrap();
        let messages: Vec<String> = validate_quiz_set(&set)
            .into_iter()
            .map(|w| w.message)
            .collect();
        assert!(messages.iter().any(|m| m.contains("not one of the options")));
        assert!(messages.iter().any(|m| m.contains("duplicate")));
        assert!(messages.iter().any(|m| m.contains("stem is empty")));
        assert!(messages.iter().any(|m| m.contains("\"true\" or \"false\"")));
        assert!(messages.iter().any(|m| m.contains("no options")));
    }

    #[test]
    fn parse_answer_sheet_values() {
        let toml = r#"
[answers]
capital = "Paris"
tf = "false"
incident = ["roll back", "the alerts"]
"#;
        let sheet = parse_answer_sheet_str(toml, &PathBuf::from("a.toml")).unwrap();
        assert_eq!(sheet["capital"], Response::Text("Paris".into()));
        assert_eq!(
            sheet["incident"],
            Response::Steps(vec!["roll back".into(), "the alerts".into()])
        );
    }

    #[test]
    fn parse_backend_json() {
        let json = r#"[
            {"id": "r1", "type": "mcq", "topic": "product_basics", "level": "intermediate",
             "stem": "Pick", "choices": ["a", "b"], "answer_index": 1},
            {"type": "short", "stem": "API?", "expected": "Application Programming Interface"}
        ]"#;
        let set = parse_raw_questions_str(json, &PathBuf::from("fetched.json")).unwrap();
        assert_eq!(set.id, "fetched");
        assert_eq!(set.difficulty, Some(Difficulty::Intermediate));
        assert_eq!(set.questions[0].correct_answer, ExpectedAnswer::Single("b".into()));
        assert!(!set.questions[1].id.is_empty());
    }

    #[test]
    fn load_directory_skips_answer_sheets() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.toml"), VALID_TOML).unwrap();
        std::fs::write(
            dir.path().join("a.toml"),
            VALID_TOML.replace("id = \"basics\"", "id = \"first\""),
        )
        .unwrap();
        std::fs::write(dir.path().join("b-answers.toml"), "[answers]\ncapital = \"Paris\"\n").unwrap();
        std::fs::write(dir.path().join("broken.toml"), "not toml {").unwrap();

        let sets = load_quiz_directory(dir.path()).unwrap();
        let ids: Vec<&str> = sets.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "basics"]);
    }

    #[test]
    fn load_directory_rejects_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("q.toml");
        std::fs::write(&file, VALID_TOML).unwrap();
        assert!(load_quiz_directory(&file).is_err());
    }
}
