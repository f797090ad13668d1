//! The `quizgrade fetch` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use quizgrade_core::model::{Difficulty, QuizMode, RawQuestion};
use quizgrade_core::traits::QuestionRequest;

use super::connect;

pub async fn execute(
    topic: String,
    difficulty: Difficulty,
    mode: QuizMode,
    out: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let (_, backend) = connect(config_path.as_deref())?;

    let request = QuestionRequest {
        topic,
        difficulty,
        count: mode.question_count(),
    };
    let questions = backend.fetch_questions(&request).await?;
    let raw: Vec<RawQuestion> = questions.iter().map(RawQuestion::from).collect();
    let json = serde_json::to_string_pretty(&raw)?;

    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Wrote {} question(s) to {}", raw.len(), path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}
