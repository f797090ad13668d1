pub mod admin;
pub mod compare;
pub mod fetch;
pub mod grade;
pub mod init;
pub mod login;
pub mod play;
pub mod stats;
pub mod submit;
pub mod topics;
pub mod validate;

use std::path::Path;

use anyhow::Result;

use quizgrade_client::config::load_config_from;
use quizgrade_client::{create_backend, QuizgradeConfig};
use quizgrade_core::model::{Question, QuestionKind};
use quizgrade_core::traits::QuizBackend;

/// Load the configuration and build the backend it selects.
pub(crate) fn connect(config_path: Option<&Path>) -> Result<(QuizgradeConfig, Box<dyn QuizBackend>)> {
    let config = load_config_from(config_path)?;
    let backend = create_backend(&config)?;
    tracing::debug!(backend = backend.name(), "backend ready");
    Ok((config, backend))
}

/// Render a question the way the quiz screen shows it.
pub(crate) fn render_question(question: &Question) -> String {
    let mut out = format!("[{}] {}\n", question.kind.label(), question.stem);
    match question.kind {
        QuestionKind::MultipleChoice => {
            for (i, option) in question.options.iter().enumerate() {
                out.push_str(&format!("  {}) {option}\n", i + 1));
            }
        }
        QuestionKind::TrueFalse => out.push_str("  (true / false)\n"),
        _ => {}
    }
    out
}
