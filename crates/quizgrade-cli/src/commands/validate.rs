//! The `quizgrade validate` command.

use std::path::PathBuf;

use anyhow::Result;

use quizgrade_core::parser;

pub fn execute(quiz_path: PathBuf) -> Result<()> {
    let sets = if quiz_path.is_dir() {
        parser::load_quiz_directory(&quiz_path)?
    } else {
        vec![parser::parse_quiz_set(&quiz_path)?]
    };

    let mut total_warnings = 0;

    for set in &sets {
        let manual = set.questions.iter().filter(|q| !q.is_auto_graded()).count();
        println!(
            "Quiz: {} ({} questions, {} manual review)",
            set.name,
            set.questions.len(),
            manual
        );

        let warnings = parser::validate_quiz_set(set);
        for w in &warnings {
            let prefix = w
                .question_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All quiz sets valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
