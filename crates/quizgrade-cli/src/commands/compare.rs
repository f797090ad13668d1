//! The `quizgrade compare` command.

use std::path::PathBuf;

use anyhow::Result;

use quizgrade_core::report::GradeReport;

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    fail_on_regression: bool,
    format: String,
) -> Result<()> {
    let baseline = GradeReport::load_json(&baseline_path)?;
    let current = GradeReport::load_json(&current_path)?;

    if baseline.quiz.id != current.quiz.id {
        tracing::warn!(
            "comparing different quizzes: '{}' vs '{}'",
            baseline.quiz.id,
            current.quiz.id
        );
    }

    let comparison = current.compare(&baseline);

    match format.as_str() {
        "markdown" | "md" => println!("{}", comparison.to_markdown()),
        "json" => println!("{}", serde_json::to_string_pretty(&comparison)?),
        _ => {
            println!(
                "Comparison: {}% -> {}% ({:+}), {} regressions, {} improvements, {} unchanged",
                comparison.baseline_percentage,
                comparison.current_percentage,
                comparison.delta(),
                comparison.newly_incorrect.len(),
                comparison.newly_correct.len(),
                comparison.unchanged
            );

            if !comparison.newly_incorrect.is_empty() {
                println!("\nRegressions:");
                for id in &comparison.newly_incorrect {
                    println!("  {id}");
                }
            }
            if !comparison.newly_correct.is_empty() {
                println!("\nImprovements:");
                for id in &comparison.newly_correct {
                    println!("  {id}");
                }
            }
            if comparison.new_questions > 0 {
                println!("\n{} new question(s)", comparison.new_questions);
            }
            if comparison.removed_questions > 0 {
                println!("{} removed question(s)", comparison.removed_questions);
            }
        }
    }

    if fail_on_regression && comparison.has_regressions() {
        std::process::exit(1);
    }

    Ok(())
}
