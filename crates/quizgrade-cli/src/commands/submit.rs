//! The `quizgrade submit` command.

use std::path::PathBuf;

use anyhow::Result;

use quizgrade_core::report::GradeReport;

use super::connect;

pub async fn execute(report_path: PathBuf, config_path: Option<PathBuf>) -> Result<()> {
    let (config, backend) = connect(config_path.as_deref())?;
    let token = config.require_token()?;

    let report = GradeReport::load_json(&report_path)?;
    let result = report.to_quiz_result();
    backend.submit_result(token, &result).await?;

    println!(
        "Submitted {}: {}/{} correct",
        report.quiz.name, result.correct_answers, result.total_questions
    );
    Ok(())
}
