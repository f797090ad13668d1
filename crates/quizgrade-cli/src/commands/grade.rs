//! The `quizgrade grade` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::Table;

use quizgrade_client::config::load_config_from;
use quizgrade_core::parser::{parse_answer_sheet, parse_quiz_set};
use quizgrade_core::report::GradeReport;
use quizgrade_core::scoring::grade_quiz;

pub fn execute(
    quiz_path: PathBuf,
    answers_path: PathBuf,
    format: String,
    output: Option<PathBuf>,
    save: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let set = parse_quiz_set(&quiz_path)?;
    let answers = parse_answer_sheet(&answers_path)?;

    let unknown: Vec<&String> = answers
        .keys()
        .filter(|id| set.question(id).is_none())
        .collect();
    for id in unknown {
        tracing::warn!("answer for unknown question '{id}' ignored");
    }

    let outcome = grade_quiz(&set.questions, &answers, &config.grading);
    let report = GradeReport::new(&set, outcome);

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => print_text(&report),
    }

    if let Some(dir) = output.or_else(|| save.then(|| config.output_dir.clone())) {
        let path = dir.join(format!("{}-{}.json", report.quiz.id, report.id));
        report.save_json(&path)?;
        eprintln!("Report saved to {}", path.display());
    }

    Ok(())
}

fn print_text(report: &GradeReport) {
    let outcome = &report.outcome;
    println!("Quiz: {} ({} questions)", report.quiz.name, report.quiz.question_count);

    if !outcome.verdicts.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Question", "Type", "Result", "Similarity"]);
        for v in &outcome.verdicts {
            table.add_row(vec![
                v.question_id.clone(),
                v.kind.label().to_string(),
                if v.correct { "correct" } else { "incorrect" }.to_string(),
                v.similarity
                    .map(|s| format!("{s:.1}%"))
                    .unwrap_or_else(|| "-".to_string()),
            ]);
        }
        println!("{table}");
    }

    let score = &outcome.score;
    println!(
        "\nScore: {}/{} correct ({}%) - {}",
        score.correct_count, score.total_auto_graded, score.percentage, score.status
    );

    if !outcome.manual_review.is_empty() {
        println!("\nPending manual review ({}):", outcome.manual_review.len());
        for item in &outcome.manual_review {
            let answer = item
                .answer
                .as_ref()
                .map(|a| a.to_string())
                .unwrap_or_else(|| "(no answer)".to_string());
            println!("  [{}] {}", item.question.id, item.question.stem);
            println!("      answer: {answer}");
        }
    }
}
