//! The `quizgrade play` command: an interactive quiz on the terminal.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;

use quizgrade_core::error::TransitionError;
use quizgrade_core::grading::Feedback;
use quizgrade_core::model::{Difficulty, Question, QuestionKind, QuizMode, Response};
use quizgrade_core::session::{
    DailyGate, QuizConfig, QuizSession, Screen, ScenarioProgress, StepOutcome, User,
};
use quizgrade_core::traits::QuestionRequest;

use super::{connect, render_question};

pub async fn execute(
    topic: String,
    difficulty: Difficulty,
    mode: QuizMode,
    no_submit: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let (config, backend) = connect(config_path.as_deref())?;
    let gate = load_gate(&config.state_file)?;

    if mode == QuizMode::Daily {
        if let Some(remaining) = gate.remaining(Utc::now()) {
            return Err(TransitionError::DailyUnavailable {
                remaining_minutes: remaining.num_minutes(),
            }
            .into());
        }
    }

    let mut session = QuizSession::with_daily_gate(config.grading.clone(), gate);
    session.sign_in(User {
        username: config.username.clone().unwrap_or_else(|| "guest".to_string()),
        is_admin: false,
    })?;

    let request = QuestionRequest {
        topic: topic.clone(),
        difficulty,
        count: mode.question_count(),
    };
    let questions = backend.fetch_questions(&request).await?;
    session.start_quiz(
        QuizConfig {
            mode,
            topic,
            difficulty,
        },
        questions,
        Utc::now(),
    )?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    drive(&mut session, stdin.lock(), stdout.lock())?;

    if mode == QuizMode::Daily {
        save_gate(&config.state_file, session.daily_gate())?;
    }

    let Some(finished) = session.finished() else {
        return Ok(());
    };

    if no_submit {
        return Ok(());
    }
    match config.token.as_deref() {
        Some(token) => match backend.submit_result(token, &finished.to_quiz_result()).await {
            Ok(()) => eprintln!("Result submitted."),
            Err(e) => tracing::warn!("failed to submit result: {e:#}"),
        },
        None => tracing::info!("not logged in; result not submitted"),
    }

    Ok(())
}

/// Run the quiz screens until the results screen, reading answers from
/// `input` and writing prompts to `out`.
pub(crate) fn drive<R: BufRead, W: Write>(
    session: &mut QuizSession,
    mut input: R,
    mut out: W,
) -> Result<()> {
    while let Screen::Quiz(run) = session.screen() {
        let question = run.current_question().clone();
        writeln!(
            out,
            "\nQuestion {}/{} ({}%)",
            run.question_number(),
            run.total_questions(),
            run.progress_percent()
        )?;
        write!(out, "{}", render_question(&question))?;

        let response = read_response(&question, &mut input, &mut out)?;
        match session.submit_answer(response)? {
            Feedback::Correct => writeln!(out, "Correct!")?,
            Feedback::Incorrect { expected } => writeln!(out, "Incorrect. Expected: {expected}")?,
            Feedback::PendingReview => writeln!(out, "Answer recorded for manual review.")?,
        }
        if !question.rationale.is_empty() {
            writeln!(out, "{}", question.rationale)?;
        }
        session.next(Utc::now())?;
    }

    if let Some(finished) = session.finished() {
        let score = &finished.outcome.score;
        writeln!(
            out,
            "\nScore: {}/{} correct ({}%) - {}",
            score.correct_count, score.total_auto_graded, score.percentage, score.status
        )?;
        let pending = finished.outcome.manual_review.len();
        if pending > 0 {
            writeln!(out, "{pending} answer(s) pending manual review.")?;
        }
    }
    out.flush()?;
    Ok(())
}

fn read_response<R: BufRead, W: Write>(
    question: &Question,
    input: &mut R,
    out: &mut W,
) -> Result<Response> {
    match question.kind {
        QuestionKind::MultipleChoice => loop {
            let line = prompt_line(&format!("Answer (1-{}): ", question.options.len()), input, out)?;
            if let Some(choice) = pick_option(&question.options, &line) {
                return Ok(Response::Text(choice));
            }
            writeln!(out, "Enter an option number.")?;
        },
        QuestionKind::TrueFalse => loop {
            let line = prompt_line("Answer (t/f): ", input, out)?;
            if let Some(value) = parse_bool(&line) {
                return Ok(Response::Text(value.to_string()));
            }
            writeln!(out, "Enter true or false.")?;
        },
        QuestionKind::Scenario => {
            let Some(mut progress) = ScenarioProgress::new(question) else {
                return read_text(input, out);
            };
            loop {
                let step = progress.current_step();
                let label = format!(
                    "Step {}/{}: {}\n> ",
                    step.number,
                    progress.total_steps(),
                    step.prompt
                );
                let line = prompt_line(&label, input, out)?;
                match progress.answer_step(&line) {
                    Ok(StepOutcome::Next) => {}
                    Ok(StepOutcome::Complete(response)) => return Ok(response),
                    Err(TransitionError::BlankAnswer) => writeln!(out, "Answer cannot be empty.")?,
                    Err(e) => return Err(e.into()),
                }
            }
        }
        QuestionKind::ShortAnswer | QuestionKind::OpenEnded => read_text(input, out),
    }
}

fn read_text<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<Response> {
    loop {
        let line = prompt_line("> ", input, out)?;
        if !line.trim().is_empty() {
            return Ok(Response::Text(line));
        }
        writeln!(out, "Answer cannot be empty.")?;
    }
}

fn prompt_line<R: BufRead, W: Write>(prompt: &str, input: &mut R, out: &mut W) -> Result<String> {
    write!(out, "{prompt}")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        anyhow::bail!("input ended before the quiz was finished");
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// A 1-based option number, or the option text itself.
fn pick_option(options: &[String], line: &str) -> Option<String> {
    let line = line.trim();
    if let Ok(n) = line.parse::<usize>() {
        return n.checked_sub(1).and_then(|i| options.get(i)).cloned();
    }
    options
        .iter()
        .find(|o| o.trim().eq_ignore_ascii_case(line))
        .cloned()
}

fn parse_bool(line: &str) -> Option<bool> {
    match line.trim().to_lowercase().as_str() {
        "t" | "true" | "y" | "yes" | "doğru" => Some(true),
        "f" | "false" | "n" | "no" | "yanlış" => Some(false),
        _ => None,
    }
}

fn load_gate(path: &Path) -> Result<DailyGate> {
    if !path.exists() {
        return Ok(DailyGate::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read state file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse state file: {}", path.display()))
}

fn save_gate(path: &Path, gate: &DailyGate) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(gate)?)
        .with_context(|| format!("failed to write state file: {}", path.display()))
}
