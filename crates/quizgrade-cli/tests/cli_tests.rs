//! CLI integration tests using assert_cmd.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn quizgrade() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("quizgrade").unwrap();
    cmd.env_remove("QUIZGRADE_TOKEN")
        .env_remove("QUIZGRADE_API_URL")
        .env_remove("QUIZGRADE_USE_MOCK");
    cmd
}

/// A command running in `dir` against the mock backend, isolated from the
/// user's own config.
fn mock_in(dir: &Path) -> Command {
    let mut cmd = quizgrade();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("QUIZGRADE_USE_MOCK", "1");
    cmd
}

fn quiz_file(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../quizzes")
        .join(name)
}

fn grade_to_json(dir: &Path, answers: &str, out: &str) -> PathBuf {
    let output = mock_in(dir)
        .arg("grade")
        .arg("--quiz")
        .arg(quiz_file("web-basics.toml"))
        .arg("--answers")
        .arg(quiz_file(answers))
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();
    assert!(output.status.success());
    let path = dir.join(out);
    std::fs::write(&path, output.stdout).unwrap();
    path
}

#[test]
fn grade_text_report() {
    quizgrade()
        .arg("grade")
        .arg("--quiz")
        .arg("../../quizzes/web-basics.toml")
        .arg("--answers")
        .arg("../../quizzes/web-basics-answers.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("Web Basics (7 questions)"))
        .stdout(predicate::str::contains("Score: 3/5 correct (60%) - Good"))
        .stdout(predicate::str::contains("Pending manual review (2)"))
        .stdout(predicate::str::contains("[rest]"));
}

#[test]
fn grade_json_report() {
    let dir = TempDir::new().unwrap();
    let path = grade_to_json(dir.path(), "web-basics-improved-answers.toml", "report.json");

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(report["quiz"]["id"], "web-basics");
    assert_eq!(report["outcome"]["score"]["correct_count"], 4);
    assert_eq!(report["outcome"]["score"]["percentage"], 80);
    assert_eq!(report["outcome"]["score"]["status"], "excellent");
}

#[test]
fn grade_saves_report_to_output_dir() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("results");

    mock_in(dir.path())
        .arg("grade")
        .arg("--quiz")
        .arg(quiz_file("web-basics.toml"))
        .arg("--answers")
        .arg(quiz_file("web-basics-answers.toml"))
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stderr(predicate::str::contains("Report saved to"));

    let saved: Vec<_> = std::fs::read_dir(&out).unwrap().collect();
    assert_eq!(saved.len(), 1);
}

#[test]
fn grade_save_uses_configured_output_dir() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("quizgrade.toml"), "output_dir = \"reports\"\n").unwrap();

    mock_in(dir.path())
        .arg("grade")
        .arg("--quiz")
        .arg(quiz_file("web-basics.toml"))
        .arg("--answers")
        .arg(quiz_file("web-basics-answers.toml"))
        .arg("--save")
        .assert()
        .success();

    let saved: Vec<_> = std::fs::read_dir(dir.path().join("reports")).unwrap().collect();
    assert_eq!(saved.len(), 1);
}

#[test]
fn grade_missing_answer_sheet() {
    quizgrade()
        .arg("grade")
        .arg("--quiz")
        .arg("../../quizzes/web-basics.toml")
        .arg("--answers")
        .arg("no-such-answers.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn validate_quiz_file() {
    quizgrade()
        .arg("validate")
        .arg("--quiz")
        .arg("../../quizzes/web-basics.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("7 questions, 2 manual review"))
        .stdout(predicate::str::contains("All quiz sets valid"));
}

#[test]
fn validate_directory_skips_answer_sheets() {
    quizgrade()
        .arg("validate")
        .arg("--quiz")
        .arg("../../quizzes")
        .assert()
        .success()
        .stdout(predicate::str::contains("Web Basics"))
        .stdout(predicate::str::contains("answers").not());
}

#[test]
fn validate_reports_warnings() {
    let dir = TempDir::new().unwrap();
    let quiz = dir.path().join("broken.toml");
    std::fs::write(
        &quiz,
        r#"[quiz]
id = "broken"
name = "Broken"

[[questions]]
id = "q1"
type = "mcq"
stem = "Pick one"
options = ["a", "b"]
correct_answer = "c"
"#,
    )
    .unwrap();

    quizgrade()
        .arg("validate")
        .arg("--quiz")
        .arg(&quiz)
        .assert()
        .success()
        .stdout(predicate::str::contains("[q1] WARNING"))
        .stdout(predicate::str::contains("1 warning(s) found."));
}

#[test]
fn validate_nonexistent_file() {
    quizgrade()
        .arg("validate")
        .arg("--quiz")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn compare_shows_improvement() {
    let dir = TempDir::new().unwrap();
    let baseline = grade_to_json(dir.path(), "web-basics-answers.toml", "baseline.json");
    let current = grade_to_json(dir.path(), "web-basics-improved-answers.toml", "current.json");

    quizgrade()
        .arg("compare")
        .arg("--baseline")
        .arg(&baseline)
        .arg("--current")
        .arg(&current)
        .arg("--fail-on-regression")
        .assert()
        .success()
        .stdout(predicate::str::contains("60% -> 80% (+20)"))
        .stdout(predicate::str::contains("status-404"));
}

#[test]
fn compare_fails_on_regression() {
    let dir = TempDir::new().unwrap();
    let baseline = grade_to_json(dir.path(), "web-basics-improved-answers.toml", "baseline.json");
    let current = grade_to_json(dir.path(), "web-basics-answers.toml", "current.json");

    quizgrade()
        .arg("compare")
        .arg("--baseline")
        .arg(&baseline)
        .arg("--current")
        .arg(&current)
        .arg("--fail-on-regression")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Regressions:"));
}

#[test]
fn compare_nonexistent_report() {
    quizgrade()
        .arg("compare")
        .arg("--baseline")
        .arg("no_such_file.json")
        .arg("--current")
        .arg("also_no_file.json")
        .assert()
        .failure();
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    quizgrade()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created quizgrade.toml"))
        .stdout(predicate::str::contains("Created quizzes/example.toml"));

    assert!(dir.path().join("quizgrade.toml").exists());
    assert!(dir.path().join("quizzes/example-answers.toml").exists());

    // the generated example grades cleanly
    mock_in(dir.path())
        .arg("grade")
        .arg("--quiz")
        .arg("quizzes/example.toml")
        .arg("--answers")
        .arg("quizzes/example-answers.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 3/3 correct (100%) - Excellent"));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    quizgrade().current_dir(dir.path()).arg("init").assert().success();

    quizgrade()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn fetch_writes_loadable_quiz() {
    let dir = TempDir::new().unwrap();

    mock_in(dir.path())
        .arg("fetch")
        .arg("--topic")
        .arg("React")
        .arg("--out")
        .arg("fetched/react.json")
        .assert()
        .success()
        .stderr(predicate::str::contains("Wrote 5 question(s)"));

    quizgrade()
        .current_dir(dir.path())
        .arg("validate")
        .arg("--quiz")
        .arg("fetched/react.json")
        .assert()
        .success()
        .stdout(predicate::str::contains("react (5 questions, 0 manual review)"));
}

#[test]
fn fetch_rejects_unknown_difficulty() {
    let dir = TempDir::new().unwrap();

    mock_in(dir.path())
        .arg("fetch")
        .arg("--topic")
        .arg("React")
        .arg("--difficulty")
        .arg("impossible")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown difficulty"));
}

#[test]
fn play_quick_quiz() {
    let dir = TempDir::new().unwrap();

    mock_in(dir.path())
        .arg("play")
        .arg("--topic")
        .arg("React")
        .write_stdin("1\nf\nApplication Programming Interface\n1\nno\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Question 5/5"))
        .stdout(predicate::str::contains("Score: 5/5 correct (100%) - Excellent"));
}

#[test]
fn play_stops_when_input_ends() {
    let dir = TempDir::new().unwrap();

    mock_in(dir.path())
        .arg("play")
        .arg("--topic")
        .arg("React")
        .write_stdin("1\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("input ended"));
}

#[test]
fn daily_quiz_once_per_day() {
    let dir = TempDir::new().unwrap();

    mock_in(dir.path())
        .arg("play")
        .arg("--topic")
        .arg("React")
        .arg("--mode")
        .arg("daily")
        .write_stdin("2\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Incorrect. Expected: To manage component state"));

    assert!(dir.path().join(".quizgrade-state.json").exists());

    mock_in(dir.path())
        .arg("play")
        .arg("--topic")
        .arg("React")
        .arg("--mode")
        .arg("daily")
        .write_stdin("1\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("daily quiz already completed"));
}

#[test]
fn login_stores_token_for_stats() {
    let dir = TempDir::new().unwrap();

    mock_in(dir.path())
        .arg("login")
        .arg("--username")
        .arg("deniz")
        .arg("--password")
        .arg("secret")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged in as deniz"));

    let saved = std::fs::read_to_string(dir.path().join("quizgrade.toml")).unwrap();
    assert!(saved.contains("username = \"deniz\""));

    mock_in(dir.path())
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Statistics for deniz"))
        .stdout(predicate::str::contains("No quizzes recorded yet."));
}

#[test]
fn register_requires_email() {
    let dir = TempDir::new().unwrap();

    mock_in(dir.path())
        .arg("login")
        .arg("--register")
        .arg("--username")
        .arg("deniz")
        .arg("--password")
        .arg("secret")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--email is required"));
}

#[test]
fn stats_requires_login() {
    let dir = TempDir::new().unwrap();

    mock_in(dir.path())
        .arg("stats")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not logged in"));
}

#[test]
fn submit_saved_report() {
    let dir = TempDir::new().unwrap();
    let report = grade_to_json(dir.path(), "web-basics-answers.toml", "report.json");

    mock_in(dir.path())
        .env("QUIZGRADE_TOKEN", "mock-token:deniz")
        .arg("submit")
        .arg("--report")
        .arg(&report)
        .assert()
        .success()
        .stdout(predicate::str::contains("Submitted Web Basics: 3/5 correct"));
}

#[test]
fn admin_generate_requires_admin() {
    let dir = TempDir::new().unwrap();

    mock_in(dir.path())
        .env("QUIZGRADE_TOKEN", "mock-token:deniz")
        .arg("admin")
        .arg("generate")
        .arg("--topic")
        .arg("React")
        .assert()
        .failure()
        .stderr(predicate::str::contains("forbidden"));

    mock_in(dir.path())
        .env("QUIZGRADE_TOKEN", "mock-token:admin")
        .arg("admin")
        .arg("generate")
        .arg("--topic")
        .arg("React")
        .arg("--qtype")
        .arg("true_false")
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated question mock-gen-"))
        .stdout(predicate::str::contains("Answer: true"));
}

#[test]
fn topics_and_health_with_mock() {
    let dir = TempDir::new().unwrap();

    mock_in(dir.path())
        .arg("topics")
        .assert()
        .success()
        .stdout(predicate::str::contains("JavaScript"))
        .stdout(predicate::str::contains("TypeScript"));

    mock_in(dir.path())
        .arg("health")
        .assert()
        .success()
        .stdout(predicate::str::contains("Status:  ok"));
}

#[test]
fn help_output() {
    quizgrade()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Quiz answer grading and practice tool"));
}

#[test]
fn version_output() {
    quizgrade()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("quizgrade"));
}
