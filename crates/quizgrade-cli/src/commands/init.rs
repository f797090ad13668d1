//! The `quizgrade init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    write_if_missing(Path::new("quizgrade.toml"), SAMPLE_CONFIG)?;

    std::fs::create_dir_all("quizzes")?;
    write_if_missing(Path::new("quizzes/example.toml"), EXAMPLE_QUIZ)?;
    write_if_missing(Path::new("quizzes/example-answers.toml"), EXAMPLE_ANSWERS)?;

    println!("\nNext steps:");
    println!("  1. Point quizgrade.toml at your backend (or set QUIZGRADE_USE_MOCK=1)");
    println!("  2. Run: quizgrade validate --quiz quizzes/example.toml");
    println!("  3. Run: quizgrade grade --quiz quizzes/example.toml --answers quizzes/example-answers.toml");

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# quizgrade configuration

# Filled in by `quizgrade login`; QUIZGRADE_TOKEN overrides it.
# token = "${QUIZGRADE_TOKEN}"

max_retries = 3
retry_delay_ms = 500
output_dir = "./quizgrade-results"
state_file = ".quizgrade-state.json"

[backend]
type = "http"
base_url = "http://localhost:8000"
timeout_secs = 30

[grading]
similarity_threshold = 85.0
excellent_threshold = 80
good_threshold = 60
"#;

const EXAMPLE_QUIZ: &str = r#"[quiz]
id = "example"
name = "Example Quiz"
topic = "Web Development"
difficulty = "beginner"

[[questions]]
id = "capital"
type = "mcq"
stem = "What is the capital of France?"
options = ["Berlin", "Paris", "Madrid", "Rome"]
correct_answer = "Paris"

[[questions]]
id = "js-compiled"
type = "true_false"
stem = "JavaScript is a compiled language."
correct_answer = "false"
rationale = "JavaScript is interpreted or JIT-compiled at runtime."

[[questions]]
id = "api"
type = "short_answer"
stem = "What does API stand for?"
correct_answer = "Application Programming Interface"

[[questions]]
id = "outage"
type = "scenario"
stem = "A customer reports the site is down right after a deploy."

[[questions.steps]]
prompt = "What do you check first?"
expected_answer = "the error logs"

[[questions.steps]]
prompt = "The new release is failing. What now?"
expected_answer = "roll back the deploy"

[[questions]]
id = "caching"
type = "open_ended"
stem = "Explain in your own words why caching helps performance."
"#;

const EXAMPLE_ANSWERS: &str = r#"[answers]
capital = "Paris"
js-compiled = "false"
api = "application programing interface"
outage = ["The error logs", "roll back the deploy"]
caching = "It avoids recomputing or refetching data."
"#;
