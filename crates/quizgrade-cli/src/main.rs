//! quizgrade CLI: grade answer sheets, play quizzes, and talk to the backend.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use quizgrade_core::model::{Difficulty, QuizMode};

mod commands;

#[derive(Parser)]
#[command(name = "quizgrade", version, about = "Quiz answer grading and practice tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade an answer sheet against a quiz file
    Grade {
        /// Quiz set (.toml, or .json as written by `fetch`)
        #[arg(long)]
        quiz: PathBuf,

        /// Answer sheet TOML
        #[arg(long)]
        answers: PathBuf,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Directory to save the JSON report in
        #[arg(long)]
        output: Option<PathBuf>,

        /// Save the JSON report to the configured output_dir
        #[arg(long)]
        save: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate quiz set files
    Validate {
        /// Path to a quiz file or directory
        #[arg(long)]
        quiz: PathBuf,
    },

    /// Compare two grade reports
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Exit code 1 if a previously correct answer is now wrong
        #[arg(long)]
        fail_on_regression: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Fetch questions from the backend into a quiz file
    Fetch {
        #[arg(long)]
        topic: String,

        /// beginner, intermediate or advanced
        #[arg(long, default_value = "beginner")]
        difficulty: Difficulty,

        /// quick (5), daily (1) or scenario (3)
        #[arg(long, default_value = "quick")]
        mode: QuizMode,

        /// Output file (prints to stdout if omitted)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Play a quiz interactively
    Play {
        #[arg(long)]
        topic: String,

        #[arg(long, default_value = "beginner")]
        difficulty: Difficulty,

        #[arg(long, default_value = "quick")]
        mode: QuizMode,

        /// Do not submit the result even when logged in
        #[arg(long)]
        no_submit: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Log in (or register) and store the access token
    Login {
        #[arg(long)]
        username: String,

        #[arg(long)]
        password: String,

        /// Create the account first
        #[arg(long)]
        register: bool,

        /// Email, required with --register
        #[arg(long)]
        email: Option<String>,

        /// Config file to store the token in (default: ./quizgrade.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Submit a saved grade report to the backend
    Submit {
        /// Report JSON written by `grade --output`
        #[arg(long)]
        report: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show your quiz statistics
    Stats {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List topics known to the backend
    Topics {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Check that the backend is reachable
    Health {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Admin question management
    Admin {
        #[command(subcommand)]
        action: AdminAction,

        /// Config file path
        #[arg(long, global = true)]
        config: Option<PathBuf>,
    },

    /// Create starter config and example quiz files
    Init,
}

#[derive(Subcommand)]
pub enum AdminAction {
    /// Generate a question with the given parameters
    Generate {
        #[arg(long)]
        topic: String,

        #[arg(long, default_value = "beginner")]
        difficulty: Difficulty,

        /// Question type, e.g. mcq, true_false, short_answer, open_ended, scenario
        #[arg(long, default_value = "mcq")]
        qtype: String,
    },

    /// Generate a random question
    GenerateRandom,

    /// Delete a stored question
    Delete {
        #[arg(long)]
        id: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("quizgrade=info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Grade {
            quiz,
            answers,
            format,
            output,
            save,
            config,
        } => commands::grade::execute(quiz, answers, format, output, save, config),
        Commands::Validate { quiz } => commands::validate::execute(quiz),
        Commands::Compare {
            baseline,
            current,
            fail_on_regression,
            format,
        } => commands::compare::execute(baseline, current, fail_on_regression, format),
        Commands::Fetch {
            topic,
            difficulty,
            mode,
            out,
            config,
        } => commands::fetch::execute(topic, difficulty, mode, out, config).await,
        Commands::Play {
            topic,
            difficulty,
            mode,
            no_submit,
            config,
        } => commands::play::execute(topic, difficulty, mode, no_submit, config).await,
        Commands::Login {
            username,
            password,
            register,
            email,
            config,
        } => commands::login::execute(username, password, register, email, config).await,
        Commands::Submit { report, config } => commands::submit::execute(report, config).await,
        Commands::Stats { config } => commands::stats::execute(config).await,
        Commands::Topics { config } => commands::topics::execute(config).await,
        Commands::Health { config } => commands::topics::health(config).await,
        Commands::Admin { action, config } => commands::admin::execute(action, config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
