//! The `quizgrade admin` commands.

use std::path::PathBuf;

use anyhow::Result;

use quizgrade_core::traits::GenerateQuestionRequest;

use super::{connect, render_question};
use crate::AdminAction;

pub async fn execute(action: AdminAction, config_path: Option<PathBuf>) -> Result<()> {
    let (config, backend) = connect(config_path.as_deref())?;
    let token = config.require_token()?;

    match action {
        AdminAction::Generate {
            topic,
            difficulty,
            qtype,
        } => {
            let request = GenerateQuestionRequest {
                topic,
                difficulty,
                qtype,
            };
            let question = backend.generate_question(token, &request).await?;
            println!("Generated question {}", question.id);
            print!("{}", render_question(&question));
            println!("Answer: {}", question.correct_answer);
        }
        AdminAction::GenerateRandom => {
            let question = backend.generate_random_question(token).await?;
            println!("Generated question {}", question.id);
            print!("{}", render_question(&question));
            println!("Answer: {}", question.correct_answer);
        }
        AdminAction::Delete { id } => {
            backend.delete_question(token, &id).await?;
            println!("Deleted question {id}");
        }
    }

    Ok(())
}
