//! The `quizgrade login` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use quizgrade_client::config::{save_token, CONFIG_FILE_NAME};
use quizgrade_core::traits::{Credentials, Registration};

use super::connect;

pub async fn execute(
    username: String,
    password: String,
    register: bool,
    email: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let (_, backend) = connect(config_path.as_deref().filter(|p| p.exists()))?;

    let token = if register {
        let email = email.context("--email is required with --register")?;
        backend
            .register(&Registration {
                username,
                email,
                password,
            })
            .await?
    } else {
        backend
            .login(&Credentials { username, password })
            .await?
    };

    let path = config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
    save_token(&path, &token.username, &token.access_token)?;
    println!("Logged in as {}. Token saved to {}", token.username, path.display());

    Ok(())
}
