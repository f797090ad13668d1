//! The `quizgrade topics` and `quizgrade health` commands.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::Table;

use super::connect;

pub async fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let (_, backend) = connect(config_path.as_deref())?;
    let topics = backend.topics().await?;

    if topics.is_empty() {
        println!("No topics available.");
        return Ok(());
    }

    let mut sorted: Vec<(String, u64)> = topics.into_iter().collect();
    sorted.sort();

    let mut table = Table::new();
    table.set_header(vec!["Topic", "Chunks"]);
    for (name, chunks) in sorted {
        table.add_row(vec![name, chunks.to_string()]);
    }
    println!("{table}");

    Ok(())
}

pub async fn health(config_path: Option<PathBuf>) -> Result<()> {
    let (_, backend) = connect(config_path.as_deref())?;
    let status = backend.health().await?;
    println!("Backend: {}", backend.name());
    println!("Status:  {}", status.status);
    if let Some(service) = status.service {
        println!("Service: {service}");
    }
    Ok(())
}
