//! The `quizgrade stats` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::Table;

use super::connect;

pub async fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let (config, backend) = connect(config_path.as_deref())?;
    let token = config.require_token()?;
    let stats = backend.user_stats(token).await?;

    if let Some(user) = &config.username {
        println!("Statistics for {user}");
    }
    println!("Quizzes taken:    {}", stats.total_quizzes);
    println!("Questions:        {}", stats.total_questions);
    println!("Correct answers:  {}", stats.correct_answers);
    println!("Accuracy:         {}%", stats.accuracy());
    if let Some(last) = &stats.last_quiz_date {
        println!("Last quiz:        {last}");
    }

    let topics = stats.topics_sorted();
    if topics.is_empty() {
        println!("\nNo quizzes recorded yet.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Topic", "Correct", "Total", "Accuracy"]);
    for (name, topic) in topics {
        table.add_row(vec![
            name.to_string(),
            topic.correct.to_string(),
            topic.total.to_string(),
            format!("{}%", topic.accuracy()),
        ]);
    }
    println!("\n{table}");

    Ok(())
}
