//! Terminal prompts for interactive runs.

use std::io::{self, Write};

use async_trait::async_trait;

use crate::core::Prompt;
use crate::domain::{Entity, Post};

/// Reads answers from stdin on a blocking thread
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinPrompt;

#[async_trait]
impl Prompt for StdinPrompt {
    async fn confirm(&self, question: &str) -> bool {
        match ask(format!("{} (y/n): ", question)).await {
            Some(answer) => answer.trim().to_ascii_lowercase().starts_with('y'),
            None => false,
        }
    }

    async fn choose_owner(&self, post: &Post, candidates: &[Entity]) -> Option<usize> {
        let mut question = format!(
            "Post '{}' by {} in {} matches more than one entity:\n",
            post.id, post.author_name, post.source_feed_name
        );
        for (i, entity) in candidates.iter().enumerate() {
            question.push_str(&format!("  {}) {} '{}'\n", i + 1, entity.kind, entity.name));
        }
        question.push_str("Save under which one? (number, anything else skips): ");

        let answer = ask(question).await?;
        parse_choice(&answer, candidates.len())
    }
}

fn parse_choice(answer: &str, count: usize) -> Option<usize> {
    match answer.trim().parse::<usize>() {
        Ok(n) if (1..=count).contains(&n) => Some(n - 1),
        _ => None,
    }
}

async fn ask(question: String) -> Option<String> {
    tokio::task::spawn_blocking(move || {
        print!("{}", question);
        io::stdout().flush().ok()?;
        let mut line = String::new();
        io::stdin().read_line(&mut line).ok()?;
        Some(line)
    })
    .await
    .ok()
    .flatten()
}
