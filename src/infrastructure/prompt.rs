use crate::application::endpoint::Prompt;
use anyhow::{Context, Result};
use async_trait::async_trait;
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Asks on stderr and reads the answer from stdin.
///
/// Pressing enter accepts the pre-filled value; end of input cancels.
pub struct TerminalPrompt;

#[async_trait]
impl Prompt for TerminalPrompt {
    async fn ask(&self, message: &str, prefill: &str) -> Result<Option<String>> {
        let mut stderr = tokio::io::stderr();
        let question = format!("{} [{}]: ", message.bold(), prefill.dimmed());
        stderr
            .write_all(question.as_bytes())
            .await
            .context("Failed to write prompt")?;
        stderr.flush().await.context("Failed to write prompt")?;

        let mut line = String::new();
        let read = BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .context("Failed to read answer")?;

        Ok(answer(read, &line, prefill))
    }
}

fn answer(bytes_read: usize, line: &str, prefill: &str) -> Option<String> {
    if bytes_read == 0 {
        return None;
    }
    match line.trim() {
        "" if prefill.is_empty() => None,
        "" => Some(prefill.to_string()),
        typed => Some(typed.to_string()),
    }
}
