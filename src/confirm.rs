//! Interactive yes/no gates.
//!
//! The pipeline asks a [`Confirmer`] instead of reading stdin itself, so tests
//! can answer the gates with canned responses.

use crate::error::Result;
use std::future::Future;

/// Trait answering a yes/no question
pub trait Confirmer {
    /// Ask the question; `true` means proceed
    fn confirm(&self, prompt: &str) -> impl Future<Output = Result<bool>>;
}

/// Confirmer reading `y`/`yes` from the terminal
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinConfirmer;

impl Confirmer for StdinConfirmer {
    async fn confirm(&self, prompt: &str) -> Result<bool> {
        let prompt = prompt.to_string();
        let answer = tokio::task::spawn_blocking(move || prompt_confirmation(&prompt))
            .await
            .map_err(|e| std::io::Error::other(format!("prompt task failed: {}", e)))??;
        Ok(answer)
    }
}

/// Prompt user for confirmation with y/n input
fn prompt_confirmation(prompt: &str) -> std::io::Result<bool> {
    use std::io::Write;

    print!("{} [y/N]: ", prompt);
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    Ok(is_affirmative(&input))
}

/// Whether a typed answer means yes
pub fn is_affirmative(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}
