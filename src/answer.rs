//! Turning a question into an answer on the backend.

use std::fmt::Write as _;

use async_trait::async_trait;

use crate::history::{HISTORY_WINDOW, Turn};
use crate::llm::{ChatCompletionsDriver, ChatMessage};

/// System message sent with every question.
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Produces answers for `/ask`.
#[async_trait]
pub trait Answerer: Send + Sync {
    /// Answer one question. `question` is already trimmed and non-empty;
    /// `history` holds the visitor's earlier turns, oldest first.
    async fn answer(&self, question: &str, history: &[Turn]) -> anyhow::Result<String>;
}

/// Answers questions through a chat-completions model.
#[derive(Debug, Clone)]
pub struct LlmAnswerer {
    driver: ChatCompletionsDriver,
}

impl LlmAnswerer {
    /// Wrap a configured driver.
    #[must_use]
    pub fn new(driver: ChatCompletionsDriver) -> Self {
        Self { driver }
    }
}

#[async_trait]
impl Answerer for LlmAnswerer {
    async fn answer(&self, question: &str, history: &[Turn]) -> anyhow::Result<String> {
        let messages = [
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_prompt(question, history)),
        ];
        let answer = self.driver.complete(&messages).await?;
        Ok(answer.trim().to_string())
    }
}

/// Build the user prompt: the last [`HISTORY_WINDOW`] turns of `history`,
/// then `question`, then the answering rules.
#[must_use]
pub fn build_prompt(question: &str, history: &[Turn]) -> String {
    let mut prompt = String::from("You are an AI-powered assistant embedded in a chat widget.\n\n");
    if !history.is_empty() {
        prompt.push_str("Previous Conversation:\n");
        for turn in &history[history.len().saturating_sub(HISTORY_WINDOW)..] {
            let _ = writeln!(prompt, "User: {}\nAI: {}", turn.question, turn.answer);
        }
        prompt.push('\n');
    }
    let _ = writeln!(prompt, "User Question:\n{question}\n");
    prompt.push_str(
        "Rules:\n\
         - Answer ONLY the user's question\n\
         - Be concise and clear\n\
         - Do NOT hallucinate data\n",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_question_and_rules() {
        let prompt = build_prompt("What is Rust?", &[]);
        assert!(prompt.contains("User Question:\nWhat is Rust?\n"));
        assert!(prompt.contains("Answer ONLY the user's question"));
        assert!(prompt.ends_with("- Do NOT hallucinate data\n"));
        assert!(!prompt.contains("Previous Conversation:"));
    }

    #[test]
    fn test_prompt_includes_previous_turns_before_question() {
        let history = [
            Turn::new("Hello", "Hi there"),
            Turn::new("What is Rust?", "A language"),
        ];
        let prompt = build_prompt("Is it fast?", &history);

        let previous = prompt.find("Previous Conversation:\nUser: Hello\nAI: Hi there\n");
        let question = prompt.find("User Question:\nIs it fast?");
        assert!(previous.is_some());
        assert!(prompt.contains("User: What is Rust?\nAI: A language\n"));
        assert!(previous < question);
    }

    #[test]
    fn test_prompt_history_capped() {
        let history: Vec<Turn> = (0..HISTORY_WINDOW + 2)
            .map(|i| Turn::new(format!("q{i}"), format!("a{i}")))
            .collect();
        let prompt = build_prompt("next", &history);

        assert!(!prompt.contains("User: q1\n"));
        assert!(prompt.contains("User: q2\n"));
        assert_eq!(prompt.matches("\nAI: ").count(), HISTORY_WINDOW);
    }
}
