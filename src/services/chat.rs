//! Free-form astrologer chat with in-memory history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::llm::{LlmError, TextGenerator};

/// Who said a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    fn label(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "Astrologer",
        }
    }
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
    pub at: DateTime<Utc>,
}

/// A conversation, held for as long as its front-end session lives.
#[derive(Debug, Clone)]
pub struct ChatSession {
    persona: String,
    history: Vec<ChatTurn>,
    /// Oldest turns beyond this are left out of the prompt.
    max_prompt_turns: usize,
}

/// History keeps this many prompt windows before dropping the oldest turns.
const HISTORY_WINDOWS: usize = 5;

impl ChatSession {
    /// Default number of past turns included in each prompt.
    pub const DEFAULT_PROMPT_TURNS: usize = 20;

    pub fn new(persona: impl Into<String>) -> Self {
        Self {
            persona: persona.into(),
            history: Vec::new(),
            max_prompt_turns: Self::DEFAULT_PROMPT_TURNS,
        }
    }

    pub fn with_max_prompt_turns(mut self, turns: usize) -> Self {
        self.max_prompt_turns = turns;
        self
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    /// Most turns kept in history. Always even, so exchanges stay paired.
    pub fn max_history_turns(&self) -> usize {
        let cap = self.max_prompt_turns.saturating_mul(HISTORY_WINDOWS).max(2);
        cap + cap % 2
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Render the prompt for a new user message.
    pub fn build_prompt(&self, message: &str) -> String {
        let start = self.history.len().saturating_sub(self.max_prompt_turns);
        let mut prompt = String::with_capacity(self.persona.len() + message.len() + 64);
        prompt.push_str(&self.persona);
        prompt.push_str("\n\n");
        for turn in &self.history[start..] {
            prompt.push_str(turn.role.label());
            prompt.push_str(": ");
            prompt.push_str(&turn.content);
            prompt.push('\n');
        }
        prompt.push_str("User: ");
        prompt.push_str(message);
        prompt
    }

    /// Send a user message and record the exchange.
    ///
    /// History is only updated when the model answers, so a failed call can
    /// simply be retried.
    pub async fn ask(
        &mut self,
        generator: &dyn TextGenerator,
        message: &str,
    ) -> Result<String, LlmError> {
        let prompt = self.build_prompt(message);
        let reply = generator.generate(&prompt).await?;
        let reply = reply.trim().to_string();

        let now = Utc::now();
        self.history.push(ChatTurn {
            role: ChatRole::User,
            content: message.to_string(),
            at: now,
        });
        self.history.push(ChatTurn {
            role: ChatRole::Assistant,
            content: reply.clone(),
            at: now,
        });

        let cap = self.max_history_turns();
        if self.history.len() > cap {
            let excess = self.history.len() - cap;
            self.history.drain(..excess);
        }

        tracing::debug!("Chat session now has {} turns", self.history.len());
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Echoes the number of prompts seen and keeps the last prompt.
    #[derive(Default)]
    struct Echo {
        last_prompt: Mutex<String>,
        calls: Mutex<usize>,
        fail: bool,
    }

    #[async_trait]
    impl TextGenerator for Echo {
        async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
            if self.fail {
                return Err(LlmError::Connection("offline".to_string()));
            }
            *self.last_prompt.lock().unwrap() = prompt.to_string();
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            Ok(format!("  reply {}  ", *calls))
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    #[tokio::test]
    async fn test_history_grows_and_feeds_prompt() {
        let generator = Echo::default();
        let mut session = ChatSession::new("You are a stargazer.");

        let first = session.ask(&generator, "I am a Leo").await.unwrap();
        assert_eq!(first, "reply 1");
        assert_eq!(session.history().len(), 2);

        session.ask(&generator, "What about love?").await.unwrap();
        assert_eq!(session.history().len(), 4);
        assert_eq!(session.history()[2].role, ChatRole::User);

        let prompt = generator.last_prompt.lock().unwrap().clone();
        assert!(prompt.starts_with("You are a stargazer.\n\n"));
        assert!(prompt.contains("User: I am a Leo\nAstrologer: reply 1\n"));
        assert!(prompt.ends_with("User: What about love?"));
    }

    #[tokio::test]
    async fn test_failed_call_leaves_history_untouched() {
        let generator = Echo {
            fail: true,
            ..Default::default()
        };
        let mut session = ChatSession::new("persona");
        assert!(session.ask(&generator, "hello").await.is_err());
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_prompt_window_drops_oldest_turns() {
        let generator = Echo::default();
        let mut session = ChatSession::new("p").with_max_prompt_turns(2);
        session.ask(&generator, "first").await.unwrap();
        session.ask(&generator, "second").await.unwrap();

        let prompt = session.build_prompt("third");
        assert!(!prompt.contains("first"));
        assert!(prompt.contains("User: second\nAstrologer: reply 2\n"));
        assert_eq!(session.history().len(), 4);

        session.clear();
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_history_is_capped() {
        let generator = Echo::default();
        let mut session = ChatSession::new("p").with_max_prompt_turns(1);
        assert_eq!(session.max_history_turns(), 6);

        for i in 0..10 {
            session.ask(&generator, &format!("question {}", i)).await.unwrap();
        }

        let history = session.history();
        assert_eq!(history.len(), 6);
        assert_eq!(history[0].role, ChatRole::User);
        assert_eq!(history[0].content, "question 7");
        assert_eq!(history[5].content, "reply 10");
    }
}
