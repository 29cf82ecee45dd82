//! Wire types for the completion endpoint

use serde::{Deserialize, Serialize};

use crate::prompt::{build_prompt, AnswerSet, SYSTEM_PERSONA};

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Persona instructions
    System,
    /// End-user prompt
    User,
}

/// Single chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message author
    pub role: ChatRole,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// System-role message
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }

    /// User-role message
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }
}

/// Request body: `{"messages": [...]}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Conversation, oldest first
    pub messages: Vec<ChatMessage>,
}

impl CompletionRequest {
    /// Two-message advice request: fixed persona, then the templated prompt
    pub fn for_advice(situation: &str, answers: &AnswerSet) -> Self {
        Self {
            messages: vec![
                ChatMessage::system(SYSTEM_PERSONA),
                ChatMessage::user(build_prompt(situation, answers)),
            ],
        }
    }

    /// Text of the user message, if any
    pub fn user_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == ChatRole::User)
            .map(|m| m.content.as_str())
    }
}

/// Response body; only `completion` is read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Generated advice text
    pub completion: String,
}
