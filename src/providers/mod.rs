use crate::core::error::DoloresError;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

pub mod base_client;
pub mod openai_compatible;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered text fragments of one assistant reply; consumed once.
pub type FragmentStream = BoxStream<'static, Result<String, DoloresError>>;

/// A stateless chat-completion backend. Every call carries the full history.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Returns the whole reply at once.
    async fn complete(&self, messages: &[Message]) -> Result<String, DoloresError>;

    /// Returns the reply as it is generated. The concatenated fragments equal
    /// what `complete` would return for the same model response.
    async fn stream(&self, messages: &[Message]) -> Result<FragmentStream, DoloresError>;
}
