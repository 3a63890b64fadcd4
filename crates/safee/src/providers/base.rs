use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::message::Message;
use crate::models::tool::Tool;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("request to model provider failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("model provider returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("could not parse model response: {0}")]
    Parse(String),

    #[error("invalid tool definition: {0}")]
    InvalidTool(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
}

impl Usage {
    pub fn new(
        input_tokens: Option<i32>,
        output_tokens: Option<i32>,
        total_tokens: Option<i32>,
    ) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }
}

/// One full chat completion. Tool calls requested by the model ride on the
/// message itself.
#[derive(Debug, Clone)]
pub struct Completion {
    pub message: Message,
    pub usage: Usage,
}

/// Incremental text deltas from a streaming completion.
pub type TextStream = BoxStream<'static, Result<String, ProviderError>>;

/// A chat-completions backend (OpenAI, Groq, or anything wire-compatible).
#[async_trait]
pub trait Provider: Send + Sync {
    /// Generate the next message, optionally advertising tools.
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[Tool],
    ) -> Result<Completion, ProviderError>;

    /// Generate the next message as a stream of text deltas, tools disabled.
    async fn stream(&self, messages: &[Message]) -> Result<TextStream, ProviderError>;
}
