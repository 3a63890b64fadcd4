use thiserror::Error;

use crate::providers::base::ProviderError;
use crate::speech::SpeechError;

/// Failure modes of a single tool dispatch.
///
/// These never escape the dispatcher as errors: the dispatch loop renders
/// them to text and feeds that back to the model as the tool result.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Error parsing arguments: {0}")]
    InvalidArguments(String),

    #[error("Error executing `{tool}`: {message}")]
    Execution { tool: String, message: String },
}

pub type ToolResult<T> = Result<T, ToolError>;

/// Errors that surface from the chat orchestrator to the HTTP layer.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("model provider request failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("speech synthesis failed: {0}")]
    Speech(#[from] SpeechError),

    #[error("system prompt rendering failed: {0}")]
    Prompt(#[from] tera::Error),
}
