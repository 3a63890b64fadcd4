//! The chat orchestrator: system prompt assembly, the tool round, and the
//! sentence-chunked streaming reply.

use async_stream::stream;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::Serialize;
use std::path::PathBuf;

use crate::errors::AgentError;
use crate::models::message::Message;
use crate::prompt_template::load_prompt;
use crate::providers::base::Provider;
use crate::speech::{SentenceSplitter, Synthesizer};
use crate::tools::ToolRegistry;
use crate::transcript::TranscriptLog;

const SYSTEM_TEMPLATE: &str = include_str!("prompts/system.md");

#[derive(Clone, Debug, Serialize)]
struct SystemPromptContext {
    knowledge_base: String,
}

/// One sentence of the streaming reply, paired with synthesized audio.
#[derive(Debug, Clone, Serialize)]
pub struct SentenceAudio {
    pub text: String,
    /// Base64-encoded waveform data.
    pub audio: String,
}

/// The agent wires a chat-completions provider to the tool registry, the
/// speech synthesizer, and the conversation transcript. One instance is
/// built at startup and shared by every request.
pub struct Agent {
    provider: Box<dyn Provider>,
    registry: ToolRegistry,
    synthesizer: Box<dyn Synthesizer>,
    transcript: TranscriptLog,
    knowledge_base: PathBuf,
}

impl Agent {
    pub fn new(
        provider: Box<dyn Provider>,
        registry: ToolRegistry,
        synthesizer: Box<dyn Synthesizer>,
        transcript: TranscriptLog,
        knowledge_base: PathBuf,
    ) -> Self {
        Self {
            provider,
            registry,
            synthesizer,
            transcript,
            knowledge_base,
        }
    }

    pub fn transcript(&self) -> &TranscriptLog {
        &self.transcript
    }

    /// Insert the rendered system prompt at index 0 of the caller-supplied
    /// sequence. The knowledge base is re-read on every request; a missing
    /// file contributes an empty string.
    async fn prepare(&self, caller: Vec<Message>) -> Result<Vec<Message>, AgentError> {
        let knowledge_base = tokio::fs::read_to_string(&self.knowledge_base)
            .await
            .unwrap_or_default();
        let prompt = load_prompt(SYSTEM_TEMPLATE, &SystemPromptContext { knowledge_base })?;

        let mut messages = caller;
        messages.insert(0, Message::system(prompt));
        Ok(messages)
    }

    /// One completion with tools enabled. When the model asks for tools,
    /// each call is dispatched and `messages` grows by the assistant's
    /// tool-call message plus one tool result per call; otherwise the
    /// model's direct answer is returned untouched.
    async fn run_tool_round(
        &self,
        messages: &mut Vec<Message>,
    ) -> Result<Option<String>, AgentError> {
        let tools = self.registry.descriptors();
        let completion = self.provider.complete(messages, &tools).await?;

        if !completion.message.requests_tools() {
            return Ok(Some(completion.message.content));
        }

        let assistant = completion.message;
        let calls = assistant.tool_calls.clone();
        messages.push(assistant);
        for call in &calls {
            let rendered = self.registry.dispatch(call).await;
            messages.push(Message::tool_result(&call.id, rendered));
        }
        Ok(None)
    }

    /// Single-shot mode: one completion with tools, an optional tool round
    /// plus follow-up completion, then a transcript append.
    pub async fn reply(&self, messages: Vec<Message>) -> Result<String, AgentError> {
        let mut messages = self.prepare(messages).await?;

        let response = match self.run_tool_round(&mut messages).await? {
            Some(answer) => answer,
            None => self.provider.complete(&messages, &[]).await?.message.content,
        };

        self.log_conversation(&messages, &response).await;
        Ok(response)
    }

    /// Streaming mode: the tool round runs first, then the final answer is
    /// streamed, chunked into sentences, and synthesized one sentence at a
    /// time. Any mid-stream failure yields exactly one `Err` item and ends
    /// the stream; on clean completion the accumulated text is logged.
    pub fn reply_stream(
        &self,
        messages: Vec<Message>,
    ) -> BoxStream<'_, Result<SentenceAudio, AgentError>> {
        Box::pin(stream! {
            let mut messages = match self.prepare(messages).await {
                Ok(messages) => messages,
                Err(err) => {
                    yield Err(err);
                    return;
                }
            };

            // The final answer always comes from the streaming call; a
            // direct answer from the tool round is discarded.
            if let Err(err) = self.run_tool_round(&mut messages).await {
                yield Err(err);
                return;
            }

            let mut deltas = match self.provider.stream(&messages).await {
                Ok(deltas) => deltas,
                Err(err) => {
                    yield Err(err.into());
                    return;
                }
            };

            let mut splitter = SentenceSplitter::new();
            let mut accumulated = String::new();
            while let Some(delta) = deltas.next().await {
                let delta = match delta {
                    Ok(delta) => delta,
                    Err(err) => {
                        yield Err(err.into());
                        return;
                    }
                };
                accumulated.push_str(&delta);
                for sentence in splitter.push(&delta) {
                    match self.speak(sentence).await {
                        Ok(event) => yield Ok(event),
                        Err(err) => {
                            yield Err(err);
                            return;
                        }
                    }
                }
            }

            if let Some(leftover) = splitter.flush() {
                match self.speak(leftover).await {
                    Ok(event) => yield Ok(event),
                    Err(err) => {
                        yield Err(err);
                        return;
                    }
                }
            }

            self.log_conversation(&messages, &accumulated).await;
        })
    }

    async fn speak(&self, text: String) -> Result<SentenceAudio, AgentError> {
        let audio = self.synthesizer.synthesize(&text).await?;
        Ok(SentenceAudio {
            text,
            audio: BASE64.encode(audio),
        })
    }

    /// A failed transcript write is logged, never fatal to the request.
    async fn log_conversation(&self, messages: &[Message], response: &str) {
        if let Err(err) = self.transcript.append(messages, response).await {
            tracing::error!("failed to append conversation transcript: {err}");
        }
    }
}
