use async_trait::async_trait;
use std::sync::Mutex;

use super::base::{Completion, Provider, ProviderError, TextStream, Usage};
use crate::models::message::Message;
use crate::models::tool::Tool;

/// A provider that replays pre-configured completions and delta streams,
/// for testing the orchestrator without a network.
pub struct MockProvider {
    completions: Mutex<Vec<Message>>,
    streams: Mutex<Vec<Vec<Result<String, ProviderError>>>>,
}

impl MockProvider {
    pub fn new(completions: Vec<Message>) -> Self {
        Self {
            completions: Mutex::new(completions),
            streams: Mutex::new(Vec::new()),
        }
    }

    /// Queue a delta stream returned by the next `stream` call.
    pub fn with_stream(self, deltas: Vec<&str>) -> Self {
        self.streams
            .lock()
            .unwrap()
            .push(deltas.into_iter().map(|d| Ok(d.to_string())).collect());
        self
    }

    /// Queue a stream that fails after the given deltas.
    pub fn with_failing_stream(self, deltas: Vec<&str>, error: ProviderError) -> Self {
        let mut items: Vec<Result<String, ProviderError>> =
            deltas.into_iter().map(|d| Ok(d.to_string())).collect();
        items.push(Err(error));
        self.streams.lock().unwrap().push(items);
        self
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(
        &self,
        _messages: &[Message],
        _tools: &[Tool],
    ) -> Result<Completion, ProviderError> {
        let mut completions = self.completions.lock().unwrap();
        let message = if completions.is_empty() {
            Message::assistant("")
        } else {
            completions.remove(0)
        };
        Ok(Completion {
            message,
            usage: Usage::default(),
        })
    }

    async fn stream(&self, _messages: &[Message]) -> Result<TextStream, ProviderError> {
        let mut streams = self.streams.lock().unwrap();
        let items = if streams.is_empty() {
            Vec::new()
        } else {
            streams.remove(0)
        };
        Ok(Box::pin(futures::stream::iter(items)))
    }
}
