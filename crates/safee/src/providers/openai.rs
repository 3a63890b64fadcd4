use async_stream::stream;
use futures::StreamExt;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use super::base::{Completion, Provider, ProviderError, TextStream};
use super::configs::OpenAiProviderConfig;
use super::utils::{
    delta_from_chunk, messages_to_openai_spec, openai_response_to_completion,
    tools_to_openai_spec,
};
use crate::models::message::Message;
use crate::models::tool::Tool;
use async_trait::async_trait;

pub struct OpenAiProvider {
    client: Client,
    config: OpenAiProviderConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600))
            .build()?;

        Ok(Self { client, config })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.config.host.trim_end_matches('/')
        )
    }

    fn base_payload(&self, messages: &[Message]) -> Value {
        let mut payload = json!({
            "model": self.config.model,
            "messages": messages_to_openai_spec(messages),
        });
        if let Some(temp) = self.config.temperature {
            payload
                .as_object_mut()
                .unwrap()
                .insert("temperature".to_string(), json!(temp));
        }
        if let Some(tokens) = self.config.max_tokens {
            payload
                .as_object_mut()
                .unwrap()
                .insert("max_tokens".to_string(), json!(tokens));
        }
        payload
    }

    async fn send(&self, payload: &Value) -> Result<reqwest::Response, ProviderError> {
        let response = self
            .client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::error!("model provider error: {status} - {message}");
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[Tool],
    ) -> Result<Completion, ProviderError> {
        let mut payload = self.base_payload(messages);
        if !tools.is_empty() {
            let tools_spec = tools_to_openai_spec(tools)?;
            payload
                .as_object_mut()
                .unwrap()
                .insert("tools".to_string(), json!(tools_spec));
            payload
                .as_object_mut()
                .unwrap()
                .insert("tool_choice".to_string(), json!("auto"));
        }

        let response: Value = self.send(&payload).await?.json().await?;
        if let Some(error) = response.get("error") {
            return Err(ProviderError::Parse(format!(
                "model provider error: {error}"
            )));
        }

        openai_response_to_completion(response)
    }

    async fn stream(&self, messages: &[Message]) -> Result<TextStream, ProviderError> {
        let mut payload = self.base_payload(messages);
        payload
            .as_object_mut()
            .unwrap()
            .insert("stream".to_string(), json!(true));

        let response = self.send(&payload).await?;
        let mut body = response.bytes_stream();

        Ok(Box::pin(stream! {
            let mut buffer = String::new();
            while let Some(chunk) = body.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(err) => {
                        yield Err(ProviderError::Transport(err));
                        return;
                    }
                };
                let text = match std::str::from_utf8(&chunk) {
                    Ok(text) => text,
                    Err(err) => {
                        yield Err(ProviderError::Parse(format!("invalid utf-8 in stream: {err}")));
                        return;
                    }
                };
                buffer.push_str(text);

                // Server-sent events arrive as `data: <json>` lines; a chunk
                // may end mid-line, so only complete lines are consumed.
                while let Some(newline) = buffer.find('\n') {
                    let line = buffer[..newline].trim().to_string();
                    buffer.drain(..=newline);

                    let data = match line.strip_prefix("data:") {
                        Some(data) => data.trim(),
                        None => continue,
                    };
                    if data == "[DONE]" {
                        return;
                    }

                    match serde_json::from_str::<Value>(data) {
                        Ok(chunk) => {
                            if let Some(delta) = delta_from_chunk(&chunk) {
                                if !delta.is_empty() {
                                    yield Ok(delta.to_string());
                                }
                            }
                        }
                        Err(err) => {
                            yield Err(ProviderError::Parse(format!(
                                "undecodable stream chunk: {err}"
                            )));
                            return;
                        }
                    }
                }
            }
        }))
    }
}
