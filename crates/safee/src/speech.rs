//! Text-to-speech for the streaming chat mode.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("speech request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("speech API error: {status} - {message}")]
    Api { status: u16, message: String },
}

#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Render `text` to an encoded waveform.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError>;
}

#[derive(Debug, Clone)]
pub struct VoiceConfig {
    pub voice_id: String,
    pub model: String,
    pub stability: f32,
    pub similarity_boost: f32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            voice_id: "21m00Tcm4TlvDq8ikWAM".to_string(),
            model: "eleven_multilingual_v2".to_string(),
            stability: 0.5,
            similarity_boost: 0.75,
        }
    }
}

/// ElevenLabs-compatible HTTP synthesizer.
pub struct HttpSynthesizer {
    client: Client,
    base_url: String,
    api_key: String,
    config: VoiceConfig,
}

impl HttpSynthesizer {
    pub fn new(
        base_url: String,
        api_key: String,
        config: VoiceConfig,
    ) -> Result<Self, SpeechError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            base_url,
            api_key,
            config,
        })
    }
}

#[async_trait]
impl Synthesizer for HttpSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
        let url = format!(
            "{}/text-to-speech/{}",
            self.base_url.trim_end_matches('/'),
            self.config.voice_id
        );

        let payload = json!({
            "text": text,
            "model_id": self.config.model,
            "voice_settings": {
                "stability": self.config.stability,
                "similarity_boost": self.config.similarity_boost,
            }
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "audio/mpeg")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::error!("speech API error: {status} - {message}");
            return Err(SpeechError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

/// Buffers streamed text and releases it one completed sentence at a time.
///
/// A sentence ends at `.`, `!` or `?`. Whatever is left when the stream
/// closes comes out of `flush`, terminal punctuation or not.
#[derive(Debug, Default)]
pub struct SentenceSplitter {
    buffer: String,
}

impl SentenceSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a delta and return any sentences it completed.
    pub fn push(&mut self, delta: &str) -> Vec<String> {
        self.buffer.push_str(delta);

        let mut sentences = Vec::new();
        while let Some(end) = self.buffer.find(|c: char| matches!(c, '.' | '!' | '?')) {
            let rest = self.buffer.split_off(end + 1);
            let sentence = std::mem::replace(&mut self.buffer, rest);
            let sentence = sentence.trim();
            // Punctuation-only fragments (the tail of an ellipsis) are not
            // worth a speech round-trip.
            if sentence.chars().any(char::is_alphanumeric) {
                sentences.push(sentence.to_string());
            }
        }
        sentences
    }

    /// Drain whatever is buffered, if anything.
    pub fn flush(&mut self) -> Option<String> {
        let leftover = std::mem::take(&mut self.buffer);
        let leftover = leftover.trim();
        if leftover.is_empty() {
            None
        } else {
            Some(leftover.to_string())
        }
    }
}

/// Fixed-output synthesizer for orchestrator tests.
#[cfg(test)]
pub struct StaticSynthesizer;

#[cfg(test)]
#[async_trait]
impl Synthesizer for StaticSynthesizer {
    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>, SpeechError> {
        Ok(vec![0x52, 0x49, 0x46, 0x46])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_splitter_two_sentences() {
        let mut splitter = SentenceSplitter::new();
        assert!(splitter.push("Hello").is_empty());
        assert_eq!(splitter.push(". How are").len(), 1);
        let last = splitter.push(" you?");
        assert_eq!(last, vec!["How are you?"]);
        assert!(splitter.flush().is_none());
    }

    #[test]
    fn test_splitter_single_delta() {
        let mut splitter = SentenceSplitter::new();
        let sentences = splitter.push("Hello. How are you?");
        assert_eq!(sentences, vec!["Hello.", "How are you?"]);
    }

    #[test]
    fn test_splitter_flush_without_terminator() {
        let mut splitter = SentenceSplitter::new();
        assert!(splitter.push("no punctuation here").is_empty());
        assert_eq!(splitter.flush().as_deref(), Some("no punctuation here"));
        assert!(splitter.flush().is_none());
    }

    #[test]
    fn test_splitter_skips_empty_fragments() {
        let mut splitter = SentenceSplitter::new();
        let sentences = splitter.push("Wait... what?");
        assert_eq!(sentences, vec!["Wait.", "what?"]);
    }

    #[tokio::test]
    async fn test_http_synthesizer_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/text-to-speech/voice_1"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
            .mount(&server)
            .await;

        let synthesizer = HttpSynthesizer::new(
            server.uri(),
            "key".to_string(),
            VoiceConfig {
                voice_id: "voice_1".to_string(),
                ..VoiceConfig::default()
            },
        )
        .unwrap();

        let audio = synthesizer.synthesize("Hello.").await.unwrap();
        assert_eq!(audio, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_http_synthesizer_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let synthesizer =
            HttpSynthesizer::new(server.uri(), "key".to_string(), VoiceConfig::default())
                .unwrap();

        match synthesizer.synthesize("Hello.").await {
            Err(SpeechError::Api { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "bad key");
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }
}
