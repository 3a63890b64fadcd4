use crate::error::{to_env_var, ConfigError};
use config::{Config, Environment};
use safee::providers::configs::OpenAiProviderConfig;
use safee::speech::VoiceConfig;
use serde::Deserialize;
use std::net::SocketAddr;

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|_| ConfigError::InvalidAddr { addr })
    }
}

#[derive(Debug, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_provider_host")]
    pub host: String,
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<i32>,
}

impl ProviderSettings {
    pub fn into_config(self) -> OpenAiProviderConfig {
        OpenAiProviderConfig {
            host: self.host,
            api_key: self.api_key,
            model: self.model,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SpeechSettings {
    #[serde(default = "default_speech_host")]
    pub host: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_voice_id")]
    pub voice_id: String,
    #[serde(default = "default_voice_model")]
    pub model: String,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            host: default_speech_host(),
            api_key: String::new(),
            voice_id: default_voice_id(),
            model: default_voice_model(),
        }
    }
}

impl SpeechSettings {
    pub fn voice_config(&self) -> VoiceConfig {
        VoiceConfig {
            voice_id: self.voice_id.clone(),
            model: self.model.clone(),
            ..VoiceConfig::default()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StorageSettings {
    #[serde(default = "default_knowledge_base")]
    pub knowledge_base: String,
    #[serde(default = "default_transcript")]
    pub transcript: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            knowledge_base: default_knowledge_base(),
            transcript: default_transcript(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    pub provider: ProviderSettings,
    #[serde(default)]
    pub speech: SpeechSettings,
    #[serde(default)]
    pub storage: StorageSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load_and_validate()
    }

    fn load_and_validate() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("SAFEE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let result: Result<Self, config::ConfigError> = config.try_deserialize();

        match result {
            Ok(settings) => Ok(settings),
            Err(err) => {
                tracing::debug!("configuration error: {:?}", &err);

                let error_str = err.to_string();
                if error_str.starts_with("missing field") {
                    let field = error_str
                        .trim_start_matches("missing field `")
                        .trim_end_matches('`');
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    })
                } else if let config::ConfigError::NotFound(field) = &err {
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    })
                } else {
                    Err(ConfigError::Other(err))
                }
            }
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_provider_host() -> String {
    "https://api.openai.com".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_speech_host() -> String {
    "https://api.elevenlabs.io/v1".to_string()
}

fn default_voice_id() -> String {
    VoiceConfig::default().voice_id
}

fn default_voice_model() -> String {
    VoiceConfig::default().model
}

fn default_knowledge_base() -> String {
    "kb/base_context.txt".to_string()
}

fn default_transcript() -> String {
    "kb/conversation_history.json".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clean_env() {
        for (key, _) in env::vars() {
            if key.starts_with("SAFEE_") {
                env::remove_var(&key);
            }
        }
    }

    #[test]
    #[serial]
    fn test_default_settings() {
        clean_env();
        env::set_var("SAFEE_PROVIDER__API_KEY", "test-key");

        let settings = Settings::new().unwrap();
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 8000);
        assert_eq!(settings.provider.host, "https://api.openai.com");
        assert_eq!(settings.provider.api_key, "test-key");
        assert_eq!(settings.provider.model, "gpt-4o");
        assert_eq!(settings.storage.knowledge_base, "kb/base_context.txt");
        assert_eq!(settings.storage.transcript, "kb/conversation_history.json");

        env::remove_var("SAFEE_PROVIDER__API_KEY");
    }

    #[test]
    #[serial]
    fn test_missing_api_key() {
        clean_env();

        match Settings::new() {
            Err(ConfigError::MissingEnvVar { env_var }) => {
                assert!(env_var.starts_with("SAFEE_"));
            }
            other => panic!("expected missing env var error, got {other:?}"),
        }
    }

    #[test]
    #[serial]
    fn test_environment_override() {
        clean_env();
        env::set_var("SAFEE_PROVIDER__API_KEY", "test-key");
        env::set_var("SAFEE_PROVIDER__HOST", "https://api.groq.com/openai");
        env::set_var("SAFEE_PROVIDER__MODEL", "llama-3.1-70b");
        env::set_var("SAFEE_PROVIDER__TEMPERATURE", "0.8");
        env::set_var("SAFEE_SERVER__PORT", "9090");
        env::set_var("SAFEE_SPEECH__API_KEY", "voice-key");

        let settings = Settings::new().unwrap();
        assert_eq!(settings.server.port, 9090);
        assert_eq!(settings.provider.host, "https://api.groq.com/openai");
        assert_eq!(settings.provider.model, "llama-3.1-70b");
        assert_eq!(settings.provider.temperature, Some(0.8));
        assert_eq!(settings.speech.api_key, "voice-key");

        for key in [
            "SAFEE_PROVIDER__API_KEY",
            "SAFEE_PROVIDER__HOST",
            "SAFEE_PROVIDER__MODEL",
            "SAFEE_PROVIDER__TEMPERATURE",
            "SAFEE_SERVER__PORT",
            "SAFEE_SPEECH__API_KEY",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_socket_addr_conversion() {
        let server_settings = ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 8000,
        };
        let addr = server_settings.socket_addr().unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:8000");
    }
}
