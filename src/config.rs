use thiserror::Error;

use crate::llm::{ChatClient, Provider};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("No LLM backend could be initialized, check API keys or the .env file")]
    NoBackendAvailable,
}

/// Fetch an optional environment variable, treating empty values as unset.
pub fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

/// Fetch a required environment variable, failing startup when it is absent.
pub fn require_env(key: &str) -> Result<String, ConfigError> {
    env_var(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_owned()))
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub api_key: String,
    pub model: String,
}

/// LLM backend candidates in fixed priority order: Groq, then OpenAI, then
/// DeepSeek. A backend without an API key in the environment is skipped.
#[derive(Debug, Clone, Default)]
pub struct BackendPreferences {
    pub groq: Option<BackendConfig>,
    pub openai: Option<BackendConfig>,
    pub deepseek: Option<BackendConfig>,
}

impl BackendPreferences {
    pub fn from_env() -> Self {
        let backend = |key_var: &str, model_var: &str, default_model: &str| {
            env_var(key_var).map(|api_key| BackendConfig {
                api_key,
                model: env_var(model_var).unwrap_or_else(|| default_model.to_owned()),
            })
        };

        Self {
            groq: backend("GROQ_API_KEY", "GROQ_MODEL", "llama-3.1-8b-instant"),
            openai: backend("OPENAI_API_KEY", "OPENAI_MODEL", "gpt-4o-mini"),
            deepseek: backend("DEEPSEEK_API_KEY", "DEEPSEEK_MODEL", "deepseek-chat"),
        }
    }

    /// Connect to the first backend that initializes successfully. Failures are
    /// soft: they are logged and the next candidate is tried. Exhausting all
    /// candidates is a fatal startup fault.
    pub fn connect(&self) -> Result<ChatClient, ConfigError> {
        let candidates = [
            (Provider::Groq, self.groq.as_ref()),
            (Provider::OpenAi, self.openai.as_ref()),
            (Provider::DeepSeek, self.deepseek.as_ref()),
        ];

        for (provider, config) in candidates {
            let Some(config) = config else {
                tracing::debug!("{} backend not configured, skipping", provider.label());
                continue;
            };
            match ChatClient::new(provider, config.api_key.clone(), config.model.clone()) {
                Ok(client) => {
                    tracing::info!(
                        "using {} backend with model {}",
                        provider.label(),
                        client.model()
                    );
                    return Ok(client);
                }
                Err(e) => {
                    tracing::warn!("{} initialization failed: {e}", provider.label());
                }
            }
        }

        Err(ConfigError::NoBackendAvailable)
    }
}
