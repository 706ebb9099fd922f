use std::env;

use crate::errors::ProviderError;

/// Unified enum to wrap the per-provider configurations
#[derive(Debug, Clone)]
pub enum ProviderConfig {
    Groq(GroqProviderConfig),
    Gemini(GeminiProviderConfig),
}

#[derive(Debug, Clone)]
pub struct GroqProviderConfig {
    pub host: String,
    pub api_key: String,
}

impl GroqProviderConfig {
    pub const DEFAULT_HOST: &'static str = "https://api.groq.com";

    pub fn new<S: Into<String>>(api_key: S) -> Self {
        Self {
            host: Self::DEFAULT_HOST.to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn with_host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = host.into();
        self
    }

    /// Reads `GROQ_API_KEY` (required) and `GROQ_API_HOST`.
    pub fn from_env() -> Result<Self, ProviderError> {
        let api_key = get_env("GROQ_API_KEY", true, None)?
            .ok_or_else(|| ProviderError::Config("Groq API key should be present".to_string()))?;

        let host = get_env("GROQ_API_HOST", false, Some(Self::DEFAULT_HOST.to_string()))?
            .unwrap_or_else(|| Self::DEFAULT_HOST.to_string());

        Ok(Self { host, api_key })
    }
}

#[derive(Debug, Clone)]
pub struct GeminiProviderConfig {
    pub host: String,
    pub api_key: String,
}

impl GeminiProviderConfig {
    pub const DEFAULT_HOST: &'static str = "https://generativelanguage.googleapis.com";

    pub fn new<S: Into<String>>(api_key: S) -> Self {
        Self {
            host: Self::DEFAULT_HOST.to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn with_host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = host.into();
        self
    }

    /// Reads `GOOGLE_API_KEY` (required) and `GEMINI_API_HOST`.
    pub fn from_env() -> Result<Self, ProviderError> {
        let api_key = get_env("GOOGLE_API_KEY", true, None)?
            .ok_or_else(|| ProviderError::Config("Google API key should be present".to_string()))?;

        let host = get_env("GEMINI_API_HOST", false, Some(Self::DEFAULT_HOST.to_string()))?
            .unwrap_or_else(|| Self::DEFAULT_HOST.to_string());

        Ok(Self { host, api_key })
    }
}

/// Helper function to get environment variables with error handling
fn get_env(
    key: &str,
    required: bool,
    default: Option<String>,
) -> Result<Option<String>, ProviderError> {
    match env::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) if !required => Ok(default),
        Err(env::VarError::NotPresent) => Err(ProviderError::Config(format!(
            "Environment variable '{}' is required but not set.",
            key
        ))),
        Err(e) => Err(ProviderError::Config(format!("{}: {}", key, e))),
    }
}
