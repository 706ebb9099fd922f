use super::{
    base::Provider,
    configs::{GeminiProviderConfig, GroqProviderConfig, ProviderConfig},
    gemini::GeminiProvider,
    groq::GroqProvider,
};
use crate::errors::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    Groq,
    Gemini,
}

impl ProviderType {
    /// Load this provider's configuration from the environment.
    pub fn config_from_env(&self) -> Result<ProviderConfig, ProviderError> {
        Ok(match self {
            ProviderType::Groq => ProviderConfig::Groq(GroqProviderConfig::from_env()?),
            ProviderType::Gemini => ProviderConfig::Gemini(GeminiProviderConfig::from_env()?),
        })
    }
}

pub fn get_provider(config: ProviderConfig) -> Result<Box<dyn Provider + Send + Sync>, ProviderError> {
    match config {
        ProviderConfig::Groq(groq_config) => Ok(Box::new(GroqProvider::new(groq_config)?)),
        ProviderConfig::Gemini(gemini_config) => Ok(Box::new(GeminiProvider::new(gemini_config)?)),
    }
}
