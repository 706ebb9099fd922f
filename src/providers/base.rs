use serde::{Deserialize, Serialize};

use super::factory::ProviderType;
use super::types::message::ChatMessage;
use crate::errors::ProviderError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
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

/// Everything a provider needs for a single call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    /// System message first, then the user turn.
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

/// Text fragments in generation order. Finite and single-use; dropping it closes the
/// underlying response.
pub type FragmentStream = Box<dyn Iterator<Item = Result<String, ProviderError>> + Send>;

/// Base trait for remote completion providers (Groq, Gemini)
pub trait Provider: Send + Sync {
    fn provider_type(&self) -> ProviderType;

    /// Single-shot completion. Returns an empty string when the provider sends no content.
    fn complete(&self, request: &CompletionRequest) -> Result<(String, Usage), ProviderError>;

    /// Streaming completion, pulled lazily by the caller.
    fn stream(&self, request: &CompletionRequest) -> Result<FragmentStream, ProviderError>;
}
