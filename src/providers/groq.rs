use std::io::BufReader;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde_json::{json, Value};

use super::base::{CompletionRequest, FragmentStream, Provider, Usage};
use super::configs::GroqProviderConfig;
use super::factory::ProviderType;
use super::utils::{
    check_status, messages_to_openai_spec, openai_chunk_to_text, openai_response_to_text,
    openai_usage, sse_fragments,
};
use crate::errors::ProviderError;

/// OpenAI-compatible chat completions served by Groq (Llama-4 models).
pub struct GroqProvider {
    client: Client,
    config: GroqProviderConfig,
}

impl GroqProvider {
    pub fn new(config: GroqProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self { client, config })
    }

    fn payload(request: &CompletionRequest, stream: bool) -> Value {
        json!({
            "model": request.model,
            "messages": messages_to_openai_spec(&request.messages),
            "temperature": request.temperature,
            "top_p": request.top_p,
            "max_completion_tokens": request.max_tokens,
            "stream": stream,
        })
    }

    fn post(&self, payload: &Value) -> Result<Response, ProviderError> {
        let url = format!(
            "{}/openai/v1/chat/completions",
            self.config.host.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(payload)
            .send()?;

        check_status("groq", response)
    }
}

impl Provider for GroqProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Groq
    }

    fn complete(&self, request: &CompletionRequest) -> Result<(String, Usage), ProviderError> {
        let response = self.post(&Self::payload(request, false))?;
        let body = response.text()?;
        let data: Value = serde_json::from_str(&body)
            .map_err(|e| ProviderError::MalformedResponse(format!("{}: {}", e, body)))?;

        let text = openai_response_to_text(&data)?;
        Ok((text, openai_usage(&data)))
    }

    fn stream(&self, request: &CompletionRequest) -> Result<FragmentStream, ProviderError> {
        let response = self.post(&Self::payload(request, true))?;

        Ok(sse_fragments(BufReader::new(response), openai_chunk_to_text))
    }
}
