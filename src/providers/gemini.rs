use std::io::BufReader;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde_json::{json, Value};

use super::base::{CompletionRequest, FragmentStream, Provider, Usage};
use super::configs::GeminiProviderConfig;
use super::factory::ProviderType;
use super::utils::{
    check_status, gemini_chunk_to_text, gemini_response_to_text, gemini_usage,
    messages_to_gemini_spec, sse_fragments,
};
use crate::errors::ProviderError;

/// Google Generative Language API (`generateContent` / `streamGenerateContent`).
pub struct GeminiProvider {
    client: Client,
    config: GeminiProviderConfig,
}

impl GeminiProvider {
    pub fn new(config: GeminiProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600))
            .build()?;

        Ok(Self { client, config })
    }

    fn payload(request: &CompletionRequest) -> Value {
        let (system_instruction, contents) = messages_to_gemini_spec(&request.messages);

        let mut payload = json!({
            "contents": contents,
            "generationConfig": {
                "temperature": request.temperature,
                "topP": request.top_p,
                "maxOutputTokens": request.max_tokens,
            }
        });
        if let (Some(system), Some(object)) = (system_instruction, payload.as_object_mut()) {
            object.insert("system_instruction".to_string(), system);
        }
        payload
    }

    fn post(&self, request: &CompletionRequest, method: &str) -> Result<Response, ProviderError> {
        let url = format!(
            "{}/v1beta/models/{}:{}",
            self.config.host.trim_end_matches('/'),
            request.model,
            method
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&Self::payload(request))
            .send()?;

        check_status("gemini", response)
    }
}

impl Provider for GeminiProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Gemini
    }

    fn complete(&self, request: &CompletionRequest) -> Result<(String, Usage), ProviderError> {
        let response = self.post(request, "generateContent")?;
        let body = response.text()?;
        let data: Value = serde_json::from_str(&body)
            .map_err(|e| ProviderError::MalformedResponse(format!("{}: {}", e, body)))?;

        let text = gemini_response_to_text(&data)?;
        Ok((text, gemini_usage(&data)))
    }

    fn stream(&self, request: &CompletionRequest) -> Result<FragmentStream, ProviderError> {
        let response = self.post(request, "streamGenerateContent?alt=sse")?;

        Ok(sse_fragments(BufReader::new(response), gemini_chunk_to_text))
    }
}
