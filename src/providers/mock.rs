use std::sync::Mutex;

use crate::errors::ProviderError;
use crate::providers::base::{CompletionRequest, FragmentStream, Provider, Usage};
use crate::providers::factory::ProviderType;

/// A mock provider that returns pre-configured responses for testing.
///
/// Each response is a list of fragments: `stream` yields them one by one and
/// `complete` returns them concatenated, like a deterministic remote model.
pub struct MockProvider {
    provider_type: ProviderType,
    responses: Mutex<Vec<Vec<String>>>,
    requests: Mutex<Vec<CompletionRequest>>,
    failure: Mutex<Option<ProviderError>>,
    stream_failure: Mutex<Option<ProviderError>>,
}

impl MockProvider {
    pub fn new(provider_type: ProviderType, responses: Vec<Vec<&str>>) -> Self {
        Self {
            provider_type,
            responses: Mutex::new(
                responses
                    .into_iter()
                    .map(|fragments| fragments.into_iter().map(String::from).collect())
                    .collect(),
            ),
            requests: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
            stream_failure: Mutex::new(None),
        }
    }

    /// The next call fails with `error` instead of answering.
    pub fn failing(provider_type: ProviderType, error: ProviderError) -> Self {
        let provider = Self::new(provider_type, vec![]);
        *provider.failure.lock().unwrap() = Some(error);
        provider
    }

    /// The next stream yields its scripted fragments and then fails with `error`.
    pub fn with_stream_failure(self, error: ProviderError) -> Self {
        *self.stream_failure.lock().unwrap() = Some(error);
        self
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_response(&self, request: &CompletionRequest) -> Result<Vec<String>, ProviderError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(error) = self.failure.lock().unwrap().take() {
            return Err(error);
        }
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            // Return empty response if no more pre-configured responses
            Ok(Vec::new())
        } else {
            Ok(responses.remove(0))
        }
    }
}

impl Provider for MockProvider {
    fn provider_type(&self) -> ProviderType {
        self.provider_type
    }

    fn complete(&self, request: &CompletionRequest) -> Result<(String, Usage), ProviderError> {
        Ok((self.next_response(request)?.concat(), Usage::default()))
    }

    fn stream(&self, request: &CompletionRequest) -> Result<FragmentStream, ProviderError> {
        let fragments = self.next_response(request)?;
        let failure = self.stream_failure.lock().unwrap().take();
        Ok(Box::new(fragments.into_iter().map(Ok).chain(failure.map(Err))))
    }
}
