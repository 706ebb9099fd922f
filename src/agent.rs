use std::fmt;
use std::str::FromStr;

use tracing::{debug, info, info_span};
use uuid::Uuid;

use crate::errors::{AgentError, AgentResult};
use crate::image::encode_image;
use crate::prompts::UseCase;
use crate::providers::base::{CompletionRequest, Provider};
use crate::providers::configs::ProviderConfig;
use crate::providers::factory::{get_provider, ProviderType};
use crate::providers::types::content::ContentPart;
use crate::providers::types::message::ChatMessage;

/// The models this crate is allowed to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Model {
    #[default]
    LlamaScout,
    LlamaMaverick,
    GeminiPro,
}

impl Model {
    pub const ALL: [Model; 3] = [Model::LlamaScout, Model::LlamaMaverick, Model::GeminiPro];

    /// Identifier sent on the wire.
    pub fn id(&self) -> &'static str {
        match self {
            Model::LlamaScout => "meta-llama/llama-4-scout-17b-16e-instruct",
            Model::LlamaMaverick => "meta-llama/llama-4-maverick-17b-128e-instruct",
            Model::GeminiPro => "gemini-2.5-pro",
        }
    }

    pub fn alias(&self) -> &'static str {
        match self {
            Model::LlamaScout => "scout",
            Model::LlamaMaverick => "maverick",
            Model::GeminiPro => "gemini",
        }
    }

    pub fn provider_type(&self) -> ProviderType {
        match self {
            Model::LlamaScout | Model::LlamaMaverick => ProviderType::Groq,
            Model::GeminiPro => ProviderType::Gemini,
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Model {
    type Err = AgentError;

    /// Accepts either the wire identifier or the short alias.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Model::ALL
            .into_iter()
            .find(|model| model.id() == s || model.alias().eq_ignore_ascii_case(s))
            .ok_or_else(|| AgentError::UnsupportedModel(s.to_string()))
    }
}

/// Generation settings fixed for the lifetime of an agent.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    pub model: Model,
    pub system_prompt: String,
    pub temperature: f32,
    pub top_p: f32,
    /// Ceiling for single-shot completions.
    pub max_tokens: u32,
    /// Lower ceiling for the interactive streaming path.
    pub stream_max_tokens: u32,
}

impl AgentConfig {
    pub const DEFAULT_TEMPERATURE: f32 = 0.2;
    pub const DEFAULT_TOP_P: f32 = 0.2;
    pub const DEFAULT_MAX_TOKENS: u32 = 8192;
    pub const DEFAULT_STREAM_MAX_TOKENS: u32 = 2951;

    pub fn new<S: Into<String>>(model: Model, system_prompt: S) -> Self {
        Self {
            model,
            system_prompt: system_prompt.into(),
            temperature: Self::DEFAULT_TEMPERATURE,
            top_p: Self::DEFAULT_TOP_P,
            max_tokens: Self::DEFAULT_MAX_TOKENS,
            stream_max_tokens: Self::DEFAULT_STREAM_MAX_TOKENS,
        }
    }

    /// Preset prompt and sampling for a use case.
    pub fn for_use_case(model: Model, use_case: UseCase) -> Self {
        let config = Self::new(model, use_case.system_prompt());
        match use_case {
            UseCase::GraphAnalysis => config,
            UseCase::ReceiptOcr => config
                .with_temperature(0.0)
                .with_max_tokens(2048)
                .with_stream_max_tokens(2048),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_stream_max_tokens(mut self, stream_max_tokens: u32) -> Self {
        self.stream_max_tokens = stream_max_tokens;
        self
    }
}

/// Streamed answer fragments in generation order.
pub type TextStream = Box<dyn Iterator<Item = AgentResult<String>> + Send>;

/// Turns text plus an optional image into a multimodal request and returns the answer.
pub struct MultimodalChatAgent {
    provider: Box<dyn Provider + Send + Sync>,
    config: AgentConfig,
}

impl MultimodalChatAgent {
    /// Fails with [`AgentError::UnsupportedModel`] when `provider` does not serve the
    /// configured model.
    pub fn new(provider: Box<dyn Provider + Send + Sync>, config: AgentConfig) -> AgentResult<Self> {
        if provider.provider_type() != config.model.provider_type() {
            return Err(AgentError::UnsupportedModel(format!(
                "{} is not served by {:?}",
                config.model,
                provider.provider_type()
            )));
        }
        Ok(Self { provider, config })
    }

    pub fn from_provider_config(
        provider_config: ProviderConfig,
        config: AgentConfig,
    ) -> AgentResult<Self> {
        Self::new(get_provider(provider_config)?, config)
    }

    /// System message followed by one user turn of `[Text?, ImageRef?]`.
    pub fn build_messages(
        &self,
        text: &str,
        image_url: Option<&str>,
    ) -> AgentResult<Vec<ChatMessage>> {
        let mut parts = Vec::new();
        if !text.is_empty() {
            parts.push(ContentPart::text(text));
        }
        if let Some(url) = image_url.filter(|url| !url.is_empty()) {
            parts.push(ContentPart::image_url(url));
        }

        Ok(vec![
            ChatMessage::system(self.config.system_prompt.as_str()),
            ChatMessage::user(parts)?,
        ])
    }

    /// Non-streaming call; returns the whole answer, or `""` when the provider sends none.
    pub fn complete(
        &self,
        text: &str,
        image: Option<&[u8]>,
        filename: Option<&str>,
    ) -> AgentResult<String> {
        let span = info_span!("completion", request_id = %create_object_id("req"), model = %self.config.model);
        let _enter = span.enter();

        let request = self.request(text, image, filename, self.config.max_tokens)?;
        debug!(
            parts = request.messages[1].content.len(),
            streaming = false,
            "dispatching request"
        );

        let (answer, usage) = self.provider.complete(&request)?;
        info!(
            input_tokens = ?usage.input_tokens,
            output_tokens = ?usage.output_tokens,
            total_tokens = ?usage.total_tokens,
            "completion finished"
        );
        Ok(answer)
    }

    /// Streaming call. The returned iterator is pulled lazily; dropping it early closes
    /// the connection.
    pub fn stream(
        &self,
        text: &str,
        image: Option<&[u8]>,
        filename: Option<&str>,
    ) -> AgentResult<TextStream> {
        let span = info_span!("completion", request_id = %create_object_id("req"), model = %self.config.model);
        let _enter = span.enter();

        let request = self.request(text, image, filename, self.config.stream_max_tokens)?;
        debug!(
            parts = request.messages[1].content.len(),
            streaming = true,
            "dispatching request"
        );

        let fragments = self.provider.stream(&request)?;
        Ok(Box::new(fragments.map(|fragment| fragment.map_err(AgentError::from))))
    }

    fn request(
        &self,
        text: &str,
        image: Option<&[u8]>,
        filename: Option<&str>,
        max_tokens: u32,
    ) -> AgentResult<CompletionRequest> {
        let image_url = image
            .filter(|bytes| !bytes.is_empty())
            .map(|bytes| encode_image(bytes, filename));

        Ok(CompletionRequest {
            model: self.config.model.id().to_string(),
            messages: self.build_messages(text, image_url.as_deref())?,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            max_tokens,
        })
    }
}

fn create_object_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ProviderError;
    use crate::prompts::GRAPH_ANALYSIS_PROMPT;
    use crate::providers::mock::MockProvider;
    use crate::providers::types::message::Role;
    use std::sync::Arc;

    /// Forwards to a shared mock so tests can inspect the requests afterwards.
    struct Shared(Arc<MockProvider>);

    impl Provider for Shared {
        fn provider_type(&self) -> ProviderType {
            self.0.provider_type()
        }

        fn complete(
            &self,
            request: &CompletionRequest,
        ) -> Result<(String, crate::providers::base::Usage), ProviderError> {
            self.0.complete(request)
        }

        fn stream(
            &self,
            request: &CompletionRequest,
        ) -> Result<crate::providers::base::FragmentStream, ProviderError> {
            self.0.stream(request)
        }
    }

    fn graph_agent(responses: Vec<Vec<&str>>) -> (MultimodalChatAgent, Arc<MockProvider>) {
        let mock = Arc::new(MockProvider::new(ProviderType::Groq, responses));
        let agent = MultimodalChatAgent::new(
            Box::new(Shared(Arc::clone(&mock))),
            AgentConfig::for_use_case(Model::LlamaScout, UseCase::GraphAnalysis),
        )
        .unwrap();
        (agent, mock)
    }

    #[test]
    fn test_build_messages_requires_content() {
        let (agent, _) = graph_agent(vec![]);
        assert!(matches!(
            agent.build_messages("", None),
            Err(AgentError::InvalidInput(_))
        ));
        assert!(matches!(
            agent.build_messages("", Some("")),
            Err(AgentError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_build_messages_text_only() -> AgentResult<()> {
        let (agent, _) = graph_agent(vec![]);
        let messages = agent.build_messages("hello", None)?;

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], ChatMessage::system(GRAPH_ANALYSIS_PROMPT));
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].content, vec![ContentPart::text("hello")]);
        Ok(())
    }

    #[test]
    fn test_build_messages_image_only() -> AgentResult<()> {
        let (agent, _) = graph_agent(vec![]);
        let messages = agent.build_messages("", Some("data:image/png;base64,AAAA"))?;

        assert_eq!(
            messages[1].content,
            vec![ContentPart::image_url("data:image/png;base64,AAAA")]
        );
        Ok(())
    }

    #[test]
    fn test_build_messages_text_then_image() -> AgentResult<()> {
        let (agent, _) = graph_agent(vec![]);
        let messages = agent.build_messages("hello", Some("https://example.com/chart.png"))?;

        assert_eq!(
            messages[1].content,
            vec![
                ContentPart::text("hello"),
                ContentPart::image_url("https://example.com/chart.png"),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_complete_returns_stubbed_text() -> AgentResult<()> {
        let (agent, mock) = graph_agent(vec![vec!["Sales Trend\n", "Sales rise."]]);

        let answer = agent.complete("What's the trend?", None, None)?;

        assert_eq!(answer, "Sales Trend\nSales rise.");
        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].messages,
            vec![
                ChatMessage::system(GRAPH_ANALYSIS_PROMPT),
                ChatMessage::user(vec![ContentPart::text("What's the trend?")])?,
            ]
        );
        assert_eq!(requests[0].model, "meta-llama/llama-4-scout-17b-16e-instruct");
        assert_eq!(requests[0].max_tokens, 8192);
        assert_eq!(requests[0].temperature, 0.2);
        assert_eq!(requests[0].top_p, 0.2);
        Ok(())
    }

    #[test]
    fn test_complete_empty_provider_answer() -> AgentResult<()> {
        let (agent, _) = graph_agent(vec![]);
        assert_eq!(agent.complete("hi", None, None)?, "");
        Ok(())
    }

    #[test]
    fn test_complete_encodes_image() -> AgentResult<()> {
        let (agent, mock) = graph_agent(vec![vec!["ok"]]);

        agent.complete("", Some(b"\xff\xd8\xff".as_slice()), Some("receipt.jpg"))?;

        let request = &mock.requests()[0];
        assert_eq!(
            request.messages[1].image_urls(),
            vec![encode_image(b"\xff\xd8\xff", Some("receipt.jpg")).as_str()]
        );
        assert!(request.messages[1].image_urls()[0].starts_with("data:image/jpeg;base64,"));
        Ok(())
    }

    #[test]
    fn test_empty_image_bytes_are_ignored() {
        let (agent, mock) = graph_agent(vec![vec!["unused"]]);

        let result = agent.complete("", Some(b"".as_slice()), Some("chart.png"));

        assert!(matches!(result, Err(AgentError::InvalidInput(_))));
        assert!(mock.requests().is_empty());
    }

    #[test]
    fn test_stream_uses_lower_token_ceiling() -> AgentResult<()> {
        let (agent, mock) = graph_agent(vec![vec!["a", "", "b"]]);

        let fragments: Vec<String> = agent
            .stream("hello", None, None)?
            .collect::<AgentResult<_>>()?;

        assert_eq!(fragments, vec!["a", "", "b"]);
        assert_eq!(mock.requests()[0].max_tokens, 2951);
        Ok(())
    }

    #[test]
    fn test_stream_concatenation_matches_complete() -> AgentResult<()> {
        let fragments = vec!["Revenue", " by", " Quarter\n", "", "Up 12%."];
        let (agent, _) = graph_agent(vec![fragments.clone(), fragments]);

        let streamed: String = agent
            .stream("What's the trend?", Some(b"img".as_slice()), Some("c.png"))?
            .collect::<AgentResult<String>>()?;
        let completed = agent.complete("What's the trend?", Some(b"img".as_slice()), Some("c.png"))?;

        assert_eq!(streamed, completed);
        Ok(())
    }

    #[test]
    fn test_stream_can_stop_early() -> AgentResult<()> {
        let (agent, _) = graph_agent(vec![vec!["first", "second", "third"]]);

        let first: Vec<String> = agent
            .stream("hello", None, None)?
            .take(1)
            .collect::<AgentResult<_>>()?;

        assert_eq!(first, vec!["first"]);
        Ok(())
    }

    #[test]
    fn test_provider_error_propagates() {
        let agent = MultimodalChatAgent::new(
            Box::new(MockProvider::failing(
                ProviderType::Groq,
                ProviderError::Auth {
                    status: 401,
                    body: "Invalid API Key".to_string(),
                },
            )),
            AgentConfig::new(Model::LlamaMaverick, "sys"),
        )
        .unwrap();

        let err = agent.complete("hello", None, None).unwrap_err();
        assert!(matches!(err, AgentError::Provider(ProviderError::Auth { .. })));
    }

    #[test]
    fn test_stream_rejected_before_first_fragment() {
        let agent = MultimodalChatAgent::new(
            Box::new(MockProvider::failing(
                ProviderType::Groq,
                ProviderError::Server {
                    status: 503,
                    body: "unavailable".to_string(),
                },
            )),
            AgentConfig::new(Model::LlamaScout, "sys"),
        )
        .unwrap();

        let result = agent.stream("hello", None, None);
        assert!(matches!(
            result,
            Err(AgentError::Provider(ProviderError::Server { status: 503, .. }))
        ));
    }

    #[test]
    fn test_stream_failure_mid_answer() -> AgentResult<()> {
        let agent = MultimodalChatAgent::new(
            Box::new(
                MockProvider::new(ProviderType::Groq, vec![vec!["Sales", " rise"]])
                    .with_stream_failure(ProviderError::Stream("connection reset".to_string())),
            ),
            AgentConfig::new(Model::LlamaScout, "sys"),
        )?;

        let fragments: Vec<AgentResult<String>> = agent.stream("hello", None, None)?.collect();

        assert_eq!(fragments.len(), 3);
        assert_eq!(fragments[0].as_deref().ok(), Some("Sales"));
        assert_eq!(fragments[1].as_deref().ok(), Some(" rise"));
        assert!(matches!(
            &fragments[2],
            Err(AgentError::Provider(ProviderError::Stream(_)))
        ));
        Ok(())
    }

    #[test]
    fn test_model_must_match_provider() {
        let result = MultimodalChatAgent::new(
            Box::new(MockProvider::new(ProviderType::Groq, vec![])),
            AgentConfig::for_use_case(Model::GeminiPro, UseCase::ReceiptOcr),
        );
        assert!(matches!(result, Err(AgentError::UnsupportedModel(_))));
    }

    #[test]
    fn test_model_parsing() {
        for model in Model::ALL {
            assert_eq!(model.id().parse::<Model>().unwrap(), model);
            assert_eq!(model.alias().parse::<Model>().unwrap(), model);
        }
        assert_eq!("Scout".parse::<Model>().unwrap(), Model::LlamaScout);
        assert!(matches!(
            "gpt-4o".parse::<Model>(),
            Err(AgentError::UnsupportedModel(name)) if name == "gpt-4o"
        ));
    }

    #[test]
    fn test_receipt_preset() {
        let config = AgentConfig::for_use_case(Model::GeminiPro, UseCase::ReceiptOcr);
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.max_tokens, 2048);
        assert_eq!(config.stream_max_tokens, 2048);
        assert!(config.system_prompt.contains("No receipt detected"));
        assert_eq!(Model::GeminiPro.provider_type(), ProviderType::Gemini);
    }

    #[test]
    fn test_object_id_format() {
        let id = create_object_id("req");
        assert!(id.starts_with("req_"));
        assert_eq!(id.len(), "req_".len() + 32);
        assert_ne!(id, create_object_id("req"));
    }
}
