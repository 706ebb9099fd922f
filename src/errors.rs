use thiserror::Error;

/// Failures raised by a remote completion provider.
///
/// None of these are retried locally; they surface to the caller as-is.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authentication failed ({status}): {body}")]
    Auth { status: u16, body: String },

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Server error: {status}\n{body}")]
    Server { status: u16, body: String },

    #[error("Request failed: {status}\n{body}")]
    Request { status: u16, body: String },

    #[error("{provider} API error: {message}")]
    Api {
        provider: &'static str,
        message: String,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Stream interrupted: {0}")]
    Stream(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported model: {0}")]
    UnsupportedModel(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

pub type AgentResult<T> = Result<T, AgentError>;
