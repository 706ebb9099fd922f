//! Send an uploaded image and a prompt to a hosted multimodal chat model and read the
//! answer back whole or as a stream of fragments.

pub mod agent;
pub mod errors;
pub mod image;
pub mod prompts;
pub mod providers;

pub use agent::{AgentConfig, Model, MultimodalChatAgent, TextStream};
pub use errors::{AgentError, AgentResult, ProviderError};
