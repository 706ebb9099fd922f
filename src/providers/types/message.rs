use serde::{Deserialize, Serialize};

use super::content::ContentPart;
use crate::errors::{AgentError, AgentResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A role-tagged message sent to a completion provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: Vec<ContentPart>,
}

impl ChatMessage {
    pub fn new(role: Role, content: Vec<ContentPart>) -> AgentResult<Self> {
        let msg = Self { role, content };
        msg.validate()?;
        Ok(msg)
    }

    fn validate(&self) -> AgentResult<()> {
        match self.role {
            Role::System => {
                if self.content.len() != 1 || !self.has_text() {
                    return Err(AgentError::InvalidInput(
                        "System message must be a single text part".to_string(),
                    ));
                }
            }
            Role::User => {
                if self.content.is_empty() {
                    return Err(AgentError::InvalidInput(
                        "You must provide text or an image.".to_string(),
                    ));
                }
            }
            Role::Assistant => {
                if self.has_image() {
                    return Err(AgentError::InvalidInput(
                        "Assistant message does not support images".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn system<S: Into<String>>(text: S) -> Self {
        Self {
            role: Role::System,
            content: vec![ContentPart::text(text)],
        }
    }

    /// A user turn; fails when `parts` is empty.
    pub fn user(parts: Vec<ContentPart>) -> AgentResult<Self> {
        Self::new(Role::User, parts)
    }

    pub fn assistant<S: Into<String>>(text: S) -> Self {
        Self {
            role: Role::Assistant,
            content: vec![ContentPart::text(text)],
        }
    }

    /// All text parts joined by newlines.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(ContentPart::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn image_urls(&self) -> Vec<&str> {
        self.content
            .iter()
            .filter_map(ContentPart::as_image_url)
            .collect()
    }

    fn has_text(&self) -> bool {
        self.content
            .iter()
            .any(|c| matches!(c, ContentPart::Text { .. }))
    }

    fn has_image(&self) -> bool {
        self.content
            .iter()
            .any(|c| matches!(c, ContentPart::ImageRef { .. }))
    }
}
