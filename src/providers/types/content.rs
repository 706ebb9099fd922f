use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// One part of a message body.
///
/// Serializes to the OpenAI content-part shape, `{"type": "text", "text": ...}` or
/// `{"type": "image_url", "image_url": {"url": ...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text {
        text: String,
    },
    #[serde(rename = "image_url")]
    ImageRef {
        image_url: ImageUrl,
    },
}

impl ContentPart {
    pub fn text<S: Into<String>>(text: S) -> Self {
        ContentPart::Text { text: text.into() }
    }

    /// An image reference, either a `data:` URL or a remote URL.
    pub fn image_url<S: Into<String>>(url: S) -> Self {
        ContentPart::ImageRef {
            image_url: ImageUrl { url: url.into() },
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentPart::Text { text } => Some(text),
            _ => None,
        }
    }

    pub fn as_image_url(&self) -> Option<&str> {
        match self {
            ContentPart::ImageRef { image_url } => Some(&image_url.url),
            _ => None,
        }
    }
}
