//! Data-URL encoding for uploaded images.
//!
//! Encoding is purely mechanical: bytes are never checked to be a decodable image.
//! A provider receiving something that is not a graph or receipt reports that in-band.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use lazy_static::lazy_static;
use regex::Regex;

pub const DEFAULT_MIME_TYPE: &str = "image/png";

lazy_static! {
    static ref DATA_URL: Regex = Regex::new(r"(?s)^data:([^;,]+);base64,(.*)$").unwrap();
}

/// Infer an image MIME type from a filename extension.
///
/// Unknown, absent, or non-image extensions fall back to [`DEFAULT_MIME_TYPE`].
pub fn guess_mime_type(filename: Option<&str>) -> String {
    filename
        .and_then(|name| mime_guess::from_path(name).first())
        .filter(|mime| mime.type_().as_str() == "image")
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string())
}

/// Encode raw bytes as `data:<mime>;base64,<payload>`.
pub fn encode_image(bytes: &[u8], filename: Option<&str>) -> String {
    format!(
        "data:{};base64,{}",
        guess_mime_type(filename),
        BASE64.encode(bytes)
    )
}

/// Split a base64 data URL into `(mime, payload)`. Remote URLs yield `None`.
pub fn parse_data_url(url: &str) -> Option<(String, String)> {
    DATA_URL
        .captures(url)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
}
