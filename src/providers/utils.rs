use std::io::{BufRead, Lines};

use reqwest::blocking::Response;
use reqwest::StatusCode;
use serde_json::{json, Value};

use super::base::{FragmentStream, Usage};
use super::types::content::ContentPart;
use super::types::message::{ChatMessage, Role};
use crate::errors::ProviderError;
use crate::image::{guess_mime_type, parse_data_url};

/// Convert messages to the OpenAI chat-completions message specification.
///
/// System content is sent as a plain string; every other role sends its content parts.
pub fn messages_to_openai_spec(messages: &[ChatMessage]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| match message.role {
            Role::System => json!({
                "role": message.role,
                "content": message.text(),
            }),
            _ => json!({
                "role": message.role,
                "content": message.content,
            }),
        })
        .collect()
}

/// Convert messages to Gemini's `(system_instruction, contents)` pair.
pub fn messages_to_gemini_spec(messages: &[ChatMessage]) -> (Option<Value>, Vec<Value>) {
    let mut system_instruction = None;
    let mut contents = Vec::new();

    for message in messages {
        match message.role {
            Role::System => {
                system_instruction = Some(json!({
                    "parts": [{"text": message.text()}]
                }));
            }
            Role::User | Role::Assistant => {
                let role = if message.role == Role::User { "user" } else { "model" };
                let parts: Vec<Value> = message.content.iter().map(gemini_part).collect();
                contents.push(json!({
                    "role": role,
                    "parts": parts,
                }));
            }
        }
    }

    (system_instruction, contents)
}

fn gemini_part(part: &ContentPart) -> Value {
    match part {
        ContentPart::Text { text } => json!({"text": text}),
        ContentPart::ImageRef { image_url } => match parse_data_url(&image_url.url) {
            Some((mime_type, data)) => json!({
                "inline_data": {
                    "mime_type": mime_type,
                    "data": data,
                }
            }),
            None => {
                let path = image_url.url.split(['?', '#']).next();
                json!({
                    "file_data": {
                        "mime_type": guess_mime_type(path),
                        "file_uri": image_url.url,
                    }
                })
            }
        },
    }
}

/// Map a non-success HTTP status and its body to a provider error.
pub fn status_error(status: StatusCode, body: String) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Auth {
            status: status.as_u16(),
            body,
        },
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited(body),
        status if status.is_server_error() => ProviderError::Server {
            status: status.as_u16(),
            body,
        },
        _ => ProviderError::Request {
            status: status.as_u16(),
            body,
        },
    }
}

pub fn check_status(provider: &'static str, response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    tracing::warn!(provider, status = status.as_u16(), "completion request rejected");
    Err(status_error(status, body))
}

fn api_error(provider: &'static str, error: &Value) -> ProviderError {
    let message = error
        .get("message")
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string());
    ProviderError::Api { provider, message }
}

/// Extract `choices[0].message.content` from an OpenAI-style response.
pub fn openai_response_to_text(response: &Value) -> Result<String, ProviderError> {
    if let Some(error) = response.get("error") {
        return Err(api_error("groq", error));
    }

    let choice = response
        .get("choices")
        .and_then(|c| c.get(0))
        .ok_or_else(|| ProviderError::MalformedResponse(format!("no choices in {}", response)))?;

    Ok(choice["message"]["content"]
        .as_str()
        .unwrap_or_default()
        .to_string())
}

pub fn openai_usage(response: &Value) -> Usage {
    let Some(usage) = response.get("usage") else {
        return Usage::default();
    };

    let input_tokens = usage
        .get("prompt_tokens")
        .and_then(|v| v.as_i64())
        .map(|v| v as i32);

    let output_tokens = usage
        .get("completion_tokens")
        .and_then(|v| v.as_i64())
        .map(|v| v as i32);

    let total_tokens = usage
        .get("total_tokens")
        .and_then(|v| v.as_i64())
        .map(|v| v as i32)
        .or_else(|| match (input_tokens, output_tokens) {
            (Some(input), Some(output)) => Some(input + output),
            _ => None,
        });

    Usage::new(input_tokens, output_tokens, total_tokens)
}

/// Text delta of one streamed OpenAI-style chunk; empty when the chunk carries none.
pub fn openai_chunk_to_text(data: &str) -> Result<String, ProviderError> {
    let chunk: Value = serde_json::from_str(data)
        .map_err(|e| ProviderError::MalformedResponse(format!("{}: {}", e, data)))?;

    if let Some(error) = chunk.get("error") {
        return Err(api_error("groq", error));
    }

    Ok(chunk["choices"][0]["delta"]["content"]
        .as_str()
        .unwrap_or_default()
        .to_string())
}

/// Concatenated text of the first candidate of a Gemini response or stream chunk.
pub fn gemini_response_to_text(response: &Value) -> Result<String, ProviderError> {
    if let Some(error) = response.get("error") {
        return Err(api_error("gemini", error));
    }

    let text = response["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
                .collect::<String>()
        })
        .unwrap_or_default();

    Ok(text)
}

pub fn gemini_chunk_to_text(data: &str) -> Result<String, ProviderError> {
    let chunk: Value = serde_json::from_str(data)
        .map_err(|e| ProviderError::MalformedResponse(format!("{}: {}", e, data)))?;
    gemini_response_to_text(&chunk)
}

pub fn gemini_usage(response: &Value) -> Usage {
    let Some(usage) = response.get("usageMetadata") else {
        return Usage::default();
    };
    let field = |name: &str| usage.get(name).and_then(|v| v.as_i64()).map(|v| v as i32);
    Usage::new(
        field("promptTokenCount"),
        field("candidatesTokenCount"),
        field("totalTokenCount"),
    )
}

/// Server-sent event `data:` payloads read line by line from a blocking body.
///
/// Consecutive `data:` lines form one event and are joined with `\n`; a blank line
/// dispatches it. Ends at end of body, at a `[DONE]` payload, or after an I/O error.
pub struct SseEvents<R> {
    lines: Lines<R>,
    data: Option<String>,
    done: bool,
}

impl<R: BufRead> SseEvents<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            data: None,
            done: false,
        }
    }

    fn dispatch(&mut self) -> Option<Result<String, ProviderError>> {
        let data = self.data.take()?;
        if data == "[DONE]" {
            self.done = true;
            return None;
        }
        Some(Ok(data))
    }
}

impl<R: BufRead> Iterator for SseEvents<R> {
    type Item = Result<String, ProviderError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let line = match self.lines.next() {
                Some(Ok(line)) => line,
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(ProviderError::Stream(e.to_string())));
                }
                None => {
                    self.done = true;
                    return self.dispatch();
                }
            };

            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                if self.data.is_some() {
                    return self.dispatch();
                }
                continue;
            }

            // comments, event:, id: and retry: fields carry nothing we use
            let Some(value) = line.strip_prefix("data:") else {
                continue;
            };
            let value = value.strip_prefix(' ').unwrap_or(value);

            match self.data.as_mut() {
                Some(data) => {
                    data.push('\n');
                    data.push_str(value);
                }
                None => self.data = Some(value.to_string()),
            }
        }
    }
}

/// Parse each event of an SSE body into a text fragment.
///
/// The stream is terminal on failure: nothing is yielded after the first `Err`.
pub fn sse_fragments<R>(
    reader: R,
    parse: fn(&str) -> Result<String, ProviderError>,
) -> FragmentStream
where
    R: BufRead + Send + 'static,
{
    let fragments = SseEvents::new(reader)
        .map(move |event| event.and_then(|data| parse(&data)))
        .scan(false, |failed, fragment| {
            if *failed {
                return None;
            }
            *failed = fragment.is_err();
            Some(fragment)
        });
    Box::new(fragments)
}
