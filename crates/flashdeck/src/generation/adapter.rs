//! Provider adapters.
//!
//! Each adapter knows how to phrase a request for one provider family and
//! which reply shapes it accepts. Reply bodies are first classified into a
//! [`ProviderReply`] without regard to the adapter, then the adapter picks
//! out the generated text or rejects the shape.

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::{ProviderConfig, ProviderKind};
use crate::error::GenerationError;

/// Result type for adapter operations.
pub type Result<T> = std::result::Result<T, GenerationError>;

/// A provider reply, discriminated by shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderReply {
    /// An explicit error payload.
    Error(String),
    /// A list of `generated_text` records.
    Enveloped(Vec<String>),
    /// Chat completion choices.
    Chat(Vec<String>),
    /// Cohere-style `generations` list.
    Generations(Vec<String>),
    /// Anything else: the body is the generated text.
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ReplyBody {
    Enveloped(Vec<Envelope>),
    Chat { choices: Vec<ChatChoice> },
    Generations { generations: Vec<Generation> },
    // Last; `error` is absent or null on bodies that carry no failure.
    Error { error: Option<ErrorDetail> },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Message(String),
    Object { message: String },
    Other(Value),
}

#[derive(Deserialize)]
struct Envelope {
    generated_text: String,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Deserialize)]
struct Generation {
    text: String,
}

/// Bare `{"message": ...}` bodies some providers send with a failing status.
#[derive(Deserialize)]
struct StatusMessage {
    message: String,
}

impl ProviderReply {
    /// Classify a raw HTTP reply.
    ///
    /// A failing status is always an [`ProviderReply::Error`]; the message is
    /// taken from the body when one can be found.
    #[must_use]
    pub fn classify(status: StatusCode, body: &str) -> Self {
        let parsed = serde_json::from_str::<ReplyBody>(body).ok();

        if !status.is_success() {
            if let Some(ReplyBody::Error { error: Some(error) }) = parsed {
                return Self::Error(error.into_message());
            }
            if let Ok(StatusMessage { message }) = serde_json::from_str(body) {
                return Self::Error(message);
            }
            return Self::Error(format!("HTTP {status}"));
        }

        match parsed {
            Some(ReplyBody::Error { error: Some(error) }) => Self::Error(error.into_message()),
            Some(ReplyBody::Enveloped(items)) if !items.is_empty() => {
                Self::Enveloped(items.into_iter().map(|e| e.generated_text).collect())
            }
            Some(ReplyBody::Chat { choices }) => {
                Self::Chat(choices.into_iter().map(|c| c.message.content).collect())
            }
            Some(ReplyBody::Generations { generations }) => {
                Self::Generations(generations.into_iter().map(|g| g.text).collect())
            }
            Some(ReplyBody::Enveloped(_) | ReplyBody::Error { error: None }) | None => {
                Self::Text(body.to_string())
            }
        }
    }

    /// Short name of the shape, for diagnostics.
    #[must_use]
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Error(_) => "error payload",
            Self::Enveloped(_) => "generated_text list",
            Self::Chat(_) => "chat completion",
            Self::Generations(_) => "generations list",
            Self::Text(_) => "plain text",
        }
    }
}

impl ErrorDetail {
    fn into_message(self) -> String {
        match self {
            Self::Message(message) | Self::Object { message } => message,
            Self::Other(value) => value.to_string(),
        }
    }
}

/// Request construction and reply unwrapping for one provider family.
pub trait ProviderAdapter: std::fmt::Debug + Send + Sync {
    /// The provider family this adapter speaks to.
    fn kind(&self) -> ProviderKind;

    /// Build the JSON request body for `prompt`.
    fn request_body(&self, prompt: &str, config: &ProviderConfig) -> Value;

    /// Pick the generated text out of an accepted reply.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Provider`] for error payloads and
    /// [`GenerationError::UnexpectedShape`] for shapes this adapter does not
    /// accept.
    fn unwrap_reply(&self, reply: ProviderReply) -> Result<String>;

    /// Convert an error payload, or reject the shape.
    ///
    /// # Errors
    ///
    /// Always returns an error.
    fn reject(&self, reply: ProviderReply) -> Result<String> {
        match reply {
            ProviderReply::Error(message) => Err(GenerationError::Provider {
                provider: self.kind().label(),
                message,
            }),
            other => Err(GenerationError::unexpected_shape(format!(
                "{} adapter cannot read a {}",
                self.kind(),
                other.shape()
            ))),
        }
    }
}

fn first_or_shape_error(items: Vec<String>, what: &str) -> Result<String> {
    items
        .into_iter()
        .next()
        .ok_or_else(|| GenerationError::unexpected_shape(format!("empty {what}")))
}

/// Prompt-in, text-out completion endpoints (Cohere generate).
#[derive(Debug, Clone, Copy, Default)]
pub struct RawTextAdapter;

impl ProviderAdapter for RawTextAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::RawText
    }

    fn request_body(&self, prompt: &str, config: &ProviderConfig) -> Value {
        json!({
            "model": config.model,
            "prompt": prompt,
            "max_tokens": config.max_tokens,
            "temperature": config.temperature,
        })
    }

    fn unwrap_reply(&self, reply: ProviderReply) -> Result<String> {
        match reply {
            ProviderReply::Text(text) => Ok(text),
            ProviderReply::Generations(items) => first_or_shape_error(items, "generations list"),
            other => self.reject(other),
        }
    }
}

/// Hugging Face inference endpoints, which wrap output in `generated_text`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopedListAdapter;

impl ProviderAdapter for EnvelopedListAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::EnvelopedList
    }

    fn request_body(&self, prompt: &str, config: &ProviderConfig) -> Value {
        json!({
            "inputs": prompt,
            "parameters": {
                "max_new_tokens": config.max_tokens,
                "temperature": config.temperature,
                "return_full_text": false,
            },
        })
    }

    fn unwrap_reply(&self, reply: ProviderReply) -> Result<String> {
        match reply {
            ProviderReply::Enveloped(items) => first_or_shape_error(items, "envelope"),
            other => self.reject(other),
        }
    }
}

/// OpenAI-compatible chat completion endpoints.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatMessageAdapter;

impl ProviderAdapter for ChatMessageAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::ChatMessage
    }

    fn request_body(&self, prompt: &str, config: &ProviderConfig) -> Value {
        json!({
            "model": config.model,
            "messages": [{ "role": "user", "content": prompt }],
            "max_tokens": config.max_tokens,
            "temperature": config.temperature,
        })
    }

    fn unwrap_reply(&self, reply: ProviderReply) -> Result<String> {
        match reply {
            ProviderReply::Chat(items) => first_or_shape_error(items, "choices list"),
            other => self.reject(other),
        }
    }
}

/// Get the adapter for a provider kind.
#[must_use]
pub fn adapter_for(kind: ProviderKind) -> Box<dyn ProviderAdapter> {
    match kind {
        ProviderKind::RawText => Box::new(RawTextAdapter),
        ProviderKind::EnvelopedList => Box::new(EnvelopedListAdapter),
        ProviderKind::ChatMessage => Box::new(ChatMessageAdapter),
    }
}
