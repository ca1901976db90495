use anyhow::{Result, anyhow};
use std::future::Future;
use std::pin::Pin;

use crate::content::{Attachment, Content};

mod classify;
mod gemini;

pub use classify::classify_error;
pub use gemini::Gemini;

/// How a failed model call should be treated by the fallback loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    QuotaExhausted,
    Other,
}

impl ErrorKind {
    /// Transient kinds are specific to the attempted model; the next candidate may still answer.
    pub fn is_transient(self) -> bool {
        matches!(self, ErrorKind::NotFound | ErrorKind::QuotaExhausted)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ProviderError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Builds an error whose kind is derived from the raw error text.
    pub fn from_text(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: classify_error(None, &message),
            message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderResponse {
    pub text: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text(String),
    Attachment(Attachment),
}

/// Orders the instruction and the content the way the backend expects them.
pub fn build_parts(instruction: String, content: &Content) -> Vec<Part> {
    match content {
        Content::Attachment(attachment) => {
            vec![Part::Attachment(attachment.clone()), Part::Text(instruction)]
        }
        Content::Text(text) => vec![Part::Text(instruction), Part::Text(text.clone())],
    }
}

pub type ProviderFuture =
    Pin<Box<dyn Future<Output = std::result::Result<ProviderResponse, ProviderError>> + Send>>;

pub trait Provider: Clone + Send + Sync {
    fn generate(&self, model: &str, parts: Vec<Part>) -> ProviderFuture;
}

pub fn resolve_key(override_key: Option<&str>) -> Result<String> {
    if let Some(key) = override_key
        && !key.trim().is_empty()
    {
        return Ok(key.trim().to_string());
    }
    get_env("GEMINI_API_KEY")
        .or_else(|| get_env("GOOGLE_API_KEY"))
        .ok_or_else(|| anyhow!("API key not found (checked --key, GEMINI_API_KEY, GOOGLE_API_KEY)"))
}

fn get_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_goes_before_instruction() {
        let content = Content::attachment(vec![1, 2], Some("image/png")).expect("content");
        let parts = build_parts("translate".to_string(), &content);
        assert_eq!(parts.len(), 2);
        assert!(matches!(&parts[0], Part::Attachment(att) if att.mime == "image/png"));
        assert_eq!(parts[1], Part::Text("translate".to_string()));
    }

    #[test]
    fn text_follows_instruction() {
        let parts = build_parts("translate".to_string(), &Content::text("Hello"));
        assert_eq!(
            parts,
            vec![
                Part::Text("translate".to_string()),
                Part::Text("Hello".to_string())
            ]
        );
    }

    #[test]
    fn provider_error_displays_raw_message() {
        let err = ProviderError::from_text("429 RESOURCE_EXHAUSTED");
        assert_eq!(err.kind, ErrorKind::QuotaExhausted);
        assert_eq!(err.to_string(), "429 RESOURCE_EXHAUSTED");
    }

    #[test]
    fn override_key_wins() {
        assert_eq!(resolve_key(Some(" abc ")).unwrap(), "abc");
    }
}
