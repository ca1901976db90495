use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use super::{
    ErrorKind, Part, Provider, ProviderError, ProviderFuture, ProviderResponse, classify_error,
};

pub const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1/models";

/// Gemini `generateContent` client. The HTTP client and key are shared by every call.
#[derive(Debug, Clone)]
pub struct Gemini {
    client: reqwest::Client,
    key: String,
    base_url: String,
}

impl Gemini {
    pub fn new(key: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), key)
    }

    pub fn with_client(client: reqwest::Client, key: impl Into<String>) -> Self {
        Self {
            client,
            key: key.into(),
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        if !base_url.trim().is_empty() {
            self.base_url = base_url.trim_end_matches('/').to_string();
        }
        self
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/{}:generateContent", self.base_url, model)
    }
}

impl Provider for Gemini {
    fn generate(&self, model: &str, parts: Vec<Part>) -> ProviderFuture {
        let client = self.client.clone();
        let key = self.key.clone();
        let url = self.endpoint(model);
        let model = model.to_string();
        Box::pin(async move {
            let body = request_body(&parts);
            debug!("POST {} ({} parts)", url, parts.len());
            let response = client
                .post(&url)
                .header("x-goog-api-key", key)
                .json(&body)
                .send()
                .await
                .map_err(|err| {
                    ProviderError::from_text(format!(
                        "request failed: {}",
                        error_chain(&err.without_url())
                    ))
                })?;

            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            if status.is_success() {
                return extract_text(&text, &model);
            }
            let message = format_http_error(status, &text);
            Err(ProviderError::new(
                classify_error(Some(status.as_u16()), &message),
                message,
            ))
        })
    }
}

/// Joins an error with its `source()` chain, e.g. `connect: Connection refused (os error 111)`.
pub(crate) fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.ends_with(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}

pub(crate) fn request_body(parts: &[Part]) -> Value {
    let parts = parts
        .iter()
        .map(|part| match part {
            Part::Text(text) => json!({ "text": text }),
            Part::Attachment(attachment) => json!({
                "inline_data": {
                    "mime_type": attachment.mime,
                    "data": BASE64.encode(&attachment.bytes)
                }
            }),
        })
        .collect::<Vec<_>>();
    json!({
        "contents": [
            {
                "role": "user",
                "parts": parts
            }
        ]
    })
}

pub(crate) fn extract_text(
    body: &str,
    fallback_model: &str,
) -> Result<ProviderResponse, ProviderError> {
    let payload: GeminiResponse = serde_json::from_str(body).map_err(|err| {
        ProviderError::new(
            ErrorKind::Other,
            format!("failed to parse Gemini response JSON: {}", err),
        )
    })?;

    let Some(candidate) = payload.candidates.first() else {
        let reason = payload
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
            .unwrap_or_else(|| "unknown".to_string());
        return Err(ProviderError::new(
            ErrorKind::Other,
            format!("no candidate returned from Gemini (block reason: {})", reason),
        ));
    };

    let text = candidate
        .content
        .as_ref()
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|part| part.text.as_deref())
                .collect::<String>()
        })
        .unwrap_or_default();
    if text.trim().is_empty() {
        let reason = candidate.finish_reason.as_deref().unwrap_or("unknown");
        return Err(ProviderError::new(
            ErrorKind::Other,
            format!("no text returned from Gemini (finish reason: {})", reason),
        ));
    }

    let model = payload
        .model_version
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| fallback_model.to_string());
    Ok(ProviderResponse { text, model })
}

/// Renders a non-success response as `<code> <reason>. <message> | status: <STATUS>`.
pub(crate) fn format_http_error(status: StatusCode, body: &str) -> String {
    let detail = extract_gemini_error(body).or_else(|| {
        let trimmed = body.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });
    match detail {
        Some(detail) => format!("{}. {}", status, detail),
        None => status.to_string(),
    }
}

fn extract_gemini_error(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<GeminiError>,
    }

    #[derive(Deserialize)]
    struct GeminiError {
        message: Option<String>,
        status: Option<String>,
    }

    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let error = parsed.error?;
    let mut parts = Vec::new();
    if let Some(message) = error.message
        && !message.trim().is_empty()
    {
        parts.push(message);
    }
    if let Some(status) = error.status
        && !status.trim().is_empty()
    {
        parts.push(format!("status: {}", status));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" | "))
    }
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(rename = "promptFeedback")]
    prompt_feedback: Option<GeminiPromptFeedback>,
    #[serde(rename = "modelVersion")]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiPromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}
