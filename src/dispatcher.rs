use anyhow::{Result, anyhow};
use tracing::{debug, info, warn};

use crate::content::TranslationRequest;
use crate::prompt;
use crate::providers::{self, Provider};

pub const DEFAULT_MODELS: [&str; 2] = ["gemini-3-flash-preview", "gemini-2.5-flash"];

const OVERLOADED_MESSAGE: &str = "⚠️ Service Overloaded. Please wait 60 seconds and try again.";

/// Outcome of a dispatch. Both arms carry displayable text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationResult {
    Translated { text: String, model: String },
    Failed { message: String },
}

impl TranslationResult {
    pub fn text(&self) -> &str {
        match self {
            TranslationResult::Translated { text, .. } => text,
            TranslationResult::Failed { message } => message,
        }
    }

    pub fn model(&self) -> Option<&str> {
        match self {
            TranslationResult::Translated { model, .. } => Some(model),
            TranslationResult::Failed { .. } => None,
        }
    }

    pub fn is_translated(&self) -> bool {
        matches!(self, TranslationResult::Translated { .. })
    }
}

/// Sends a request to each candidate model in order until one answers.
#[derive(Debug, Clone)]
pub struct Dispatcher<P: Provider> {
    provider: P,
    models: Vec<String>,
}

impl<P: Provider> Dispatcher<P> {
    pub fn new(provider: P, models: Vec<String>) -> Result<Self> {
        let models = models
            .into_iter()
            .map(|model| model.trim().to_string())
            .collect::<Vec<_>>();
        if models.is_empty() {
            return Err(anyhow!("model candidate list is empty"));
        }
        if models.iter().any(|model| model.is_empty()) {
            return Err(anyhow!("model candidate list contains an empty name"));
        }
        Ok(Self { provider, models })
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub async fn dispatch(&self, request: &TranslationRequest) -> TranslationResult {
        let instruction = match prompt::render_instruction(&request.source_lang, &request.target_lang)
        {
            Ok(instruction) => instruction,
            Err(err) => {
                return TranslationResult::Failed {
                    message: format!("Technical Error: {:#}", err),
                };
            }
        };
        let parts = providers::build_parts(instruction, &request.content);

        let mut last_error = String::new();
        for model in &self.models {
            debug!(
                "requesting {} ({} -> {}, {})",
                model,
                request.source_lang,
                request.target_lang,
                request.content.mime()
            );
            match self.provider.generate(model, parts.clone()).await {
                Ok(response) => {
                    info!("translated with {}", response.model);
                    return TranslationResult::Translated {
                        text: response.text,
                        model: response.model,
                    };
                }
                Err(err) if err.kind.is_transient() => {
                    warn!("{} unavailable ({:?}); trying next model", model, err.kind);
                    last_error = err.message;
                }
                Err(err) => {
                    warn!("{} failed: {}", model, err.message);
                    return TranslationResult::Failed {
                        message: format!("Technical Error ({}): {}", model, err.message),
                    };
                }
            }
        }

        TranslationResult::Failed {
            message: format!("{} \n(Error: {})", OVERLOADED_MESSAGE, last_error),
        }
    }
}
