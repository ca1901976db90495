use serde::{Deserialize, Serialize};

use crate::dispatcher::TranslationResult;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub(crate) struct TextRequest {
    pub(crate) text: String,
    pub(crate) source_lang: Option<String>,
    pub(crate) target_lang: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TranslateResponse {
    pub(crate) ok: bool,
    pub(crate) result: String,
    pub(crate) model: Option<String>,
}

impl From<TranslationResult> for TranslateResponse {
    fn from(result: TranslationResult) -> Self {
        Self {
            ok: result.is_translated(),
            model: result.model().map(|model| model.to_string()),
            result: result.text().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SettingsInfo {
    pub(crate) languages: Vec<String>,
    pub(crate) default_source_lang: String,
    pub(crate) default_target_lang: String,
    pub(crate) models: Vec<String>,
    pub(crate) max_upload_bytes: usize,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
}
