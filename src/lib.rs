use anyhow::{Context, Result, anyhow};
use std::path::Path;
use tracing::debug;

pub mod content;
pub mod dispatcher;
pub mod logging;
pub mod prompt;
pub mod providers;
pub mod server;
pub mod settings;
#[cfg(test)]
mod test_util;

pub use content::{Attachment, Content, RawContent, TranslationRequest};
pub use dispatcher::{DEFAULT_MODELS, Dispatcher, TranslationResult};
pub use providers::{ErrorKind, Gemini, Provider, ProviderError};

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub source_lang: Option<String>,
    pub lang: Option<String>,
    pub key: Option<String>,
    pub data: Option<String>,
    pub data_mime: Option<String>,
    pub settings_path: Option<String>,
    pub show_enabled_languages: bool,
    pub show_models_list: bool,
    pub with_using_model: bool,
}

/// One-shot translation of `input` (or the `--data` file) printed by the CLI.
pub async fn run(config: Config, input: Option<Content>) -> Result<String> {
    let settings = load_settings(&config)?;

    if config.show_enabled_languages || config.show_models_list {
        return Ok(format_show_output(&config, &settings));
    }

    let content = match config.data.as_deref() {
        Some(path) => content::load_content(Path::new(path), config.data_mime.as_deref())?,
        None => input.ok_or_else(|| anyhow!("stdin is empty"))?,
    };
    if let Content::Text(text) = &content
        && text.trim().is_empty()
    {
        return Err(anyhow!("stdin is empty"));
    }

    let key = providers::resolve_key(config.key.as_deref())?;
    let dispatcher = Dispatcher::new(Gemini::new(key), settings.models.clone())?;
    let (source_lang, target_lang) = resolve_languages(&config, &settings);
    debug!(
        "translating {} from {} to {}",
        content.mime(),
        source_lang,
        target_lang
    );

    let request = TranslationRequest::new(content, source_lang, target_lang);
    let result = dispatcher.dispatch(&request).await;
    Ok(format_result(&result, config.with_using_model))
}

/// Starts the web UI. The API key is resolved up front so a missing key fails at startup.
pub async fn serve(config: Config, addr: Option<String>) -> Result<()> {
    let settings = load_settings(&config)?;
    let key = providers::resolve_key(config.key.as_deref())
        .with_context(|| "the web UI needs an API key at startup")?;
    let addr = addr
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| settings.server_addr.clone());
    server::run_server(settings, key, addr).await
}

fn load_settings(config: &Config) -> Result<settings::Settings> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    settings::load_settings(settings_path)
}

fn resolve_languages(config: &Config, settings: &settings::Settings) -> (String, String) {
    let pick = |value: Option<&String>, default: &String| {
        value
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .unwrap_or(default.as_str())
            .to_string()
    };
    (
        pick(config.source_lang.as_ref(), &settings.source_lang),
        pick(config.lang.as_ref(), &settings.target_lang),
    )
}

fn format_result(result: &TranslationResult, with_using_model: bool) -> String {
    let mut output = result.text().to_string();
    if with_using_model && let Some(model) = result.model() {
        output.push('\n');
        output.push_str(&format!("model: {}", model));
    }
    output
}

fn format_show_output(config: &Config, settings: &settings::Settings) -> String {
    let mut sections = Vec::new();
    if config.show_enabled_languages {
        sections.push(settings.languages.join("\n"));
    }
    if config.show_models_list {
        sections.push(settings.models.join("\n"));
    }
    sections.join("\n")
}
