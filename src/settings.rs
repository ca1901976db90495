use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::dispatcher::DEFAULT_MODELS;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");
const DEFAULT_LANGUAGES: [&str; 8] = [
    "English", "Hindi", "Telugu", "Spanish", "French", "German", "Japanese", "Chinese",
];

#[derive(Debug, Clone)]
pub struct Settings {
    pub languages: Vec<String>,
    pub source_lang: String,
    pub target_lang: String,
    pub models: Vec<String>,
    pub server_addr: String,
    pub max_upload_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            languages: DEFAULT_LANGUAGES.iter().map(|lang| lang.to_string()).collect(),
            source_lang: "English".to_string(),
            target_lang: "Hindi".to_string(),
            models: DEFAULT_MODELS.iter().map(|model| model.to_string()).collect(),
            server_addr: "127.0.0.1:8501".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    system: Option<SystemSettings>,
    models: Option<ModelSettings>,
    server: Option<ServerSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct SystemSettings {
    languages: Option<Vec<String>>,
    source_language: Option<String>,
    target_language: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ModelSettings {
    candidates: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSettings {
    addr: Option<String>,
    max_upload_mb: Option<usize>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    ensure_home_settings_file()?;

    let mut ordered_paths = Vec::new();
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings.merge(parsed);
        }
    }

    Ok(settings)
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(system) = incoming.system {
            if let Some(languages) = system.languages {
                let languages = non_blank(languages);
                if !languages.is_empty() {
                    self.languages = languages;
                }
            }
            if let Some(lang) = system.source_language
                && !lang.trim().is_empty()
            {
                self.source_lang = lang.trim().to_string();
            }
            if let Some(lang) = system.target_language
                && !lang.trim().is_empty()
            {
                self.target_lang = lang.trim().to_string();
            }
        }
        if let Some(models) = incoming.models
            && let Some(candidates) = models.candidates
        {
            let candidates = non_blank(candidates);
            if !candidates.is_empty() {
                self.models = candidates;
            }
        }
        if let Some(server) = incoming.server {
            if let Some(addr) = server.addr
                && !addr.trim().is_empty()
            {
                self.server_addr = addr.trim().to_string();
            }
            if let Some(limit) = server.max_upload_mb
                && limit > 0
            {
                self.max_upload_bytes = limit.saturating_mul(1024 * 1024);
            }
        }
    }
}

fn non_blank(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(home) = home_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".translingua"))
        }
    })
}
