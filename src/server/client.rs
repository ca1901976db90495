use anyhow::{Context, Result};
use tera::{Context as TeraContext, Tera};

use crate::settings::Settings;

const INDEX_TEMPLATE: &str = include_str!("templates/index.html.tera");

pub(crate) fn render_index_html(settings: &Settings) -> Result<String> {
    let mut context = TeraContext::new();
    context.insert("languages", &settings.languages);
    context.insert("source_lang", &settings.source_lang);
    context.insert("target_lang", &settings.target_lang);
    context.insert("max_upload_bytes", &settings.max_upload_bytes);
    context.insert("max_upload_mb", &(settings.max_upload_bytes / (1024 * 1024)));
    Tera::one_off(INDEX_TEMPLATE, &context, true).with_context(|| "failed to render index page")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_lists_languages_with_defaults_selected() {
        let html = render_index_html(&Settings::default()).expect("html");
        assert!(html.contains("Universal TransLingua AI"));
        assert!(html.contains(r#"<option value="English" selected>English</option>"#));
        assert!(html.contains(r#"<option value="Hindi" selected>Hindi</option>"#));
        assert!(html.contains("max 10MB"));
    }

    #[test]
    fn language_labels_are_escaped() {
        let settings = Settings {
            languages: vec!["<b>".to_string()],
            ..Settings::default()
        };
        let html = render_index_html(&settings).expect("html");
        assert!(html.contains("&lt;b&gt;"));
        assert!(!html.contains("<option value=\"<b>\""));
    }
}
