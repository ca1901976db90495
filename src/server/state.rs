use anyhow::Result;

use crate::dispatcher::Dispatcher;
use crate::providers::Provider;
use crate::settings::Settings;

use super::client::render_index_html;

pub(crate) struct ServerState<P: Provider> {
    pub(crate) dispatcher: Dispatcher<P>,
    pub(crate) settings: Settings,
    pub(crate) index_html: String,
}

impl<P: Provider> ServerState<P> {
    pub(crate) fn new(dispatcher: Dispatcher<P>, settings: Settings) -> Result<Self> {
        let index_html = render_index_html(&settings)?;
        Ok(Self {
            dispatcher,
            settings,
            index_html,
        })
    }

    /// Falls back to the configured default when the form left the language blank.
    pub(crate) fn languages(
        &self,
        source_lang: Option<&str>,
        target_lang: Option<&str>,
    ) -> (String, String) {
        let pick = |value: Option<&str>, default: &str| {
            value
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .unwrap_or(default)
                .to_string()
        };
        (
            pick(source_lang, &self.settings.source_lang),
            pick(target_lang, &self.settings.target_lang),
        )
    }
}
