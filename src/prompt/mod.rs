use anyhow::{Context, Result};
use tera::{Context as TeraContext, Tera};

const INSTRUCTION_TEMPLATE: &str = include_str!("instruction.tera");

/// Renders the translation instruction sent alongside every piece of content.
pub fn render_instruction(source_lang: &str, target_lang: &str) -> Result<String> {
    let mut context = TeraContext::new();
    context.insert("source_lang", source_lang.trim());
    context.insert("target_lang", target_lang.trim());
    let rendered = Tera::one_off(INSTRUCTION_TEMPLATE, &context, false)
        .with_context(|| "failed to render instruction")?;
    Ok(rendered.trim().to_string())
}
