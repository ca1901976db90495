use std::io::{self, IsTerminal, Read};

use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "translingua",
    version,
    about = "Translate documents, signs and text with Gemini"
)]
struct Cli {
    /// Target language label (default from settings: Hindi)
    #[arg(short = 'l', long = "lang")]
    lang: Option<String>,

    /// Source language label (default from settings: English)
    #[arg(short = 'L', long = "source-lang")]
    source_lang: Option<String>,

    /// API key (overrides GEMINI_API_KEY / GOOGLE_API_KEY)
    #[arg(short = 'k', long = "key")]
    key: Option<String>,

    /// File to translate (pdf/png/jpg/jpeg/txt)
    #[arg(short = 'd', long = "data")]
    data: Option<String>,

    /// Mime type for --data or piped input (auto, pdf, png, jpg, jpeg, txt or a full mime type)
    #[arg(short = 'M', long = "data-mime")]
    data_mime: Option<String>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Run the web UI on ADDR (default from settings: 127.0.0.1:8501)
    #[arg(long = "server", value_name = "ADDR", num_args = 0..=1, default_missing_value = "")]
    server: Option<String>,

    /// Show the selectable languages and exit
    #[arg(long = "show-enabled-languages")]
    show_enabled_languages: bool,

    /// Show the model candidates in fallback order and exit
    #[arg(long = "show-models-list")]
    show_models_list: bool,

    /// Append the model that produced the translation
    #[arg(long = "with-using-model")]
    with_using_model: bool,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    translingua::logging::init(cli.verbose)?;

    let config = translingua::Config {
        source_lang: cli.source_lang,
        lang: cli.lang,
        key: cli.key,
        data: cli.data,
        data_mime: cli.data_mime,
        settings_path: cli.read_settings,
        show_enabled_languages: cli.show_enabled_languages,
        show_models_list: cli.show_models_list,
        with_using_model: cli.with_using_model,
    };

    if let Some(addr) = cli.server {
        return translingua::serve(config, Some(addr)).await;
    }

    let needs_stdin = config.data.is_none()
        && !(config.show_enabled_languages || config.show_models_list);
    let input = if needs_stdin && !io::stdin().is_terminal() {
        let mut buffer = Vec::new();
        io::stdin().read_to_end(&mut buffer)?;
        if buffer.is_empty() {
            None
        } else {
            Some(translingua::content::content_from_bytes(
                buffer,
                config.data_mime.as_deref(),
            )?)
        }
    } else {
        None
    };

    let output = translingua::run(config, input).await?;
    println!("{}", output);
    Ok(())
}
