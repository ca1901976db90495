use anyhow::{Context, Result, anyhow};
use std::path::Path;

pub const PDF_MIME: &str = "application/pdf";
pub const PNG_MIME: &str = "image/png";
pub const JPEG_MIME: &str = "image/jpeg";
pub const TEXT_MIME: &str = "text/plain";
pub const OCTET_STREAM_MIME: &str = "application/octet-stream";

/// Binary payload plus the MIME type the backend should read it as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl Attachment {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Result<Self> {
        let mime = mime.into().trim().to_lowercase();
        if mime.is_empty() {
            return Err(anyhow!("mime type is required for binary content"));
        }
        Ok(Self { bytes, mime })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Attachment(Attachment),
}

impl Content {
    pub fn text(value: impl Into<String>) -> Self {
        Content::Text(value.into())
    }

    pub fn attachment(bytes: Vec<u8>, mime: Option<&str>) -> Result<Self> {
        let mime = mime.ok_or_else(|| anyhow!("mime type is required for binary content"))?;
        Ok(Content::Attachment(Attachment::new(bytes, mime)?))
    }

    pub fn mime(&self) -> &str {
        match self {
            Content::Text(_) => TEXT_MIME,
            Content::Attachment(attachment) => &attachment.mime,
        }
    }
}

/// Content as it arrives from a caller, before the mime invariant is checked.
#[derive(Debug, Clone)]
pub enum RawContent {
    Text(String),
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone)]
pub struct TranslationRequest {
    pub content: Content,
    pub source_lang: String,
    pub target_lang: String,
}

impl TranslationRequest {
    pub fn new(
        content: Content,
        source_lang: impl Into<String>,
        target_lang: impl Into<String>,
    ) -> Self {
        Self {
            content,
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
        }
    }

    pub fn text(
        text: impl Into<String>,
        source_lang: impl Into<String>,
        target_lang: impl Into<String>,
    ) -> Self {
        Self::new(Content::text(text), source_lang, target_lang)
    }

    /// Binary content needs a non-empty mime type; a mime supplied with text is dropped.
    pub fn from_parts(
        content: RawContent,
        mime: Option<&str>,
        source_lang: impl Into<String>,
        target_lang: impl Into<String>,
    ) -> Result<Self> {
        match content {
            RawContent::Text(text) => Ok(Self::text(text, source_lang, target_lang)),
            RawContent::Bytes(bytes) => Self::binary(bytes, mime, source_lang, target_lang),
        }
    }

    pub fn binary(
        bytes: Vec<u8>,
        mime: Option<&str>,
        source_lang: impl Into<String>,
        target_lang: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self::new(
            Content::attachment(bytes, mime)?,
            source_lang,
            target_lang,
        ))
    }
}

pub fn is_supported_upload(mime: &str) -> bool {
    matches!(
        mime.trim().to_lowercase().as_str(),
        PDF_MIME | PNG_MIME | JPEG_MIME
    )
}

pub fn mime_from_extension(name: &str) -> Option<&'static str> {
    let ext = Path::new(name)
        .extension()
        .and_then(|value| value.to_str())?
        .to_lowercase();
    match ext.as_str() {
        "pdf" => Some(PDF_MIME),
        "png" => Some(PNG_MIME),
        "jpg" | "jpeg" => Some(JPEG_MIME),
        "txt" => Some(TEXT_MIME),
        _ => None,
    }
}

pub fn sniff_mime(bytes: &[u8]) -> Option<String> {
    infer::get(bytes).map(|kind| kind.mime_type().to_string())
}

/// Picks the mime type for an upload: declared type, then file extension, then magic bytes.
pub fn resolve_upload_mime(
    declared: Option<&str>,
    name: Option<&str>,
    bytes: &[u8],
) -> Option<String> {
    if let Some(declared) = declared {
        let declared = declared.trim().to_lowercase();
        if !declared.is_empty() && declared != OCTET_STREAM_MIME {
            return Some(normalize_mime(&declared));
        }
    }
    if let Some(mime) = name.and_then(mime_from_extension) {
        return Some(mime.to_string());
    }
    sniff_mime(bytes)
}

/// Maps a user supplied mime hint (`pdf`, `png`, `jpg`, `image/jpeg`, ...) to a mime type.
pub fn resolve_mime_hint(hint: &str) -> Result<String> {
    let raw = hint.trim().to_lowercase();
    if raw.is_empty() {
        return Err(anyhow!("data-mime is empty"));
    }
    match raw.as_str() {
        "pdf" => Ok(PDF_MIME.to_string()),
        "png" => Ok(PNG_MIME.to_string()),
        "jpg" | "jpeg" => Ok(JPEG_MIME.to_string()),
        "txt" | "text" => Ok(TEXT_MIME.to_string()),
        value if value.contains('/') => Ok(normalize_mime(value)),
        other => Err(anyhow!("unsupported data-mime '{}'", other)),
    }
}

/// Reads a file into content. `text/plain` files become text, everything else an attachment.
pub fn load_content(path: &Path, mime_hint: Option<&str>) -> Result<Content> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read data file: {}", path.display()))?;
    let mime = match explicit_hint(mime_hint) {
        Some(hint) => resolve_mime_hint(hint)?,
        None => path
            .to_str()
            .and_then(mime_from_extension)
            .map(|mime| mime.to_string())
            .or_else(|| sniff_mime(&bytes))
            .ok_or_else(|| {
                anyhow!(
                    "unable to detect mime type of {} (use --data-mime)",
                    path.display()
                )
            })?,
    };
    content_with_mime(bytes, mime)
}

/// Turns piped bytes into content: UTF-8 is text, anything else is sniffed as an attachment.
pub fn content_from_bytes(bytes: Vec<u8>, mime_hint: Option<&str>) -> Result<Content> {
    if let Some(hint) = explicit_hint(mime_hint) {
        let mime = resolve_mime_hint(hint)?;
        return content_with_mime(bytes, mime);
    }
    let bytes = match String::from_utf8(bytes) {
        Ok(text) => return Ok(Content::Text(text)),
        Err(err) => err.into_bytes(),
    };
    let mime = sniff_mime(&bytes).ok_or_else(|| {
        anyhow!("stdin appears to be binary; pass --data-mime to name its type")
    })?;
    content_with_mime(bytes, mime)
}

fn explicit_hint(mime_hint: Option<&str>) -> Option<&str> {
    mime_hint.filter(|hint| !hint.trim().eq_ignore_ascii_case("auto"))
}

fn content_with_mime(bytes: Vec<u8>, mime: String) -> Result<Content> {
    if mime == TEXT_MIME {
        let text = String::from_utf8(bytes)
            .map_err(|_| anyhow!("text data must be UTF-8 (binary detected)"))?;
        return Ok(Content::Text(text));
    }
    Content::attachment(bytes, Some(&mime))
}

fn normalize_mime(mime: &str) -> String {
    match mime {
        "image/jpg" | "image/pjpeg" => JPEG_MIME.to_string(),
        other => other.to_string(),
    }
}
