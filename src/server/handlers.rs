use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::multipart::{Multipart, MultipartError};
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode};
use axum::middleware::Next;
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tracing::{debug, info};

use crate::content::{self, JPEG_MIME, TranslationRequest};
use crate::dispatcher::Dispatcher;
use crate::providers::{Gemini, Provider};
use crate::settings::Settings;

use super::models::{ErrorResponse, SettingsInfo, TextRequest, TranslateResponse};
use super::state::ServerState;

const MULTIPART_OVERHEAD: usize = 64 * 1024;

type HandlerError = (StatusCode, Json<ErrorResponse>);

pub async fn run_server(settings: Settings, key: String, addr: String) -> Result<()> {
    let provider = Gemini::new(key);
    let dispatcher = Dispatcher::new(provider, settings.models.clone())?;
    let app = router(Arc::new(ServerState::new(dispatcher, settings)?));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind server address: {}", addr))?;
    info!("TransLingua listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

pub(crate) fn router<P: Provider + 'static>(state: Arc<ServerState<P>>) -> Router {
    let body_limit = state
        .settings
        .max_upload_bytes
        .saturating_add(MULTIPART_OVERHEAD);
    Router::new()
        .route("/", get(index::<P>))
        .route("/health", get(health))
        .route("/settings", get(settings_info::<P>))
        .route("/translate", post(translate_text::<P>))
        .route("/translate/document", post(translate_document::<P>))
        .route("/translate/camera", post(translate_camera::<P>))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
        .layer(axum::middleware::from_fn(cors_middleware))
}

async fn index<P: Provider + 'static>(State(state): State<Arc<ServerState<P>>>) -> Html<String> {
    Html(state.index_html.clone())
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn settings_info<P: Provider + 'static>(
    State(state): State<Arc<ServerState<P>>>,
) -> Json<SettingsInfo> {
    Json(SettingsInfo {
        languages: state.settings.languages.clone(),
        default_source_lang: state.settings.source_lang.clone(),
        default_target_lang: state.settings.target_lang.clone(),
        models: state.dispatcher.models().to_vec(),
        max_upload_bytes: state.settings.max_upload_bytes,
    })
}

async fn cors_middleware(req: Request<Body>, next: Next) -> Result<Response<Body>, StatusCode> {
    if req.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return Ok(response);
    }
    let mut response = next.run(req).await;
    apply_cors_headers(response.headers_mut());
    Ok(response)
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET,POST,OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("content-type"),
    );
}

async fn translate_text<P: Provider + 'static>(
    State(state): State<Arc<ServerState<P>>>,
    Json(payload): Json<TextRequest>,
) -> Result<Json<TranslateResponse>, HandlerError> {
    if payload.text.trim().is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, "Please enter text first."));
    }
    let (source_lang, target_lang) = state.languages(
        payload.source_lang.as_deref(),
        payload.target_lang.as_deref(),
    );
    let request = TranslationRequest::text(payload.text, source_lang, target_lang);
    let result = state.dispatcher.dispatch(&request).await;
    Ok(Json(result.into()))
}

async fn translate_document<P: Provider + 'static>(
    State(state): State<Arc<ServerState<P>>>,
    multipart: Multipart,
) -> Result<Json<TranslateResponse>, HandlerError> {
    let form = read_upload_form(multipart, "file").await?;
    let upload = form
        .upload
        .ok_or_else(|| error(StatusCode::BAD_REQUEST, "file is required"))?;
    check_size(&upload.bytes, state.settings.max_upload_bytes)?;
    let mime = content::resolve_upload_mime(
        upload.content_type.as_deref(),
        upload.file_name.as_deref(),
        &upload.bytes,
    )
    .filter(|mime| content::is_supported_upload(mime))
    .ok_or_else(|| {
        error(
            StatusCode::BAD_REQUEST,
            "unsupported file type (expected pdf, png, jpg or jpeg)",
        )
    })?;
    debug!(
        "document upload {} ({} bytes, {})",
        upload.file_name.as_deref().unwrap_or("(unnamed)"),
        upload.bytes.len(),
        mime
    );

    let (source_lang, target_lang) =
        state.languages(form.source_lang.as_deref(), form.target_lang.as_deref());
    let request = TranslationRequest::binary(upload.bytes, Some(&mime), source_lang, target_lang)
        .map_err(|err| error(StatusCode::BAD_REQUEST, err.to_string()))?;
    let result = state.dispatcher.dispatch(&request).await;
    Ok(Json(result.into()))
}

async fn translate_camera<P: Provider + 'static>(
    State(state): State<Arc<ServerState<P>>>,
    multipart: Multipart,
) -> Result<Json<TranslateResponse>, HandlerError> {
    let form = read_upload_form(multipart, "image").await?;
    let upload = form
        .upload
        .ok_or_else(|| error(StatusCode::BAD_REQUEST, "image is required"))?;
    check_size(&upload.bytes, state.settings.max_upload_bytes)?;

    // Captures are always JPEG, whatever the browser declared.
    let (source_lang, target_lang) =
        state.languages(form.source_lang.as_deref(), form.target_lang.as_deref());
    let request =
        TranslationRequest::binary(upload.bytes, Some(JPEG_MIME), source_lang, target_lang)
            .map_err(|err| error(StatusCode::BAD_REQUEST, err.to_string()))?;
    let result = state.dispatcher.dispatch(&request).await;
    Ok(Json(result.into()))
}

struct Upload {
    bytes: Vec<u8>,
    content_type: Option<String>,
    file_name: Option<String>,
}

#[derive(Default)]
struct UploadForm {
    upload: Option<Upload>,
    source_lang: Option<String>,
    target_lang: Option<String>,
}

async fn read_upload_form(
    mut multipart: Multipart,
    file_field: &str,
) -> Result<UploadForm, HandlerError> {
    let mut form = UploadForm::default();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(|name| name.to_string()) else {
            continue;
        };
        match name.as_str() {
            "source_lang" => form.source_lang = Some(field.text().await.map_err(multipart_error)?),
            "target_lang" => form.target_lang = Some(field.text().await.map_err(multipart_error)?),
            name if name == file_field => {
                let content_type = field.content_type().map(|value| value.to_string());
                let file_name = field.file_name().map(|value| value.to_string());
                let bytes = field.bytes().await.map_err(multipart_error)?.to_vec();
                form.upload = Some(Upload {
                    bytes,
                    content_type,
                    file_name,
                });
            }
            _ => {}
        }
    }
    if form.upload.as_ref().is_some_and(|upload| upload.bytes.is_empty()) {
        return Err(error(StatusCode::BAD_REQUEST, "uploaded file is empty"));
    }
    Ok(form)
}

fn check_size(bytes: &[u8], limit: usize) -> Result<(), HandlerError> {
    if bytes.len() > limit {
        return Err(error(
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("file exceeds the {}MB upload limit", limit / (1024 * 1024)),
        ));
    }
    Ok(())
}

fn multipart_error(err: MultipartError) -> HandlerError {
    (
        err.status(),
        Json(ErrorResponse {
            error: err.body_text(),
        }),
    )
}

fn error(status: StatusCode, message: impl Into<String>) -> HandlerError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}
