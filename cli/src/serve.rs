//! Web upload front end.
//!
//! `GET /` serves an upload form and `POST /convert` takes a multipart field
//! named `pdf`, answering with the converted presentation as an attachment.
//! Every request converts inside its own temporary directory.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;

use pdfdeck::{convert_file, ConvertOptions, Error, ErrorKind};

const PPTX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>pdfdeck</title>
</head>
<body>
  <h1>PDF to PowerPoint</h1>
  <form action="/convert" method="post" enctype="multipart/form-data">
    <input type="file" name="pdf" accept="application/pdf,.pdf" required>
    <button type="submit">Convert</button>
  </form>
</body>
</html>
"#;

/// Server state shared across handlers
#[derive(Clone)]
pub struct ServeState {
    /// Conversion options applied to every upload
    options: Arc<ConvertOptions>,
}

impl ServeState {
    pub fn new(options: ConvertOptions) -> Self {
        Self {
            options: Arc::new(options),
        }
    }
}

/// Build the router. Request bodies above `max_upload` bytes are refused.
pub fn build_router(state: ServeState, max_upload: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/convert", post(convert_upload))
        .layer(DefaultBodyLimit::max(max_upload))
        .with_state(state)
}

/// Serve requests on `listener` until the process stops.
pub async fn serve(
    listener: TcpListener,
    state: ServeState,
    max_upload: usize,
) -> std::io::Result<()> {
    log::info!("Accepting uploads on {}", listener.local_addr()?);
    axum::serve(listener, build_router(state, max_upload)).await
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn convert_upload(
    State(state): State<ServeState>,
    mut multipart: Multipart,
) -> Result<Response, (StatusCode, String)> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (e.status(), e.body_text()))?
    {
        if field.name() != Some("pdf") {
            continue;
        }
        let stem = upload_stem(field.file_name());
        let data = field
            .bytes()
            .await
            .map_err(|e| (e.status(), e.body_text()))?;
        upload = Some((stem, data));
        break;
    }

    let (stem, data) = upload.ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            "missing form field `pdf`".to_string(),
        )
    })?;
    log::info!("Converting upload {} ({} bytes)", stem, data.len());

    let options = Arc::clone(&state.options);
    let title = stem.clone();
    let pptx = tokio::task::spawn_blocking(move || convert_bytes(&data, &title, &options))
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("conversion task failed: {e}"),
            )
        })?
        .map_err(|e| {
            log::warn!("Upload {} failed: {}", stem, e);
            (status_for(e.kind()), public_message(&e))
        })?;

    Ok((
        [
            (header::CONTENT_TYPE, PPTX_MIME.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}.pptx\"", stem),
            ),
        ],
        pptx,
    )
        .into_response())
}

/// Convert an uploaded PDF inside a private temporary directory and return
/// the presentation bytes. The directory is removed on return.
pub fn convert_bytes(data: &[u8], title: &str, options: &ConvertOptions) -> pdfdeck::Result<Vec<u8>> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("upload.pdf");
    let output = dir.path().join("converted.pptx");
    fs::write(&input, data)?;

    let mut options = options.clone();
    if options.title.is_none() {
        options.title = Some(title.to_string());
    }
    convert_file(&input, Some(&output), &options)?;
    Ok(fs::read(&output)?)
}

/// File stem of an uploaded file name, kept to characters that are safe in a
/// `Content-Disposition` header.
fn upload_stem(file_name: Option<&str>) -> String {
    let stem: String = file_name
        .map(Path::new)
        .and_then(Path::file_stem)
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ' '))
        .collect();

    match stem.trim() {
        "" => "converted".to_string(),
        trimmed => trimmed.to_string(),
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InputNotFound
        | ErrorKind::UnsupportedInputFormat
        | ErrorKind::PageRenderFailure => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Error text for the client. Server paths stay in the log.
fn public_message(err: &Error) -> String {
    match err {
        Error::Encrypted | Error::InvalidPassword | Error::EmptyDocument => err.to_string(),
        Error::PageRender { page, .. } => format!("page {} could not be rendered", page),
        _ if err.kind() == ErrorKind::UnsupportedInputFormat => {
            "the upload is not a readable PDF".to_string()
        }
        _ => "conversion failed".to_string(),
    }
}
