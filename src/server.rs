//! Embedded HTTP server offering upload-and-download conversion.
//!
//! `GET /` serves a small upload form; `POST /convert` takes a multipart
//! upload (`archive`, `output_name`) and answers with the package as an
//! attachment, or a plain-text message when the conversion fails.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;

use crate::config::ConverterConfig;
use crate::convert::{convert_archive, ConvertedPackage, PACKAGE_MIME_TYPE};
use crate::error::ConvertError;

/// Multipart field carrying the uploaded ZIP
const ARCHIVE_FIELD: &str = "archive";

/// Multipart field carrying the requested output name
const OUTPUT_NAME_FIELD: &str = "output_name";

/// Server state shared across requests. Only the immutable configuration
/// is shared; every conversion gets its own scratch directory.
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<ConverterConfig>,
}

/// Build the router with its upload limit applied
pub fn router(config: ConverterConfig) -> Router {
    let limit = config.server.max_upload_bytes;
    let state = Arc::new(ServerState {
        config: Arc::new(config),
    });

    Router::new()
        .route("/", get(index))
        .route("/convert", post(convert))
        .layer(DefaultBodyLimit::max(limit))
        .with_state(state)
}

/// Serve until Ctrl-C
pub async fn serve(config: ConverterConfig) -> std::io::Result<()> {
    let listener = TcpListener::bind(&config.server.bind).await?;
    log::info!("Converter listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(config))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            log::info!("Converter shutting down");
        })
        .await
}

async fn index(State(state): State<Arc<ServerState>>) -> Html<String> {
    Html(render_index(&state.config))
}

fn render_index(config: &ConverterConfig) -> String {
    let default_name = html_escape::encode_double_quoted_attribute(&config.output.default_name);
    let suffix = html_escape::encode_text(&config.package_suffix()).to_string();
    let folder = html_escape::encode_text(&config.archive.asset_folder).to_string();
    let data = html_escape::encode_text(&config.archive.data_extension).to_string();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>CSV to Anki APKG Converter</title>
</head>
<body>
<h1>CSV to Anki APKG Converter</h1>
<p>Upload a ZIP file containing one <code>.{data}</code> file of flashcards
(columns <code>{question}</code> and <code>{answer}</code>) and optionally an
<code>{folder}</code> folder with the images your cards reference as
<code>&lt;img src="{folder}/..."&gt;</code>.</p>
<form action="/convert" method="post" enctype="multipart/form-data">
<p><label>ZIP file <input type="file" name="{archive_field}" accept=".zip" required></label></p>
<p><label>Output filename <input type="text" name="{name_field}" value="{default_name}"></label>
<small>Will be saved as &lt;this&gt;{suffix}</small></p>
<p><button type="submit">Convert and Download</button></p>
</form>
</body>
</html>
"#,
        data = data,
        question = html_escape::encode_text(&config.columns.question),
        answer = html_escape::encode_text(&config.columns.answer),
        folder = folder,
        archive_field = ARCHIVE_FIELD,
        name_field = OUTPUT_NAME_FIELD,
        default_name = default_name,
        suffix = suffix,
    )
}

async fn convert(State(state): State<Arc<ServerState>>, mut multipart: Multipart) -> Response {
    let mut archive: Option<Vec<u8>> = None;
    let mut output_name = state.config.output.default_name.clone();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return (StatusCode::BAD_REQUEST, format!("Invalid upload: {}", e)).into_response()
            }
        };

        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some(ARCHIVE_FIELD) => match field.bytes().await {
                Ok(bytes) => archive = Some(bytes.to_vec()),
                Err(e) => {
                    return (StatusCode::BAD_REQUEST, format!("Invalid upload: {}", e))
                        .into_response()
                }
            },
            Some(OUTPUT_NAME_FIELD) => match field.text().await {
                Ok(text) => output_name = text,
                Err(e) => {
                    return (StatusCode::BAD_REQUEST, format!("Invalid upload: {}", e))
                        .into_response()
                }
            },
            _ => {}
        }
    }

    let config = Arc::clone(&state.config);

    // Conversion is blocking file and SQLite work
    let result = tokio::task::spawn_blocking(move || {
        convert_archive(archive.as_deref(), &output_name, &config)
    })
    .await;

    match result {
        Ok(Ok(package)) => package_response(package),
        Ok(Err(e)) => error_response(&e),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Conversion task failed: {}", e),
        )
            .into_response(),
    }
}

/// Map a conversion failure to a plain-text message for the requester
fn error_response(err: &ConvertError) -> Response {
    let status = if err.is_user_error() {
        StatusCode::BAD_REQUEST
    } else {
        log::error!("Conversion failed: {}", err);
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, err.to_string()).into_response()
}

/// `Content-Disposition` with an ASCII fallback name and the exact UTF-8 name
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(file_name)
    )
}

fn package_response(package: ConvertedPackage) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, PACKAGE_MIME_TYPE)
        .header(header::CONTENT_LENGTH, package.bytes.len())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition(&package.file_name),
        )
        .body(Body::from(package.bytes))
        .unwrap_or_else(|_| {
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to build response").into_response()
        })
}
