//! Web interface: a single page plus a JSON endpoint for questions.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::{EnkelError, Result};
use crate::orchestrator::Orchestrator;
use crate::rag::AnswerResult;
use crate::source::{DataSource, QueryRequest, UploadDirectory, UploadedDocument};
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info, warn};

const INDEX_HTML: &str = include_str!("index.html");

/// Largest accepted upload.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
    uploads: UploadDirectory,
    /// Serializes replacing the remembered upload.
    upload_lock: Mutex<()>,
}

/// Run the web server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Serve) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);

    // Every server session starts with an empty upload directory
    let uploads = UploadDirectory::new(settings.upload_dir());
    uploads.reset().await?;

    let orchestrator = Orchestrator::new(settings)?;
    let app = router(orchestrator, uploads);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Enkel");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Web page", "GET  /");
    Output::kv("Ask", "POST /ask (multipart: source, question, file)");
    Output::kv("Health", "GET  /health");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the application router.
pub fn router(orchestrator: Orchestrator, uploads: UploadDirectory) -> Router {
    let state = Arc::new(AppState {
        orchestrator,
        uploads,
        upload_lock: Mutex::new(()),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/ask", post(ask))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(state)
}

// === Response Types ===

#[derive(Serialize)]
struct AskResponse {
    question: String,
    answer: String,
    answered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    sources: Vec<SourceInfo>,
}

#[derive(Serialize)]
struct SourceInfo {
    label: String,
    score: f32,
    content: String,
}

impl From<AnswerResult> for AskResponse {
    fn from(result: AnswerResult) -> Self {
        Self {
            answer: result.answer_or_default().to_string(),
            answered: result.answer.is_some(),
            question: result.input,
            model: result.model,
            sources: result
                .context
                .into_iter()
                .map(|r| SourceInfo {
                    label: r.chunk.label(),
                    score: r.score,
                    content: r.chunk.content,
                })
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// === Handlers ===

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> impl IntoResponse {
    let sources: Vec<String> = DataSource::ALL.iter().map(|s| s.to_string()).collect();
    Json(serde_json::json!({ "status": "ok", "sources": sources }))
}

async fn ask(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    match answer_form(&state, multipart).await {
        Ok(result) => Json(AskResponse::from(result)).into_response(),
        Err(e) => {
            let status = status_for(&e);
            if status.is_server_error() {
                warn!("Question failed: {}", e);
            } else {
                debug!("Rejected question: {}", e);
            }
            (status, Json(ErrorResponse { error: e.to_string() })).into_response()
        }
    }
}

async fn answer_form(state: &AppState, mut multipart: Multipart) -> Result<AnswerResult> {
    let mut source = None;
    let mut question = None;
    let mut document = None;

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "source" => source = Some(field.text().await.map_err(malformed)?),
            "question" => question = Some(field.text().await.map_err(malformed)?),
            "file" => {
                let filename = field.file_name().unwrap_or("document.pdf").to_string();
                let bytes = field.bytes().await.map_err(malformed)?;
                // Browsers send an empty part when no file was picked
                if !bytes.is_empty() {
                    document = Some(UploadedDocument::new(filename, bytes.to_vec()));
                }
            }
            other => debug!("Ignoring form field '{}'", other),
        }
    }

    let mut request = QueryRequest::parse(
        source.as_deref().unwrap_or_default(),
        question.as_deref().unwrap_or_default(),
    )?;

    if let Some(document) = document {
        if request.source == DataSource::Document {
            request = request.with_document(document);
        }
    }

    info!("Answering from {}", request.source);
    let result = state.orchestrator.get_answer(&request, &state.uploads).await;

    // Only an upload that parsed as a PDF replaces the remembered one
    if let Some(document) = &request.document {
        if !matches!(result, Err(EnkelError::Pdf(_))) {
            if let Err(e) = remember_upload(state, document).await {
                warn!("Could not keep {} for later questions: {}", document.filename, e);
            }
        }
    }

    result
}

/// Keep the latest upload as the only file in the upload directory, so later
/// questions can omit the file.
async fn remember_upload(state: &AppState, document: &UploadedDocument) -> Result<()> {
    let _guard = state.upload_lock.lock().await;
    state.uploads.reset().await?;
    state.uploads.store(document).await?;
    Ok(())
}

fn malformed(err: impl std::fmt::Display) -> EnkelError {
    EnkelError::InvalidInput(format!("Malformed form data: {}", err))
}

/// HTTP status for a failed question.
fn status_for(err: &EnkelError) -> StatusCode {
    match err {
        e if e.is_user_error() => StatusCode::BAD_REQUEST,
        EnkelError::DeadlineExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
        EnkelError::ExternalApi { .. } | EnkelError::Http(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Prompts;
    use crate::testing::{pdf_with_pages, EchoChatModel, HashEmbedder, StubEncyclopedia};

    const BOUNDARY: &str = "enkel-test-boundary";

    struct Form {
        body: Vec<u8>,
    }

    impl Form {
        fn new() -> Self {
            Self { body: Vec::new() }
        }

        fn text(mut self, name: &str, value: &str) -> Self {
            self.body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                    BOUNDARY, name, value
                )
                .as_bytes(),
            );
            self
        }

        fn file(mut self, filename: &str, bytes: &[u8]) -> Self {
            self.body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n\
                     Content-Type: application/pdf\r\n\r\n",
                    BOUNDARY, filename
                )
                .as_bytes(),
            );
            self.body.extend_from_slice(bytes);
            self.body.extend_from_slice(b"\r\n");
            self
        }

        fn finish(mut self) -> Vec<u8> {
            self.body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
            self.body
        }
    }

    async fn spawn_app(uploads: UploadDirectory) -> String {
        let orchestrator = Orchestrator::with_components(
            Settings::default(),
            Prompts::default(),
            Arc::new(HashEmbedder::new()),
            Arc::new(EchoChatModel::new()),
            Arc::new(StubEncyclopedia::new("Page: Rust\nSummary: Rust is a systems programming language.")),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(orchestrator, uploads)).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn post_form(base: &str, body: Vec<u8>) -> (StatusCode, serde_json::Value) {
        let response = reqwest::Client::new()
            .post(format!("{}/ask", base))
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(body)
            .send()
            .await
            .unwrap();
        let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
        (status, response.json().await.unwrap())
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&EnkelError::UnsupportedSource("image".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&EnkelError::NoDocumentUploaded), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&EnkelError::DeadlineExceeded("slow".into())), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            status_for(&EnkelError::external("chat", "rate limited", true)),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&EnkelError::Config("broken".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_index_and_health() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn_app(UploadDirectory::new(dir.path())).await;

        let page = reqwest::get(format!("{}/", base)).await.unwrap().text().await.unwrap();
        assert!(page.contains("No answer available"));

        let health: serde_json::Value = reqwest::get(format!("{}/health", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], "ok");
        assert_eq!(health["sources"], serde_json::json!(["document", "wikipedia"]));
    }

    #[tokio::test]
    async fn test_unsupported_source_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn_app(UploadDirectory::new(dir.path())).await;

        let body = Form::new().text("source", "image").text("question", "What?").finish();
        let (status, json) = post_form(&base, body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("image"));
    }

    #[tokio::test]
    async fn test_wikipedia_question() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn_app(UploadDirectory::new(dir.path())).await;

        let body = Form::new()
            .text("source", "wikipedia")
            .text("question", "What is Rust?")
            .finish();
        let (status, json) = post_form(&base, body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["answered"], true);
        assert_eq!(json["sources"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_uploaded_document_is_remembered() {
        let dir = tempfile::tempdir().unwrap();
        let uploads_path = dir.path().join("docs");
        let base = spawn_app(UploadDirectory::new(&uploads_path)).await;

        let pdf = pdf_with_pages(&["The capital of France is Paris."]);
        let body = Form::new()
            .text("source", "document")
            .text("question", "What is the capital of France?")
            .file("france.pdf", &pdf)
            .finish();
        let (status, json) = post_form(&base, body).await;

        assert_eq!(status, StatusCode::OK);
        assert!(json["answer"].as_str().unwrap().contains("Paris"));
        assert!(uploads_path.join("france.pdf").exists());

        // A follow-up without a file uses the remembered upload
        let body = Form::new()
            .text("source", "document")
            .text("question", "Which city is the capital?")
            .finish();
        let (status, json) = post_form(&base, body).await;

        assert_eq!(status, StatusCode::OK);
        assert!(json["answer"].as_str().unwrap().contains("Paris"));
    }

    #[tokio::test]
    async fn test_rejected_upload_keeps_previous_document() {
        let dir = tempfile::tempdir().unwrap();
        let uploads_path = dir.path().join("docs");
        let base = spawn_app(UploadDirectory::new(&uploads_path)).await;

        let pdf = pdf_with_pages(&["The capital of France is Paris."]);
        let body = Form::new()
            .text("source", "document")
            .text("question", "What is the capital of France?")
            .file("france.pdf", &pdf)
            .finish();
        let (status, _) = post_form(&base, body).await;
        assert_eq!(status, StatusCode::OK);

        let body = Form::new()
            .text("source", "document")
            .text("question", "What does this say?")
            .file("notes.pdf", b"plain text, not a PDF")
            .finish();
        let (status, json) = post_form(&base, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("notes.pdf"));
        assert!(uploads_path.join("france.pdf").exists());
        assert!(!uploads_path.join("notes.pdf").exists());

        let body = Form::new()
            .text("source", "document")
            .text("question", "Which city is the capital?")
            .finish();
        let (status, json) = post_form(&base, body).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["answer"].as_str().unwrap().contains("Paris"));
    }

    #[tokio::test]
    async fn test_document_without_upload() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn_app(UploadDirectory::new(dir.path())).await;

        let body = Form::new()
            .text("source", "document")
            .text("question", "Anything?")
            .finish();
        let (status, json) = post_form(&base, body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "No document has been uploaded");
    }
}
