//! Serve command - HTTP front end for the extraction pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::{DefaultBodyLimit, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Args;
use console::style;
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use invex_core::{InvexError, Pipeline};

use super::load_config;
use super::process::PipelineArgs;
use crate::export::line_items_csv;

/// Multipart fields accepted as the uploaded document.
const UPLOAD_FIELDS: [&str; 2] = ["file", "pdf"];

/// Arguments for the serve command.
#[derive(Args)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Scratch directory for uploads
    #[arg(long)]
    upload_dir: Option<PathBuf>,

    /// Largest accepted upload in bytes
    #[arg(long)]
    max_upload_bytes: Option<usize>,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<Pipeline>,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ExtractParams {
    csv: Option<String>,
}

impl ExtractParams {
    fn wants_csv(&self) -> bool {
        self.csv
            .as_deref()
            .is_some_and(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
    }
}

/// Build the router with all endpoints.
///
/// Request bodies are capped at `server.max_upload_bytes` from the pipeline's config.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.pipeline.config().server.max_upload_bytes;

    Router::new()
        .route("/", get(home))
        .route("/extract", post(extract))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run(args: ServeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    args.pipeline.apply(&mut config);
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(dir) = args.upload_dir {
        config.server.upload_dir = dir;
    }
    if let Some(limit) = args.max_upload_bytes {
        config.server.max_upload_bytes = limit;
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let backend = config.llm.backend;

    let pipeline = tokio::task::spawn_blocking(move || Pipeline::from_config(config)).await?;
    info!(
        "Pipeline ready: backend={}, ocr={}",
        backend,
        pipeline.has_recognizer()
    );

    let app = build_router(AppState::new(pipeline));
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!(
        "{} Listening on http://{}",
        style("✓").green(),
        listener.local_addr()?
    );

    axum::serve(listener, app).await?;
    Ok(())
}

async fn home() -> &'static str {
    "Invoice Extractor LLM agent is running!"
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// Pull the first upload field out of the form as `(file name, bytes)`.
async fn read_upload(multipart: &mut Multipart) -> Result<(String, Vec<u8>), Response> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Err(error_response(StatusCode::BAD_REQUEST, "No file uploaded")),
            Err(e) => return Err(error_response(e.status(), e.body_text())),
        };

        if !field.name().is_some_and(|name| UPLOAD_FIELDS.contains(&name)) {
            continue;
        }

        let name = field.file_name().unwrap_or_default().to_string();
        if name.trim().is_empty() {
            return Err(error_response(StatusCode::BAD_REQUEST, "Empty filename"));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| error_response(e.status(), e.body_text()))?;
        return Ok((name, bytes.to_vec()));
    }
}

async fn extract(
    State(state): State<AppState>,
    Query(params): Query<ExtractParams>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let Ok(mut multipart) = multipart else {
        return error_response(StatusCode::BAD_REQUEST, "No file uploaded");
    };

    let (name, bytes) = match read_upload(&mut multipart).await {
        Ok(upload) => upload,
        Err(response) => return response,
    };

    info!("Received {} ({} bytes)", name, bytes.len());

    let pipeline = Arc::clone(&state.pipeline);
    let outcome = tokio::task::spawn_blocking(move || pipeline.run_upload(&name, &bytes)).await;

    let result = match outcome {
        Ok(Ok(result)) => result,
        Ok(Err(InvexError::Document(e))) => {
            warn!("Rejected upload: {}", e);
            return error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Failed to read PDF: {}", e),
            );
        }
        Ok(Err(e)) => {
            warn!("Extraction failed: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
        Err(e) => {
            warn!("Extraction task failed: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "extraction task failed");
        }
    };

    if !params.wants_csv() {
        return Json(result).into_response();
    }

    match line_items_csv(&result) {
        Ok(csv) => (
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"invoice_items.csv\"",
                ),
            ],
            csv,
        )
            .into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}
