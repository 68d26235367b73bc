//! HTTP API server
//!
//! Routes:
//! - Front page and bundled assets at `/` and `/static/*`
//! - Story parsing and prompt building at `/parse` and `/prompts`
//! - Image generation at `/generate`, `/generate/prewarm` and `/generate/comic`
//! - Page assembly at `/assemble`
//! - Stored comics at `/comics/:id`

use super::error::ApiError;
use crate::generation::{
    assemble_grid, build_prompts_for_panels, export_pdf, ImageGenerator, SharedFont,
    DEFAULT_THUMB_SIZE,
};
use crate::models::{ComicConfig, GenerationParams, Panel, ParsedStory, Prompt, Style};
use crate::nlp::parse_story;
use crate::services::comic_service::{
    encode_images_lenient, encode_panels, generate_comic, ComicInput, EncodedImage,
};
use crate::storage::{ComicRecord, LocalDb};
use crate::Result;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// Request / Response Models
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ParseRequest {
    #[serde(default)]
    pub title: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct PromptsRequest {
    pub panels: Vec<Panel>,
    #[serde(default = "default_style")]
    pub style: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub prompts: Vec<Prompt>,
    #[serde(default)]
    pub negative_prompt: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImagesResponse {
    pub images: Vec<EncodedImage>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PrewarmResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ComicRequest {
    pub story: String,
    #[serde(default = "default_style")]
    pub style: String,
    #[serde(default)]
    pub negative_prompt: Option<String>,
    #[serde(default)]
    pub generation: Option<GenerationParams>,
    #[serde(default = "default_overlay_bubbles")]
    pub overlay_bubbles: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ComicResponse {
    pub id: String,
    pub images: Vec<EncodedImage>,
    pub dialogues: Vec<Vec<crate::models::DialogueLine>>,
}

#[derive(Debug, Deserialize)]
pub struct AssembleRequest {
    pub images: Vec<PathBuf>,
    #[serde(default = "default_columns")]
    pub columns: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AssembleResponse {
    pub png: String,
    pub pdf: String,
}

fn default_style() -> String {
    Style::Manga.name().to_string()
}

fn default_overlay_bubbles() -> bool {
    true
}

fn default_columns() -> u32 {
    2
}

// =============================================================================
// Application State
// =============================================================================

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ComicConfig>,
    pub generator: Arc<ImageGenerator>,
    pub font: Option<SharedFont>,
    /// Serializes read-modify-write cycles on the JSON store
    pub db: Arc<Mutex<LocalDb>>,
}

impl AppState {
    pub fn new(config: ComicConfig, font: Option<SharedFont>) -> Result<Self> {
        let db = LocalDb::new(&config.storage.db_path)?;
        let generator = ImageGenerator::new(config.generation.clone(), font.clone());

        Ok(Self {
            config: Arc::new(config),
            generator: Arc::new(generator),
            font,
            db: Arc::new(Mutex::new(db)),
        })
    }

    /// Directory for one request's images.
    ///
    /// Every generation request gets its own directory and nothing removes
    /// them; clear `output_dir` out of band when it grows too large.
    fn request_dir(&self, id: &str) -> PathBuf {
        self.config.generation.output_dir.join(id)
    }
}

// =============================================================================
// Server Startup
// =============================================================================

/// Build the router with all routes and layers
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(serve_index))
        .route("/static/comic_generator.js", get(serve_js))
        .route("/static/comic_generator.css", get(serve_css))
        .route("/health", get(health_check))
        .route("/parse", post(parse))
        .route("/prompts", post(prompts))
        .route("/generate", post(generate))
        .route("/generate/prewarm", post(prewarm))
        .route("/generate/comic", post(generate_comic_handler))
        .route("/assemble", post(assemble))
        .route("/comics/:id", get(get_comic))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server and pre-warm the image backend in the background
pub async fn start_server(state: AppState) -> Result<()> {
    let host: std::net::IpAddr = state
        .config
        .server
        .host
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid host '{}': {}", state.config.server.host, e))?;
    let addr = SocketAddr::new(host, state.config.server.port);

    let generator = state.generator.clone();
    tokio::spawn(async move {
        if generator.init_backend().await.is_none() {
            tracing::warn!("Backend pre-warm failed; placeholders will be used until it comes up");
        }
    });

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Server listening");
    println!("✓ Server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

// =============================================================================
// Static Handlers
// =============================================================================

async fn serve_index() -> Html<&'static str> {
    Html(include_str!("assets/index.html"))
}

async fn serve_js() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        include_str!("assets/comic_generator.js"),
    )
}

async fn serve_css() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        include_str!("assets/comic_generator.css"),
    )
}

/// Health check endpoint
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// =============================================================================
// API Handlers
// =============================================================================

async fn parse(Json(request): Json<ParseRequest>) -> Json<ParsedStory> {
    tracing::debug!(title = %request.title, chars = request.text.len(), "Parsing story");
    Json(parse_story(&request.text))
}

async fn prompts(Json(request): Json<PromptsRequest>) -> Json<Vec<Prompt>> {
    let style = Style::from_name(&request.style);
    Json(build_prompts_for_panels(&request.panels, style))
}

async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> std::result::Result<Json<ImagesResponse>, ApiError> {
    let mut prompts = request.prompts;
    crate::generation::apply_negative_override(&mut prompts, request.negative_prompt.as_deref());

    let dir = state.request_dir(&ComicRecord::generate_id());
    let paths = state.generator.generate_images(&prompts, Some(&dir)).await?;
    let images = encode_images_lenient(&paths).await;

    Ok(Json(ImagesResponse { images }))
}

async fn prewarm(State(state): State<AppState>) -> Json<PrewarmResponse> {
    let response = match state.generator.init_backend().await {
        Some(backend) => PrewarmResponse {
            status: "ok".to_string(),
            message: format!("{} backend initialized", backend.name()),
        },
        None => PrewarmResponse {
            status: "failed".to_string(),
            message: "Backend not available (check server logs).".to_string(),
        },
    };
    Json(response)
}

async fn generate_comic_handler(
    State(state): State<AppState>,
    Json(request): Json<ComicRequest>,
) -> std::result::Result<Json<ComicResponse>, ApiError> {
    let id = ComicRecord::generate_id();
    let style = Style::from_name(&request.style);

    let mut input = ComicInput::new(request.story, style);
    input.negative_prompt = request.negative_prompt;
    input.generation = request.generation.unwrap_or_default();
    input.overlay_bubbles = request.overlay_bubbles;
    input.output_dir = Some(state.request_dir(&id));

    let output = generate_comic(&state.generator, state.font.clone(), &input).await?;
    let images = encode_panels(&output.image_paths).await?;
    let dialogues = output.parsed.dialogues();

    let record = ComicRecord::new(
        id.clone(),
        input.story,
        style,
        output.parsed,
        output.image_paths,
        input.overlay_bubbles,
    );
    if let Err(e) = state.db.lock().await.save(&id, &record) {
        tracing::warn!(id = %id, error = %format!("{:#}", e), "Failed to store comic record");
    }

    Ok(Json(ComicResponse {
        id,
        images,
        dialogues,
    }))
}

async fn assemble(
    State(state): State<AppState>,
    Json(request): Json<AssembleRequest>,
) -> std::result::Result<Json<AssembleResponse>, ApiError> {
    let page_path = state.config.render.page_path.clone();
    let pdf_path = state.config.render.pdf_path.clone();

    let (png, pdf) = tokio::task::spawn_blocking(move || -> Result<(PathBuf, PathBuf)> {
        let png = assemble_grid(&request.images, request.columns, DEFAULT_THUMB_SIZE, &page_path)?;
        let pdf = export_pdf(&png, &pdf_path)?;
        Ok((png, pdf))
    })
    .await
    .map_err(anyhow::Error::from)??;

    Ok(Json(AssembleResponse {
        png: png.display().to_string(),
        pdf: pdf.display().to_string(),
    }))
}

async fn get_comic(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> std::result::Result<impl IntoResponse, ApiError> {
    let record = state.db.lock().await.load_as::<ComicRecord>(&id)?;
    match record {
        Some(record) => Ok((StatusCode::OK, Json(record))),
        None => Err(crate::error::ComicError::RecordNotFound(id).into()),
    }
}
