//! HTTP transport for the journal analysis service.
//!
//! The route layer is deliberately thin: validate the request, call the
//! matching service, map the result. Validation failures return 400 with
//! a message before any remote call; internal failures return a generic
//! 500 and the detail goes to the log, not the wire.
//!
//! ## Endpoints
//!
//! - `POST /api/analyze` — emotion classification
//! - `POST /api/sentiment` — sentiment classification
//! - `POST /api/feedback` — generated feedback
//! - `GET /api/prompt` — the default feedback prompt
//! - `GET /api/random-text` — a random writing prompt
//! - `GET /api/health` — liveness

use crate::config::{AppConfig, InferenceConfig};
use crate::emotion::{self, EmotionAnalysis};
use crate::error::{JournalError, Result};
use crate::feedback::{self, FeedbackEngine, ReportedEmotion};
use crate::inference::InferenceClient;
use crate::insight::InsightCatalog;
use crate::sentiment::{self, SentimentResult};
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use axum::routing::{get, post};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Header carrying the caller's inference credential.
const CREDENTIAL_HEADER: &str = "x-api-key";

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Body of `POST /api/analyze` and `POST /api/sentiment`.
#[derive(Debug, Deserialize)]
struct TranscriptionRequest {
    /// The transcript text to analyze.
    #[serde(default)]
    transcription: String,
}

/// Body of `POST /api/feedback`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedbackRequest {
    /// The transcript the feedback is about.
    #[serde(default)]
    transcription: String,
    /// Sentiment from a previous `/api/sentiment` call.
    #[serde(default)]
    sentiment: Option<SentimentResult>,
    /// Emotions from a previous `/api/analyze` call.
    #[serde(default)]
    emotions: Vec<ReportedEmotion>,
    /// Optional system-prompt override.
    #[serde(default)]
    custom_prompt: Option<String>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct AnalyzeResponse {
    emotions: EmotionAnalysis,
}

#[derive(Debug, Serialize)]
struct SentimentResponse {
    sentiment: SentimentResult,
}

#[derive(Debug, Serialize)]
struct FeedbackResponse {
    feedback: String,
}

#[derive(Debug, Serialize)]
struct PromptResponse {
    prompt: String,
}

#[derive(Debug, Serialize)]
struct TextResponse {
    text: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Error body returned by every route: `{"message": "..."}`.
#[derive(Debug, Serialize)]
struct MessageBody {
    message: String,
}

type ErrorReply = (StatusCode, Json<MessageBody>);

// ---------------------------------------------------------------------------
// Shared application state
// ---------------------------------------------------------------------------

/// Shared state for axum handlers; everything is read-only after boot.
#[derive(Clone)]
struct AppState {
    client: Arc<InferenceClient>,
    inference: Arc<InferenceConfig>,
    catalog: Arc<InsightCatalog>,
    engine: Arc<FeedbackEngine>,
    random_texts: Arc<Vec<String>>,
}

fn build_state(config: &AppConfig) -> Result<AppState> {
    let client = InferenceClient::new(&config.inference)?;
    let catalog = InsightCatalog::load(&config.resources.insights_path)?;
    let default_prompt = feedback::load_default_prompt(&config.resources.prompt_path)?;
    let engine = FeedbackEngine::new(
        config.inference.feedback_model.clone(),
        config.inference.max_feedback_tokens,
        default_prompt,
    )?;
    let random_texts = load_random_texts(&config.resources.random_texts_path)?;

    info!(
        insights = catalog.len(),
        random_texts = random_texts.len(),
        "resources loaded"
    );

    Ok(AppState {
        client: Arc::new(client),
        inference: Arc::new(config.inference.clone()),
        catalog: Arc::new(catalog),
        engine: Arc::new(engine),
        random_texts: Arc::new(random_texts),
    })
}

/// Load the random writing-prompt dataset.
///
/// # Errors
///
/// Returns a config error if the file is unreadable, invalid, or empty.
fn load_random_texts(path: &std::path::Path) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        JournalError::Config(format!(
            "failed to read random-text dataset {}: {e}",
            path.display()
        ))
    })?;
    let texts: Vec<String> = serde_json::from_str(&raw).map_err(|e| {
        JournalError::Config(format!(
            "invalid random-text dataset {}: {e}",
            path.display()
        ))
    })?;
    if texts.is_empty() {
        return Err(JournalError::Config(format!(
            "random-text dataset {} is empty",
            path.display()
        )));
    }
    Ok(texts)
}

// ---------------------------------------------------------------------------
// JournalServer
// ---------------------------------------------------------------------------

/// The murmur HTTP server.
///
/// All static resources are loaded at start; a failure there prevents the
/// server from serving at all instead of failing per request.
pub struct JournalServer {
    /// The address the server is listening on.
    addr: SocketAddr,
    /// Handle to the background server task.
    handle: JoinHandle<()>,
}

impl JournalServer {
    /// Start the server.
    ///
    /// Binds to `{config.server.host}:{config.server.port}` (use port `0`
    /// for auto-assign) and begins serving in a background tokio task.
    ///
    /// # Errors
    ///
    /// Returns an error if a static resource fails to load or the TCP
    /// listener cannot bind.
    pub async fn start(config: &AppConfig) -> Result<Self> {
        let state = build_state(config)?;

        let app = Router::new()
            .route("/api/analyze", post(handle_analyze))
            .route("/api/sentiment", post(handle_sentiment))
            .route("/api/feedback", post(handle_feedback))
            .route("/api/prompt", get(handle_prompt))
            .route("/api/random-text", get(handle_random_text))
            .route("/api/health", get(handle_health))
            .with_state(state);

        let bind_addr = format!("{}:{}", config.server.host, config.server.port);
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| JournalError::Server(format!("bind {bind_addr} failed: {e}")))?;

        let addr = listener
            .local_addr()
            .map_err(|e| JournalError::Server(format!("failed to get local addr: {e}")))?;

        info!("murmur listening on http://{addr}/api");

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!("server error: {e}");
            }
        });

        Ok(Self { addr, handle })
    }

    /// Returns the address the server is listening on.
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the port the server is listening on.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Abort the server task.
    pub fn shutdown(&self) {
        self.handle.abort();
    }
}

impl Drop for JournalServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// ---------------------------------------------------------------------------
// Validation and error mapping
// ---------------------------------------------------------------------------

fn require_credential(headers: &HeaderMap) -> std::result::Result<String, ErrorReply> {
    headers
        .get(CREDENTIAL_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| error_reply(&JournalError::Validation("Missing API key.".to_owned())))
}

fn require_transcription(transcription: &str) -> std::result::Result<(), ErrorReply> {
    if transcription.trim().is_empty() {
        return Err(error_reply(&JournalError::Validation(
            "No transcription text provided.".to_owned(),
        )));
    }
    Ok(())
}

/// Map a service error to a response. Validation errors carry their
/// message; everything else is a generic 500 with the detail logged.
fn error_reply(err: &JournalError) -> ErrorReply {
    match err {
        JournalError::Validation(message) => (
            StatusCode::BAD_REQUEST,
            Json(MessageBody {
                message: message.clone(),
            }),
        ),
        _ => {
            error!(error = %err, "request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MessageBody {
                    message: "Internal server error.".to_owned(),
                }),
            )
        }
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// `POST /api/analyze` — classify the emotions in a transcript.
async fn handle_analyze(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<TranscriptionRequest>,
) -> std::result::Result<Json<AnalyzeResponse>, ErrorReply> {
    let credential = require_credential(&headers)?;
    require_transcription(&request.transcription)?;

    let emotions = emotion::classify_emotions(
        &state.client,
        &state.inference.emotion_model,
        &request.transcription,
        &credential,
    )
    .await
    .map_err(|e| error_reply(&e))?;

    Ok(Json(AnalyzeResponse { emotions }))
}

/// `POST /api/sentiment` — classify the sentiment of a transcript.
async fn handle_sentiment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<TranscriptionRequest>,
) -> std::result::Result<Json<SentimentResponse>, ErrorReply> {
    let credential = require_credential(&headers)?;
    require_transcription(&request.transcription)?;

    let sentiment = sentiment::classify_sentiment(
        &state.client,
        &state.inference.sentiment_model,
        &request.transcription,
        &credential,
    )
    .await
    .map_err(|e| error_reply(&e))?;

    Ok(Json(SentimentResponse { sentiment }))
}

/// `POST /api/feedback` — generate feedback for a transcript.
///
/// Insights for the reported emotions are looked up here, then the
/// orchestrator runs the template + generation chain.
async fn handle_feedback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<FeedbackRequest>,
) -> std::result::Result<Json<FeedbackResponse>, ErrorReply> {
    let credential = require_credential(&headers)?;
    require_transcription(&request.transcription)?;

    let insights = state
        .catalog
        .lookup(request.emotions.iter().map(|e| e.emotion.as_str()));
    let sentiment_label = request
        .sentiment
        .as_ref()
        .map_or("unknown", |s| s.sentiment.as_str());

    let feedback = state
        .engine
        .generate(
            &state.client,
            &request.transcription,
            sentiment_label,
            &request.emotions,
            &insights,
            request.custom_prompt.as_deref(),
            &credential,
        )
        .await
        .map_err(|e| error_reply(&e))?;

    Ok(Json(FeedbackResponse { feedback }))
}

/// `GET /api/prompt` — the default feedback prompt, so clients can offer
/// it as a starting point and detect unchanged overrides.
async fn handle_prompt(State(state): State<AppState>) -> Json<PromptResponse> {
    Json(PromptResponse {
        prompt: state.engine.default_prompt().to_owned(),
    })
}

/// `GET /api/random-text` — a random writing prompt from the dataset.
async fn handle_random_text(
    State(state): State<AppState>,
) -> std::result::Result<Json<TextResponse>, ErrorReply> {
    match state.random_texts.choose(&mut rand::thread_rng()) {
        Some(text) => Ok(Json(TextResponse { text: text.clone() })),
        None => Err(error_reply(&JournalError::Config(
            "random-text dataset is empty".to_owned(),
        ))),
    }
}

/// `GET /api/health` — liveness probe.
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
