//! Demo HTTP server.
//!
//! - `POST /process-audio` multipart `audio` clip: loudness emotion, simulated
//!   transcription, one motion step, SVG frame
//! - `POST /utterance` text recognized by the client plus optional live features
//! - `GET /state` current pose and frame
//! - `GET /health`

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tracing::{debug, error, info};

use crate::audio::{analyze_clip, AudioFeatures};
use crate::config::Config;
use crate::emotion::{classify_audio, classify_clip, ClipThresholds, Emotion};
use crate::intent::Intent;
use crate::motion::MotionCommand;
use crate::recognizer::{PhraseTranscriber, Transcriber};
use crate::session::{Commit, Session};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("No audio file provided")]
    MissingFile,
    #[error("Malformed upload: {0}")]
    Multipart(#[from] MultipartError),
    #[error("Robot state lock poisoned")]
    StatePoisoned,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MissingFile => (StatusCode::BAD_REQUEST, self.to_string()),
            _ => {
                error!("Error processing audio: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to process audio".to_string(),
                )
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Shared state: one robot for the whole server process
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Mutex<Session>>,
    pub transcriber: Arc<Mutex<dyn Transcriber>>,
    pub clip_thresholds: ClipThresholds,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self::with_transcriber(config, PhraseTranscriber::new())
    }

    pub fn with_transcriber<T: Transcriber + 'static>(config: &Config, transcriber: T) -> Self {
        Self {
            session: Arc::new(Mutex::new(Session::new(
                config.arena,
                config.emotion_thresholds,
            ))),
            transcriber: Arc::new(Mutex::new(transcriber)),
            clip_thresholds: config.clip_thresholds,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RobotState {
    pub position: Position,
    pub movement: MotionCommand,
    pub emotion: Emotion,
    pub intent: Intent,
}

/// Response of both pipeline endpoints
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResponse {
    pub transcript: String,
    pub emotion: Emotion,
    pub intent: Intent,
    pub robot_state: RobotState,
    pub frame: String,
}

impl PipelineResponse {
    fn new(commit: Commit, frame: String) -> Self {
        Self {
            robot_state: RobotState {
                position: Position {
                    x: commit.pose.x,
                    y: commit.pose.y,
                    rotation: commit.pose.heading,
                },
                movement: commit.command,
                emotion: commit.emotion,
                intent: commit.intent,
            },
            transcript: commit.transcript,
            emotion: commit.emotion,
            intent: commit.intent,
            frame,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UtteranceRequest {
    pub text: String,
    #[serde(default)]
    pub features: Option<AudioFeatures>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateResponse {
    pub session_id: String,
    pub emotion: Emotion,
    pub last_intent: Option<Intent>,
    pub position: Position,
    pub commit_count: u64,
    pub frame: String,
}

/// Build the router. Static assets, if configured, are served as the fallback.
pub fn router(state: AppState, config: &Config) -> Router {
    let limit = config.upload_limit_bytes;

    let app = Router::new()
        .route("/process-audio", post(process_audio))
        .route("/utterance", post(utterance))
        .route("/state", get(robot_state))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(limit))
        .layer(RequestBodyLimitLayer::new(limit))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    match &config.static_dir {
        Some(dir) => app.fallback_service(ServeDir::new(dir)),
        None => app,
    }
}

/// Run the server until Ctrl+C
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let app = router(AppState::new(&config), &config);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Voice-to-Robot server running at http://localhost:{}", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Received Ctrl+C, shutting down");
        })
        .await?;
    Ok(())
}

async fn process_audio(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PipelineResponse>, ServerError> {
    let mut multipart = multipart.map_err(|rejection| {
        debug!("Upload is not multipart: {}", rejection);
        ServerError::MissingFile
    })?;
    let mut audio = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("audio") {
            audio = Some(field.bytes().await?);
            break;
        }
    }
    let audio = audio.ok_or(ServerError::MissingFile)?;

    let summary = analyze_clip(&audio);
    let clip_emotion = classify_clip(&summary, &state.clip_thresholds);
    let transcript = transcribe(&state, &audio)?;

    commit(&state, &transcript, clip_emotion).map(Json)
}

async fn utterance(
    State(state): State<AppState>,
    Json(request): Json<UtteranceRequest>,
) -> Result<Json<PipelineResponse>, ServerError> {
    let thresholds = {
        let session = state.session.lock().map_err(|_| ServerError::StatePoisoned)?;
        *session.thresholds()
    };
    let audio_emotion = request
        .features
        .map(|f| classify_audio(&f, &thresholds))
        .unwrap_or(Emotion::Neutral);

    commit(&state, &request.text, audio_emotion).map(Json)
}

async fn robot_state(State(state): State<AppState>) -> Result<Json<StateResponse>, ServerError> {
    let session = state.session.lock().map_err(|_| ServerError::StatePoisoned)?;
    let status = session.status();
    Ok(Json(StateResponse {
        session_id: status.session_id,
        emotion: status.emotion,
        last_intent: status.last_intent,
        position: Position {
            x: status.pose.x,
            y: status.pose.y,
            rotation: status.pose.heading,
        },
        commit_count: status.commit_count,
        frame: session.frame(),
    }))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let healthy = state.session.lock().is_ok();
    Json(serde_json::json!({
        "healthy": healthy,
        "service": "voice-robot",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

fn transcribe(state: &AppState, clip: &[u8]) -> Result<String, ServerError> {
    let mut transcriber = state
        .transcriber
        .lock()
        .map_err(|_| ServerError::StatePoisoned)?;
    Ok(transcriber.transcribe(clip))
}

fn commit(state: &AppState, transcript: &str, audio_emotion: Emotion) -> Result<PipelineResponse, ServerError> {
    let mut session = state.session.lock().map_err(|_| ServerError::StatePoisoned)?;
    let commit = session.commit_with_audio(transcript, audio_emotion);
    Ok(PipelineResponse::new(commit, session.frame()))
}
