//! HTTP API for the browser shell.
//!
//! # Endpoints
//!
//! - `GET /api/manifest` - The loaded image manifest
//! - `POST /api/round` - Start a new round, replacing any current one
//! - `GET /api/round` - Snapshot of the current round
//! - `POST /api/round/guess` - Submit a guess for the current image
//! - `GET /ws` - Live round events
//! - `GET /images/*` - Static image files
//!
//! # Example
//!
//! ```no_run
//! use coast_engine::{create_router, AppState, Config, Manifest};
//!
//! # async fn example() {
//! let config = Config::default();
//! let manifest = Manifest::load(&config.manifest_path()).unwrap();
//! let router = create_router(AppState::new(config, manifest));
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//! axum::serve(listener, router).await.unwrap();
//! # }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::manifest::{Coast, Manifest};
use crate::round::{Feedback, GameOver, GuessOutcome, IgnoreReason};
use crate::scheduler::{Scheduler, TokioScheduler};
use crate::session::{RoundHandle, RoundOptions, RoundSnapshot};
use crate::websocket::{ws_handler, EventBroadcaster, GameEvent};
use crate::Config;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for the guess endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuessRequest {
    /// The coast the player picked.
    pub guess: Coast,
}

/// Response body for the guess endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuessResponse {
    /// Whether the guess was taken.
    pub accepted: bool,
    /// Revealed result, present when accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,
    /// Why the guess was dropped, present when ignored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<IgnoreReason>,
}

impl From<GuessOutcome> for GuessResponse {
    fn from(outcome: GuessOutcome) -> Self {
        match outcome {
            GuessOutcome::Accepted(feedback) => Self {
                accepted: true,
                feedback: Some(feedback),
                reason: None,
            },
            GuessOutcome::Ignored(reason) => Self {
                accepted: false,
                feedback: None,
                reason: Some(reason),
            },
        }
    }
}

/// Error response body returned on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Description of the error.
    pub error: String,
}

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for the HTTP server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Config,
    /// Images available for rounds.
    pub manifest: Arc<Manifest>,
    /// The round in progress, if any.
    pub round: Arc<Mutex<Option<RoundHandle>>>,
    /// Fan-out for WebSocket clients.
    pub broadcaster: EventBroadcaster,
    /// Timer source for feedback delays.
    pub scheduler: Arc<dyn Scheduler>,
    /// Incremented per started round; stale rounds stop broadcasting.
    generation: Arc<AtomicU64>,
}

impl AppState {
    /// Creates state with no round running, using tokio timers.
    #[must_use]
    pub fn new(config: Config, manifest: Manifest) -> Self {
        Self::with_scheduler(config, manifest, Arc::new(TokioScheduler))
    }

    /// Creates state that runs feedback delays on `scheduler`.
    #[must_use]
    pub fn with_scheduler(
        config: Config,
        manifest: Manifest,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        Self {
            config,
            manifest: Arc::new(manifest),
            round: Arc::new(Mutex::new(None)),
            broadcaster: EventBroadcaster::default(),
            scheduler,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Snapshot of the current round, if one was started.
    pub async fn current_snapshot(&self) -> Option<RoundSnapshot> {
        self.round.lock().await.as_ref().map(RoundHandle::snapshot)
    }

    /// Starts a fresh round on the manifest and announces it.
    ///
    /// A round replaced by a newer one keeps running its pending timer but
    /// no longer broadcasts.
    pub async fn start_round(&self) -> RoundSnapshot {
        let mut current = self.round.lock().await;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let options = RoundOptions::new(Arc::clone(&self.scheduler))
            .with_timing(self.config.feedback.timing())
            .with_observer(self.round_events(generation, GameEvent::from_transition));

        let game_over = self.round_events(generation, |result: &GameOver| {
            Some(GameEvent::game_over(result.clone()))
        });
        let handle = RoundHandle::start(&self.manifest.images, options, move |result| {
            game_over(&result);
        });

        let snapshot = handle.snapshot();
        *current = Some(handle);
        drop(current);

        self.broadcaster.send(GameEvent::round_started(snapshot.clone()));
        snapshot
    }

    /// Broadcasts events derived by `to_event` while `generation` is current.
    fn round_events<T: 'static>(
        &self,
        generation: u64,
        to_event: impl Fn(&T) -> Option<GameEvent> + Send + Sync + 'static,
    ) -> impl Fn(&T) + Send + Sync + 'static {
        let broadcaster = self.broadcaster.clone();
        let current = Arc::clone(&self.generation);
        move |value: &T| {
            if current.load(Ordering::SeqCst) != generation {
                return;
            }
            if let Some(event) = to_event(value) {
                broadcaster.send(event);
            }
        }
    }
}

// ============================================================================
// API Error Type
// ============================================================================

/// Internal error type for API handlers.
#[derive(Debug)]
enum ApiError {
    /// No round has been started yet.
    NoRound,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NoRound => (
                StatusCode::NOT_FOUND,
                "No round in progress. POST /api/round to start one.".to_string(),
            ),
        };

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

// ============================================================================
// Router Setup
// ============================================================================

/// Creates the HTTP router with all endpoints.
///
/// Serves the API under `/api`, events on `/ws` and image files from the
/// configured images directory under `/images`, with permissive CORS and
/// request tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let images = ServeDir::new(state.config.images_path());

    let api_routes = Router::new()
        .route("/manifest", get(handle_manifest))
        .route("/round", get(handle_get_round).post(handle_start_round))
        .route("/round/guess", post(handle_guess));

    Router::new()
        .nest("/api", api_routes)
        .route("/ws", get(ws_handler))
        .nest_service("/images", images)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

// ============================================================================
// Handlers
// ============================================================================

/// Handler for `GET /api/manifest`.
async fn handle_manifest(State(state): State<Arc<AppState>>) -> Json<Manifest> {
    Json(state.manifest.as_ref().clone())
}

/// Handler for `POST /api/round`.
async fn handle_start_round(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<RoundSnapshot>) {
    let snapshot = state.start_round().await;
    info!(
        total = snapshot.progress.total,
        phase = %snapshot.state.phase,
        "Round started via API"
    );
    (StatusCode::CREATED, Json(snapshot))
}

/// Handler for `GET /api/round`.
async fn handle_get_round(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RoundSnapshot>, ApiError> {
    state.current_snapshot().await.map(Json).ok_or(ApiError::NoRound)
}

/// Handler for `POST /api/round/guess`.
///
/// Ignored guesses still answer 200 with `accepted: false`.
async fn handle_guess(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GuessRequest>,
) -> Result<Json<GuessResponse>, ApiError> {
    let handle = state.round.lock().await.clone().ok_or_else(|| {
        warn!(guess = %request.guess, "Guess received with no round in progress");
        ApiError::NoRound
    })?;

    let outcome = handle.submit_guess(request.guess);
    Ok(Json(outcome.into()))
}

// ============================================================================
// Tests
// ============================================================================
