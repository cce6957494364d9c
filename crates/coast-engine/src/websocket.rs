//! WebSocket event types and broadcasting for live game views.
//!
//! Browser shells subscribe to `/ws` and render from these events instead of
//! polling the HTTP API.
//!
//! # Event Types
//!
//! - `connected` - Sent when a client connects, includes the current round
//! - `round_started` - A new round began
//! - `feedback` - A guess was accepted and its result is being revealed
//! - `round_advanced` - The next image is up
//! - `game_over` - The round ended

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use chrono::{DateTime, Utc};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::api::AppState;
use crate::round::{Feedback, GameOver};
use crate::session::{Progress, RoundSnapshot};

// ============================================================================
// Event Payloads
// ============================================================================

/// Payload for the `connected` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectedPayload {
    /// The current round, if one has been started.
    pub round: Option<RoundSnapshot>,
}

/// Payload for the `round_started` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundStartedPayload {
    /// The fresh round.
    pub round: RoundSnapshot,
    /// When the round started.
    pub timestamp: DateTime<Utc>,
}

/// Payload for the `feedback` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackPayload {
    /// The revealed result.
    pub feedback: Feedback,
    /// Position of the guessed image.
    pub progress: Progress,
}

/// Payload for the `round_advanced` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundAdvancedPayload {
    /// The round after advancing.
    pub round: RoundSnapshot,
}

/// Payload for the `game_over` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameOverPayload {
    /// The final result.
    pub result: GameOver,
    /// Verdict for the result screen.
    pub message: String,
    /// When the round ended.
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Event Enum
// ============================================================================

/// WebSocket event types for game observation.
///
/// All events are serialized as JSON objects with "event" and "payload" fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum GameEvent {
    /// Sent when a client connects.
    Connected(ConnectedPayload),
    /// Sent when a round starts.
    RoundStarted(RoundStartedPayload),
    /// Sent when a guess is accepted.
    Feedback(FeedbackPayload),
    /// Sent when the next image comes up.
    RoundAdvanced(RoundAdvancedPayload),
    /// Sent when the round ends.
    GameOver(GameOverPayload),
}

impl GameEvent {
    /// Creates a `Connected` event.
    #[must_use]
    pub const fn connected(round: Option<RoundSnapshot>) -> Self {
        Self::Connected(ConnectedPayload { round })
    }

    /// Creates a `RoundStarted` event.
    #[must_use]
    pub fn round_started(round: RoundSnapshot) -> Self {
        Self::RoundStarted(RoundStartedPayload {
            round,
            timestamp: Utc::now(),
        })
    }

    /// Creates a `Feedback` event.
    #[must_use]
    pub const fn feedback(feedback: Feedback, progress: Progress) -> Self {
        Self::Feedback(FeedbackPayload { feedback, progress })
    }

    /// Creates a `RoundAdvanced` event.
    #[must_use]
    pub const fn round_advanced(round: RoundSnapshot) -> Self {
        Self::RoundAdvanced(RoundAdvancedPayload { round })
    }

    /// Creates a `GameOver` event.
    #[must_use]
    pub fn game_over(result: GameOver) -> Self {
        let message = result.message().to_string();
        Self::GameOver(GameOverPayload {
            result,
            message,
            timestamp: Utc::now(),
        })
    }

    /// Maps a round transition onto the event a viewer needs.
    #[must_use]
    pub fn from_transition(snapshot: &RoundSnapshot) -> Option<Self> {
        if let Some(feedback) = snapshot.feedback() {
            return Some(Self::feedback(feedback.clone(), snapshot.progress));
        }
        if snapshot.state.is_awaiting_guess() {
            return Some(Self::round_advanced(snapshot.clone()));
        }
        // game_over is sent from the game-over callback.
        None
    }

    /// Returns the event name as a string.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Connected(_) => "connected",
            Self::RoundStarted(_) => "round_started",
            Self::Feedback(_) => "feedback",
            Self::RoundAdvanced(_) => "round_advanced",
            Self::GameOver(_) => "game_over",
        }
    }
}

// ============================================================================
// Event Broadcaster
// ============================================================================

/// Broadcasts game events to all connected WebSocket clients.
///
/// Events are not persisted for disconnected clients.
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<GameEvent>,
}

impl EventBroadcaster {
    /// Creates a new `EventBroadcaster` with the specified per-subscriber buffer.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Creates a new subscriber for receiving events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.sender.subscribe()
    }

    /// Broadcasts an event, returning the number of receivers.
    pub fn send(&self, event: GameEvent) -> usize {
        // send() returns Err only if there are no receivers, which is fine
        self.sender.send(event).unwrap_or(0)
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}

// ============================================================================
// WebSocket Handler
// ============================================================================

/// Maximum number of missed pong responses before disconnecting.
const MAX_MISSED_PONGS: u8 = 3;

/// Interval between heartbeat pings.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// WebSocket upgrade handler for `/ws`.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    info!("New WebSocket connection request");
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handles a single WebSocket connection.
///
/// Sends `connected` with the current round, then forwards broadcast events
/// and pings every 30 seconds, closing after 3 missed pongs.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before reading the snapshot so no event slips between them.
    let mut event_receiver = state.broadcaster.subscribe();

    let connected_event = GameEvent::connected(state.current_snapshot().await);
    let connected_json = match serde_json::to_string(&connected_event) {
        Ok(json) => json,
        Err(e) => {
            warn!("Failed to serialize connected event: {}", e);
            return;
        }
    };

    if sender.send(Message::Text(connected_json)).await.is_err() {
        debug!("Client disconnected before receiving connected event");
        return;
    }

    info!("WebSocket client connected, sent current round");

    let mut heartbeat_interval = interval(HEARTBEAT_INTERVAL);
    let mut missed_pongs = 0u8;

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Pong(_))) => {
                        missed_pongs = 0;
                        debug!("Received pong from client");
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Client requested close");
                        break;
                    }
                    Some(Ok(Message::Text(_) | Message::Binary(_))) => {
                        // Guesses go through the HTTP API.
                        debug!("Ignoring data message from client");
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            debug!("Failed to send pong, client disconnected");
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {}", e);
                        break;
                    }
                    None => {
                        debug!("WebSocket stream ended");
                        break;
                    }
                }
            }

            event = event_receiver.recv() => {
                match event {
                    Ok(game_event) => {
                        let json = match serde_json::to_string(&game_event) {
                            Ok(j) => j,
                            Err(e) => {
                                warn!("Failed to serialize event: {}", e);
                                continue;
                            }
                        };

                        if sender.send(Message::Text(json)).await.is_err() {
                            debug!("Failed to send event, client disconnected");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Client lagged, missed {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("Broadcaster closed");
                        break;
                    }
                }
            }

            _ = heartbeat_interval.tick() => {
                if sender.send(Message::Ping(vec![])).await.is_err() {
                    debug!("Failed to send ping, client disconnected");
                    break;
                }
                missed_pongs += 1;
                if missed_pongs >= MAX_MISSED_PONGS {
                    info!("Client missed {} pongs, closing connection", MAX_MISSED_PONGS);
                    break;
                }
            }
        }
    }

    info!("WebSocket client disconnected");
}

// ============================================================================
// Tests
// ============================================================================
