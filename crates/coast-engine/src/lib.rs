//! Coast or Coast game engine
//!
//! Builds balanced play sequences, runs the guess/feedback state machine and
//! serves rounds over HTTP and WebSocket.

pub mod api;
pub mod config;
pub mod error;
pub mod manifest;
pub mod round;
pub mod scheduler;
pub mod sequencer;
pub mod session;
pub mod websocket;

pub use api::{create_router, AppState, ErrorResponse, GuessRequest, GuessResponse};
pub use config::{Config, FeedbackConfig, SeederConfig, ServerConfig};
pub use error::{CoastError, Result};
pub use manifest::{Coast, ImageRecord, Manifest};
pub use round::{
    Feedback, FeedbackTiming, GameOver, GuessOutcome, IgnoreReason, RoundPhase, RoundState,
    DEFAULT_CORRECT_DELAY, DEFAULT_INCORRECT_DELAY,
};
pub use scheduler::{ManualScheduler, Scheduler, Task, TokioScheduler};
pub use sequencer::{build_sequence, build_sequence_with, PlaySequence, RngShuffler, Shuffler};
pub use session::{
    start_round, GameOverCallback, Progress, RoundHandle, RoundOptions, RoundSnapshot,
    TransitionObserver,
};
pub use websocket::{EventBroadcaster, GameEvent};
