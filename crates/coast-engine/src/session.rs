//! Live rounds driven by a presentation shell.
//!
//! A [`RoundHandle`] owns one game: the play sequence, the current
//! [`RoundState`] and the deferred transition that follows each guess.
//! Shells read from the handle and call [`RoundHandle::submit_guess`]; the
//! handle reports the result through the `on_game_over` callback exactly
//! once.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use coast_engine::{Coast, ImageRecord, ManualScheduler, PlaySequence, RoundHandle, RoundOptions};
//!
//! let scheduler = Arc::new(ManualScheduler::new());
//! let sequence = PlaySequence::from_ordered(vec![
//!     ImageRecord::new("w", "west/w.jpg", "Seattle", Coast::West),
//!     ImageRecord::new("e", "east/e.jpg", "Miami", Coast::East),
//! ]);
//!
//! let handle = RoundHandle::with_sequence(
//!     sequence,
//!     RoundOptions::new(scheduler.clone()),
//!     |result| println!("final score: {}", result.final_score),
//! );
//!
//! handle.submit_guess(Coast::West);
//! scheduler.advance(Duration::from_secs(1));
//! assert_eq!(handle.current_streak(), 1);
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::manifest::{Coast, ImageRecord};
use crate::round::{Feedback, FeedbackTiming, GameOver, GuessOutcome, RoundState};
use crate::scheduler::{Scheduler, TokioScheduler};
use crate::sequencer::{build_sequence, PlaySequence};

/// Callback invoked once when the game ends.
pub type GameOverCallback = Box<dyn FnOnce(GameOver) + Send + 'static>;

/// Callback invoked after every state change.
pub type TransitionObserver = Arc<dyn Fn(&RoundSnapshot) + Send + Sync + 'static>;

// ============================================================================
// Progress and snapshots
// ============================================================================

/// How far through the sequence a round is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// 0-based index of the current image.
    pub position: usize,
    /// Total images in the sequence.
    pub total: usize,
}

/// Read-only view of a round for shells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundSnapshot {
    /// Current state.
    pub state: RoundState,
    /// Image being guessed, if any.
    pub current_image: Option<ImageRecord>,
    /// Position within the sequence.
    pub progress: Progress,
}

impl RoundSnapshot {
    /// Feedback currently being revealed, if any.
    #[must_use]
    pub const fn feedback(&self) -> Option<&Feedback> {
        self.state.pending_feedback()
    }

    /// Final result, once the game is over.
    #[must_use]
    pub const fn game_over(&self) -> Option<&GameOver> {
        self.state.game_over()
    }
}

// ============================================================================
// RoundOptions
// ============================================================================

/// Timing and hooks for a round.
#[derive(Clone)]
pub struct RoundOptions {
    /// Feedback delays.
    pub timing: FeedbackTiming,
    /// Where deferred transitions run.
    pub scheduler: Arc<dyn Scheduler>,
    /// Optional observer notified after each transition.
    pub observer: Option<TransitionObserver>,
}

impl std::fmt::Debug for RoundOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundOptions")
            .field("timing", &self.timing)
            .field("scheduler", &self.scheduler)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl Default for RoundOptions {
    fn default() -> Self {
        Self::new(Arc::new(TokioScheduler))
    }
}

impl RoundOptions {
    /// Default timing on the given scheduler.
    #[must_use]
    pub fn new(scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            timing: FeedbackTiming::default(),
            scheduler,
            observer: None,
        }
    }

    /// Overrides the feedback delays.
    #[must_use]
    pub const fn with_timing(mut self, timing: FeedbackTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Registers an observer for state changes.
    #[must_use]
    pub fn with_observer(
        mut self,
        observer: impl Fn(&RoundSnapshot) + Send + Sync + 'static,
    ) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }
}

// ============================================================================
// RoundHandle
// ============================================================================

struct Inner {
    sequence: PlaySequence,
    state: RoundState,
    on_game_over: Option<GameOverCallback>,
}

impl Inner {
    fn snapshot(&self) -> RoundSnapshot {
        RoundSnapshot {
            state: self.state.clone(),
            current_image: self.sequence.get(self.state.position).cloned(),
            progress: Progress {
                position: self.state.position,
                total: self.sequence.len(),
            },
        }
    }
}

/// Handle to a running game.
///
/// Cloning the handle shares the same game.
#[derive(Clone)]
pub struct RoundHandle {
    inner: Arc<Mutex<Inner>>,
    // Held from a state change until its observer call returns, so observers
    // see transitions in the order they were applied. Always taken before
    // `inner`.
    transitions: Arc<Mutex<()>>,
    options: RoundOptions,
}

impl std::fmt::Debug for RoundHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundHandle")
            .field("state", &self.lock().state)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Starts a round with fresh randomness, default timing and tokio timers.
///
/// Must be called from within a tokio runtime.
pub fn start_round(
    images: &[ImageRecord],
    on_game_over: impl FnOnce(GameOver) + Send + 'static,
) -> RoundHandle {
    RoundHandle::start(images, RoundOptions::default(), on_game_over)
}

impl RoundHandle {
    /// Builds a balanced sequence from `images` and starts a round on it.
    pub fn start(
        images: &[ImageRecord],
        options: RoundOptions,
        on_game_over: impl FnOnce(GameOver) + Send + 'static,
    ) -> Self {
        Self::with_sequence(build_sequence(images), options, on_game_over)
    }

    /// Starts a round on an already built sequence.
    pub fn with_sequence(
        sequence: PlaySequence,
        options: RoundOptions,
        on_game_over: impl FnOnce(GameOver) + Send + 'static,
    ) -> Self {
        let state = RoundState::new(sequence.len());
        tracing::info!(total = sequence.len(), phase = %state.phase, "Round started");

        Self {
            inner: Arc::new(Mutex::new(Inner {
                sequence,
                state,
                on_game_over: Some(Box::new(on_game_over)),
            })),
            transitions: Arc::new(Mutex::new(())),
            options,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The image the player is guessing, or `None` for an empty round.
    pub fn current_image(&self) -> Option<ImageRecord> {
        let inner = self.lock();
        inner.sequence.get(inner.state.position).cloned()
    }

    /// Consecutive correct guesses so far.
    pub fn current_streak(&self) -> u32 {
        self.lock().state.streak
    }

    /// Position within the sequence.
    pub fn progress(&self) -> Progress {
        let inner = self.lock();
        Progress {
            position: inner.state.position,
            total: inner.sequence.len(),
        }
    }

    /// Copy of the current state.
    pub fn state(&self) -> RoundState {
        self.lock().state.clone()
    }

    /// Full read-only view for rendering.
    pub fn snapshot(&self) -> RoundSnapshot {
        self.lock().snapshot()
    }

    /// Submits a guess for the current image.
    ///
    /// Accepted guesses reveal feedback immediately and resolve after the
    /// configured delay. Guesses made while feedback is showing, after the
    /// game ended, or without an image are ignored.
    pub fn submit_guess(&self, guess: Coast) -> GuessOutcome {
        let transition = self.begin_transition();
        let (feedback, snapshot) = {
            let mut inner = self.lock();
            match inner.state.guess(&inner.sequence, guess) {
                Ok((next, feedback)) => {
                    inner.state = next;
                    (feedback, inner.snapshot())
                }
                Err(reason) => {
                    tracing::debug!(
                        %guess,
                        %reason,
                        phase = %inner.state.phase,
                        "Guess ignored"
                    );
                    return GuessOutcome::Ignored(reason);
                }
            }
        };

        tracing::debug!(
            %guess,
            correct = feedback.is_correct,
            city = %feedback.city,
            position = snapshot.progress.position,
            "Guess accepted"
        );
        self.notify(&snapshot);
        drop(transition);

        let handle = self.clone();
        self.options.scheduler.schedule(
            self.options.timing.delay_for(feedback.is_correct),
            Box::new(move || handle.resolve_pending()),
        );

        GuessOutcome::Accepted(feedback)
    }

    /// Applies the deferred transition scheduled by the last guess.
    fn resolve_pending(&self) {
        let transition = self.begin_transition();
        let (snapshot, finished) = {
            let mut inner = self.lock();
            let next = inner.state.resolve(inner.sequence.len());
            if next == inner.state {
                return;
            }
            inner.state = next;

            let finished = inner
                .state
                .game_over()
                .cloned()
                .and_then(|result| inner.on_game_over.take().map(|cb| (cb, result)));
            (inner.snapshot(), finished)
        };

        match snapshot.game_over() {
            Some(result) => tracing::info!(
                final_score = result.final_score,
                offending_city = ?result.offending_city,
                "Round finished"
            ),
            None => tracing::debug!(
                position = snapshot.progress.position,
                streak = snapshot.state.streak,
                "Round advanced"
            ),
        }

        self.notify(&snapshot);
        drop(transition);

        if let Some((callback, result)) = finished {
            callback(result);
        }
    }

    fn begin_transition(&self) -> MutexGuard<'_, ()> {
        self.transitions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, snapshot: &RoundSnapshot) {
        if let Some(observer) = &self.options.observer {
            observer(snapshot);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
