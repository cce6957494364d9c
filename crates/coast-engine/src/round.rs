//! Round state for the guessing game.
//!
//! This module defines the scoring state machine as plain values. Every
//! transition returns a new [`RoundState`]; nothing here knows about clocks
//! or threads. Timing lives in [`crate::session`].
//!
//! The phase transitions are:
//! - `AwaitingGuess` -> `ShowingFeedback` (any guess)
//! - `ShowingFeedback` (correct) -> `AwaitingGuess` (more images) or
//!   `Terminated` (sequence finished)
//! - `ShowingFeedback` (incorrect) -> `Terminated`
//!
//! `Empty` and `Terminated` are never left.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::manifest::Coast;
use crate::sequencer::PlaySequence;

/// Delay before a correct guess resolves.
pub const DEFAULT_CORRECT_DELAY: Duration = Duration::from_millis(1000);

/// Delay before an incorrect guess resolves.
pub const DEFAULT_INCORRECT_DELAY: Duration = Duration::from_millis(1500);

// ============================================================================
// Feedback and GameOver
// ============================================================================

/// The reveal shown between a guess and its resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    /// Whether the guess matched the image's coast.
    pub is_correct: bool,
    /// The city the image was taken in.
    pub city: String,
}

/// Final result of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameOver {
    /// Consecutive correct guesses.
    pub final_score: u32,
    /// City of the image that ended the streak; `None` when every image was
    /// guessed correctly.
    pub offending_city: Option<String>,
}

impl GameOver {
    /// Returns `true` if the whole sequence was guessed correctly.
    #[must_use]
    pub const fn is_victory(&self) -> bool {
        self.offending_city.is_none()
    }

    /// Verdict shown on the result screen.
    ///
    /// # Examples
    ///
    /// ```
    /// use coast_engine::GameOver;
    ///
    /// let lost = GameOver { final_score: 3, offending_city: Some("Boston".into()) };
    /// assert_eq!(lost.message(), "Not bad!");
    ///
    /// let won = GameOver { final_score: 3, offending_city: None };
    /// assert_eq!(won.message(), "You got them all!");
    /// ```
    #[must_use]
    pub const fn message(&self) -> &'static str {
        if self.offending_city.is_none() {
            return "You got them all!";
        }
        match self.final_score {
            0 => "Better luck next time!",
            1..=4 => "Not bad!",
            5..=9 => "Nice streak!",
            _ => "Impressive!",
        }
    }
}

// ============================================================================
// FeedbackTiming
// ============================================================================

/// How long feedback stays on screen before a guess resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackTiming {
    /// Delay after a correct guess.
    pub correct: Duration,
    /// Delay after an incorrect guess.
    pub incorrect: Duration,
}

impl Default for FeedbackTiming {
    fn default() -> Self {
        Self {
            correct: DEFAULT_CORRECT_DELAY,
            incorrect: DEFAULT_INCORRECT_DELAY,
        }
    }
}

impl FeedbackTiming {
    /// Returns the delay for a guess with the given correctness.
    #[must_use]
    pub const fn delay_for(&self, is_correct: bool) -> Duration {
        if is_correct {
            self.correct
        } else {
            self.incorrect
        }
    }
}

// ============================================================================
// RoundPhase
// ============================================================================

/// Where a round currently stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum RoundPhase {
    /// The sequence had no images; nothing can be played.
    Empty,
    /// Waiting for the player to pick a coast.
    AwaitingGuess,
    /// A guess was made and its result is being revealed.
    ShowingFeedback(Feedback),
    /// The game is over.
    Terminated(GameOver),
}

impl RoundPhase {
    /// Returns the phase name used in logs and events.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::AwaitingGuess => "awaiting_guess",
            Self::ShowingFeedback(_) => "showing_feedback",
            Self::Terminated(_) => "terminated",
        }
    }
}

impl std::fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Guess outcomes
// ============================================================================

/// Why a guess was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// There is no current image.
    NoImage,
    /// A previous guess is still being revealed.
    FeedbackPending,
    /// The game has already ended.
    Terminated,
}

impl std::fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoImage => write!(f, "no_image"),
            Self::FeedbackPending => write!(f, "feedback_pending"),
            Self::Terminated => write!(f, "terminated"),
        }
    }
}

/// Result of submitting a guess.
///
/// Ignored guesses are expected during normal play (double clicks, late
/// input) and are not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuessOutcome {
    /// The guess was evaluated and its feedback is now showing.
    Accepted(Feedback),
    /// The guess was dropped without changing anything.
    Ignored(IgnoreReason),
}

impl GuessOutcome {
    /// Returns `true` if the guess was applied.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

// ============================================================================
// RoundState
// ============================================================================

/// Complete state of one game.
///
/// Values are replaced wholesale on each transition, so tests can compare
/// whole states with `assert_eq!`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundState {
    /// Index of the current image in the play sequence.
    pub position: usize,
    /// Consecutive correct guesses so far.
    pub streak: u32,
    /// Current phase.
    #[serde(flatten)]
    pub phase: RoundPhase,
}

impl RoundState {
    /// Creates the initial state for a sequence of `total` images.
    ///
    /// # Examples
    ///
    /// ```
    /// use coast_engine::{RoundPhase, RoundState};
    ///
    /// assert_eq!(RoundState::new(4).phase, RoundPhase::AwaitingGuess);
    /// assert_eq!(RoundState::new(0).phase, RoundPhase::Empty);
    /// ```
    #[must_use]
    pub const fn new(total: usize) -> Self {
        Self {
            position: 0,
            streak: 0,
            phase: if total == 0 {
                RoundPhase::Empty
            } else {
                RoundPhase::AwaitingGuess
            },
        }
    }

    /// Returns `true` if the game is over.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self.phase, RoundPhase::Terminated(_))
    }

    /// Returns `true` if the state accepts a guess.
    #[must_use]
    pub const fn is_awaiting_guess(&self) -> bool {
        matches!(self.phase, RoundPhase::AwaitingGuess)
    }

    /// Feedback currently being revealed, if any.
    #[must_use]
    pub const fn pending_feedback(&self) -> Option<&Feedback> {
        match &self.phase {
            RoundPhase::ShowingFeedback(feedback) => Some(feedback),
            _ => None,
        }
    }

    /// Final result, once terminated.
    #[must_use]
    pub const fn game_over(&self) -> Option<&GameOver> {
        match &self.phase {
            RoundPhase::Terminated(result) => Some(result),
            _ => None,
        }
    }

    /// Evaluates a guess against the current image.
    ///
    /// On success returns the state showing feedback; the caller schedules
    /// [`RoundState::resolve`] after the matching delay. Returns the reason
    /// the guess was ignored otherwise, leaving `self` untouched.
    pub fn guess(
        &self,
        sequence: &PlaySequence,
        guess: Coast,
    ) -> Result<(Self, Feedback), IgnoreReason> {
        match self.phase {
            RoundPhase::AwaitingGuess => {}
            RoundPhase::Empty => return Err(IgnoreReason::NoImage),
            RoundPhase::ShowingFeedback(_) => return Err(IgnoreReason::FeedbackPending),
            RoundPhase::Terminated(_) => return Err(IgnoreReason::Terminated),
        }

        let current = sequence.get(self.position).ok_or(IgnoreReason::NoImage)?;
        let feedback = Feedback {
            is_correct: current.coast == guess,
            city: current.city.clone(),
        };

        let next = Self {
            position: self.position,
            streak: self.streak,
            phase: RoundPhase::ShowingFeedback(feedback.clone()),
        };
        Ok((next, feedback))
    }

    /// Applies the deferred half of a guess.
    ///
    /// A correct guess increments the streak and then either ends the game
    /// (last image) or advances to the next image. An incorrect guess ends
    /// the game with the current streak and the revealed city. Any other
    /// phase is returned unchanged.
    #[must_use]
    pub fn resolve(&self, total: usize) -> Self {
        let RoundPhase::ShowingFeedback(feedback) = &self.phase else {
            return self.clone();
        };

        if !feedback.is_correct {
            return Self {
                position: self.position,
                streak: self.streak,
                phase: RoundPhase::Terminated(GameOver {
                    final_score: self.streak,
                    offending_city: Some(feedback.city.clone()),
                }),
            };
        }

        let streak = self.streak + 1;
        if self.position + 1 >= total {
            Self {
                position: self.position,
                streak,
                phase: RoundPhase::Terminated(GameOver {
                    final_score: streak,
                    offending_city: None,
                }),
            }
        } else {
            Self {
                position: self.position + 1,
                streak,
                phase: RoundPhase::AwaitingGuess,
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
