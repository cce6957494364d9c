//! One-shot timers for deferred round transitions.
//!
//! A [`Scheduler`] decides *when* a task runs; the task itself applies a pure
//! state transition. Production code uses [`TokioScheduler`]; tests drive a
//! [`ManualScheduler`] by advancing its clock explicitly.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// A task run once when its timer fires.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs tasks after a delay.
///
/// Scheduled tasks cannot be cancelled.
pub trait Scheduler: Send + Sync + std::fmt::Debug {
    /// Runs `task` once, `delay` from now.
    fn schedule(&self, delay: Duration, task: Task);
}

// ============================================================================
// TokioScheduler
// ============================================================================

/// Schedules tasks on the ambient tokio runtime.
///
/// Must be used from within a runtime context.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: Task) {
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });
    }
}

// ============================================================================
// ManualScheduler
// ============================================================================

struct Pending {
    due: Duration,
    seq: u64,
    task: Task,
}

#[derive(Default)]
struct Clock {
    now: Duration,
    next_seq: u64,
    pending: Vec<Pending>,
}

/// A fake clock for deterministic tests.
///
/// Time only moves when [`ManualScheduler::advance`] is called. Due tasks
/// fire in deadline order, ties in scheduling order. Tasks may schedule
/// further tasks; those fire in the same `advance` call if they fall due.
#[derive(Default)]
pub struct ManualScheduler {
    clock: Mutex<Clock>,
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("ManualScheduler")
            .field("now", &clock.now)
            .field("pending", &clock.pending.len())
            .finish()
    }
}

impl ManualScheduler {
    /// Creates a scheduler at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current fake time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.clock.lock().unwrap_or_else(PoisonError::into_inner).now
    }

    /// Number of tasks waiting to fire.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.clock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pending
            .len()
    }

    /// Moves the clock forward by `by`, firing every task that falls due.
    ///
    /// Returns the number of tasks fired.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now() + by;
        let mut fired = 0;

        // The lock is released before each task runs so tasks can reschedule.
        while let Some(task) = self.pop_due(target) {
            task();
            fired += 1;
        }

        self.clock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .now = target;
        fired
    }

    fn pop_due(&self, target: Duration) -> Option<Task> {
        let mut clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
        let index = clock
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due <= target)
            .min_by_key(|(_, p)| (p.due, p.seq))
            .map(|(i, _)| i)?;

        let pending = clock.pending.swap_remove(index);
        clock.now = clock.now.max(pending.due);
        Some(pending.task)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Task) {
        let mut clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
        let seq = clock.next_seq;
        clock.next_seq += 1;
        let due = clock.now + delay;
        clock.pending.push(Pending { due, seq, task });
    }
}

// ============================================================================
// Tests
// ============================================================================
