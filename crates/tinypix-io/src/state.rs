//! Per-operation progress, error, and processing state.
//!
//! One [`ProcessState`] backs one flow invocation at a time. The cells
//! are plain `Cell`/`RefCell` values on the single-threaded browser
//! event loop; overlapping invocations sharing an instance would race
//! on them, so callers serialize operations or hold one state per
//! operation.
//!
//! [`ProgressTicker`] is the cosmetic ramp shown while a response is
//! awaited: an independently cancellable periodic task bounded by a
//! ceiling, advancing the displayed value by a small random amount on
//! each tick.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo_timers::future::TimeoutFuture;
use wasm_bindgen_futures::spawn_local;

/// Milliseconds between simulated-progress ticks.
const TICK_MS: u32 = 200;

/// Progress, error, and processing cells for one active operation.
#[derive(Debug, Default)]
pub struct ProcessState {
    processing: Cell<bool>,
    progress: Cell<u8>,
    error: RefCell<Option<String>>,
}

impl ProcessState {
    /// Create an idle state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the start of a new attempt: processing set, progress
    /// zeroed, any previous error cleared.
    pub fn begin(&self) {
        self.processing.set(true);
        self.progress.set(0);
        self.error.borrow_mut().take();
    }

    /// Advance the displayed progress, clamped to 100.
    pub fn set_progress(&self, value: u8) {
        self.progress.set(value.min(100));
    }

    /// Current progress value, 0-100.
    #[must_use]
    pub fn progress(&self) -> u8 {
        self.progress.get()
    }

    /// Whether an operation is currently in flight.
    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.processing.get()
    }

    /// The terminal error message, if the last attempt failed.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.error.borrow().clone()
    }

    /// Terminal failure: record the message, reset progress so the UI
    /// never appears stuck mid-bar, and clear the processing flag.
    pub fn fail(&self, message: &str) {
        *self.error.borrow_mut() = Some(message.to_owned());
        self.progress.set(0);
        self.processing.set(false);
    }

    /// Terminal success: progress pinned to 100, processing cleared.
    pub fn complete(&self) {
        self.progress.set(100);
        self.processing.set(false);
    }
}

/// Handle for the simulated-progress task.
///
/// Cancellation is an explicit token shared with the spawned loop.
/// [`cancel`](Self::cancel) is idempotent, and dropping the handle
/// cancels as well, so every early-return path stops the ramp.
pub struct ProgressTicker {
    cancelled: Rc<Cell<bool>>,
}

impl ProgressTicker {
    /// Start ticking `state` toward `ceiling`.
    ///
    /// Every 200 ms the displayed value grows by 1-3 points, capped at
    /// `ceiling` so the bar never reaches the next real milestone
    /// before the awaited response actually arrives.
    #[must_use]
    pub fn start(state: Rc<ProcessState>, ceiling: u8) -> Self {
        let cancelled = Rc::new(Cell::new(false));
        let token = Rc::clone(&cancelled);
        spawn_local(async move {
            loop {
                TimeoutFuture::new(TICK_MS).await;
                if token.get() {
                    break;
                }
                let current = state.progress();
                if current >= ceiling {
                    break;
                }
                state.set_progress(next_tick(current, ceiling, js_sys::Math::random()));
            }
        });
        Self { cancelled }
    }

    /// Stop the ramp. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Next simulated value: advance by 1-3 points, never past `ceiling`.
#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn next_tick(current: u8, ceiling: u8, random: f64) -> u8 {
    let increment = 1 + (random * 2.0).round() as u8;
    current.saturating_add(increment).min(ceiling)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_resets_progress_and_error() {
        let state = ProcessState::new();
        state.fail("boom");
        state.begin();
        assert!(state.is_processing());
        assert_eq!(state.progress(), 0);
        assert_eq!(state.error(), None);
    }

    #[test]
    fn fail_records_message_and_resets_progress() {
        let state = ProcessState::new();
        state.begin();
        state.set_progress(42);
        state.fail("download failed");
        assert!(!state.is_processing());
        assert_eq!(state.progress(), 0);
        assert_eq!(state.error(), Some("download failed".to_owned()));
    }

    #[test]
    fn complete_pins_progress_to_full() {
        let state = ProcessState::new();
        state.begin();
        state.set_progress(95);
        state.complete();
        assert!(!state.is_processing());
        assert_eq!(state.progress(), 100);
        assert_eq!(state.error(), None);
    }

    #[test]
    fn set_progress_clamps_at_100() {
        let state = ProcessState::new();
        state.set_progress(250);
        assert_eq!(state.progress(), 100);
    }

    #[test]
    fn next_tick_advances_by_one_to_three() {
        assert_eq!(next_tick(10, 75, 0.0), 11);
        assert_eq!(next_tick(10, 75, 0.5), 12);
        assert_eq!(next_tick(10, 75, 1.0), 13);
    }

    #[test]
    fn next_tick_never_passes_ceiling() {
        assert_eq!(next_tick(74, 75, 1.0), 75);
        assert_eq!(next_tick(75, 75, 1.0), 75);
    }

    #[test]
    fn next_tick_saturates_near_the_top() {
        assert_eq!(next_tick(255, 255, 1.0), 255);
    }
}
