//! Application state machine.
//!
//! Single source of truth for what the engine is currently doing. All
//! callers (hotkey listener, UI, pipeline) interact only through the
//! declared operations; nothing mutates the state directly. The machine is
//! the single serialization point between the hotkey-hook thread and the
//! async runtime, so every operation takes a plain `&self` and locks
//! internally.
//!
//! Entering `Error` arms a bounded auto-reset timer back to `Idle`; any
//! explicit transition cancels it.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::settings::ERROR_RESET_TIMEOUT_MS;

/// The five application states. Exactly one is active at any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppState {
    /// Ready to start a new recording.
    Idle,
    /// Actively capturing audio.
    Recording,
    /// Running the dictation pipeline.
    Processing,
    /// Delivering finalized text to the focused application.
    Pasting,
    /// A cycle failed; display state only, auto-recovers to Idle.
    Error,
}

impl AppState {
    /// Check if this state allows starting a new recording.
    pub fn can_start_recording(&self) -> bool {
        matches!(self, AppState::Idle)
    }

    /// Check if this state allows stopping a recording.
    pub fn can_stop_recording(&self) -> bool {
        matches!(self, AppState::Recording)
    }
}

/// One observed state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    pub from: AppState,
    pub to: AppState,
}

struct Inner {
    state: AppState,
    /// Cancels the pending Error auto-reset task, if armed.
    reset_token: Option<CancellationToken>,
}

/// Thread-safe state machine handle.
///
/// Cheap to clone; all clones share the same state.
#[derive(Clone)]
pub struct StateMachine {
    inner: Arc<Mutex<Inner>>,
    notifier: broadcast::Sender<StateChange>,
    error_reset_timeout: Duration,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::with_error_reset_timeout(Duration::from_millis(ERROR_RESET_TIMEOUT_MS))
    }

    pub fn with_error_reset_timeout(error_reset_timeout: Duration) -> Self {
        let (notifier, _) = broadcast::channel(32);
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: AppState::Idle,
                reset_token: None,
            })),
            notifier,
            error_reset_timeout,
        }
    }

    /// Subscribe to state-change notifications.
    ///
    /// Changes are delivered to every subscriber in transition order.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.notifier.subscribe()
    }

    /// Current state.
    pub fn current(&self) -> AppState {
        self.lock().state
    }

    /// Request Idle → Recording.
    ///
    /// Returns `true` if granted. Any other current state silently drops
    /// the request; this is the guard against duplicate hotkey down-edges.
    pub fn request_start(&self) -> bool {
        let mut inner = self.lock();
        if !inner.state.can_start_recording() {
            log::debug!("State: Start request ignored in {:?}", inner.state);
            return false;
        }
        self.transition(&mut inner, AppState::Recording);
        true
    }

    /// Request Recording → Processing.
    ///
    /// Returns `true` if granted; ignored in any other state.
    pub fn request_stop(&self) -> bool {
        let mut inner = self.lock();
        if !inner.state.can_stop_recording() {
            log::debug!("State: Stop request ignored in {:?}", inner.state);
            return false;
        }
        self.transition(&mut inner, AppState::Processing);
        true
    }

    /// Processing → Pasting, immediately before delivery.
    pub fn begin_pasting(&self) {
        let mut inner = self.lock();
        if inner.state != AppState::Processing {
            log::debug!("State: begin_pasting ignored in {:?}", inner.state);
            return;
        }
        self.transition(&mut inner, AppState::Pasting);
    }

    /// Terminal outcome of a cycle: Idle on success, Error on failure.
    ///
    /// Entering Error arms the auto-reset timer.
    pub fn report_outcome(&self, success: bool) {
        let mut inner = self.lock();
        if success {
            self.transition(&mut inner, AppState::Idle);
        } else {
            self.transition(&mut inner, AppState::Error);
            self.arm_reset_timer(&mut inner);
        }
    }

    /// Administrative reset; cancels any pending auto-reset timer.
    pub fn force_idle(&self) {
        let mut inner = self.lock();
        if inner.state != AppState::Idle {
            self.transition(&mut inner, AppState::Idle);
        } else {
            Self::cancel_timer(&mut inner);
        }
    }

    /// Perform a transition and notify observers, cancelling any pending
    /// reset timer. Callers hold the lock, which serializes notification
    /// order across threads.
    fn transition(&self, inner: &mut Inner, to: AppState) {
        Self::cancel_timer(inner);
        let from = inner.state;
        inner.state = to;
        log::debug!("State: {:?} -> {:?}", from, to);
        let _ = self.notifier.send(StateChange { from, to });
    }

    fn cancel_timer(inner: &mut Inner) {
        if let Some(token) = inner.reset_token.take() {
            token.cancel();
        }
    }

    /// Arm the Error → Idle auto-reset task.
    ///
    /// Must be called from within a tokio runtime; `report_outcome(false)`
    /// is only reachable from the async cycle path.
    fn arm_reset_timer(&self, inner: &mut Inner) {
        let token = CancellationToken::new();
        inner.reset_token = Some(token.clone());

        let machine = self.clone();
        let timeout = self.error_reset_timeout;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(timeout) => {
                    let mut inner = machine.lock();
                    // Any explicit transition cancels the token first, so an
                    // uncancelled token means this timer is still current.
                    if inner.state == AppState::Error && !token.is_cancelled() {
                        log::debug!("State: Auto-reset Error -> Idle");
                        machine.transition(&mut inner, AppState::Idle);
                    }
                }
            }
        });
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("State: Lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
