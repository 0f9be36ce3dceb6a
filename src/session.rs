//! Dictation session: binds the state machine, pipeline, history ledger
//! and host collaborators into one push-to-talk lifecycle.
//!
//! The session is the only component that advances the state machine. The
//! host wires its hotkey hook to [`DictationSession::hotkey_pressed`] and
//! [`DictationSession::hotkey_released`] and renders state changes from
//! the subscription; everything in between (capture, pipeline, history,
//! delivery) happens inside the session.

use crate::capture::{AudioCapture, CaptureError};
use crate::delivery::{DeliveryError, TextDelivery};
use crate::history::{HistoryEntry, HistoryLedger};
use crate::pipeline::{Pipeline, PipelineError};
use crate::settings::{SettingsSnapshot, MIN_RECORDING_DURATION_MS};
use crate::state::{AppState, StateChange, StateMachine};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;
use tokio::sync::broadcast;

/// Errors that end a cycle in the Error state.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

impl CycleError {
    /// Whether this failure is a missing OS input permission, which the
    /// host should surface with a permission prompt rather than a generic
    /// error toast.
    pub fn is_permission_denied(&self) -> bool {
        matches!(
            self,
            CycleError::Delivery(DeliveryError::PermissionDenied(_))
        )
    }
}

/// How a released hotkey resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Text was delivered and recorded in history.
    Delivered { entry_id: String, text: String },
    /// The recording was shorter than the minimum duration; nothing ran.
    DiscardedTooShort,
    /// The pipeline produced no text; the cycle is ledgered but nothing
    /// was delivered.
    DiscardedEmpty,
    /// No recording was in progress (duplicate release, or the press was
    /// rejected); nothing happened.
    NotRecording,
}

/// One push-to-talk dictation session.
pub struct DictationSession {
    state: StateMachine,
    pipeline: Pipeline,
    history: Mutex<HistoryLedger>,
    capture: Arc<dyn AudioCapture>,
    delivery: Arc<dyn TextDelivery>,
    settings: RwLock<SettingsSnapshot>,
    min_recording_duration: Duration,
}

impl DictationSession {
    pub fn new(
        pipeline: Pipeline,
        capture: Arc<dyn AudioCapture>,
        delivery: Arc<dyn TextDelivery>,
        settings: SettingsSnapshot,
    ) -> Self {
        Self {
            state: StateMachine::new(),
            pipeline,
            history: Mutex::new(HistoryLedger::new()),
            capture,
            delivery,
            settings: RwLock::new(settings),
            min_recording_duration: Duration::from_millis(MIN_RECORDING_DURATION_MS),
        }
    }

    /// Override the minimum-duration discard threshold.
    pub fn with_min_recording_duration(mut self, duration: Duration) -> Self {
        self.min_recording_duration = duration;
        self
    }

    /// Current application state.
    pub fn current_state(&self) -> AppState {
        self.state.current()
    }

    /// Subscribe to state-change notifications for UI rendering.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state.subscribe()
    }

    /// Hotkey down-edge: start recording.
    ///
    /// Returns `Ok(false)` when the press is ignored (already mid-cycle);
    /// duplicate down-edges are expected from OS-level hooks and are not
    /// errors.
    pub async fn hotkey_pressed(&self) -> Result<bool, CycleError> {
        if !self.state.request_start() {
            return Ok(false);
        }

        if let Err(e) = self.capture.start_capture().await {
            log::error!("Session: Failed to start capture: {}", e);
            self.state.report_outcome(false);
            return Err(e.into());
        }

        Ok(true)
    }

    /// Hotkey up-edge: stop recording and run the full cycle to delivery.
    ///
    /// Exactly one history entry is recorded per completed pipeline run;
    /// aborted and too-short cycles record nothing.
    pub async fn hotkey_released(&self) -> Result<CycleOutcome, CycleError> {
        if !self.state.request_stop() {
            return Ok(CycleOutcome::NotRecording);
        }

        let clip = match self.capture.stop_capture().await {
            Ok(clip) => clip,
            Err(e) => {
                log::error!("Session: Failed to stop capture: {}", e);
                self.state.report_outcome(false);
                return Err(e.into());
            }
        };

        // Accidental taps never reach the pipeline and never show an error.
        if clip.duration < self.min_recording_duration {
            log::info!(
                "Session: Discarding {:?} recording (below {:?} minimum)",
                clip.duration,
                self.min_recording_duration
            );
            self.state.force_idle();
            return Ok(CycleOutcome::DiscardedTooShort);
        }

        let snapshot = self.settings_snapshot();
        let result = match self.pipeline.run(clip, &snapshot).await {
            Ok(result) => result,
            Err(e) => {
                self.state.report_outcome(false);
                return Err(e.into());
            }
        };

        // Every completed pipeline run is ledgered, even when there is
        // nothing to deliver afterwards.
        let entry = HistoryEntry::new(
            result.raw_text,
            result.enriched_text,
            result.final_text.clone(),
        );
        let entry_id = entry.id.clone();
        self.lock_history().record(entry);

        if result.final_text.trim().is_empty() {
            log::info!("Session: Empty final text, nothing to deliver");
            self.state.report_outcome(true);
            return Ok(CycleOutcome::DiscardedEmpty);
        }

        self.state.begin_pasting();
        if let Err(e) = self.delivery.deliver(&result.final_text).await {
            log::error!("Session: Delivery failed: {}", e);
            self.state.report_outcome(false);
            return Err(e.into());
        }

        self.state.report_outcome(true);
        Ok(CycleOutcome::Delivered {
            entry_id,
            text: result.final_text,
        })
    }

    /// Re-run enrichment and macros on a recorded transcript.
    ///
    /// Records the result as a new history entry and returns it. The
    /// application state, style handling and delivery are untouched; the
    /// host decides what to do with the reprocessed text.
    pub async fn reprocess(&self, entry_id: &str) -> Option<HistoryEntry> {
        let original_text = {
            let history = self.lock_history();
            history.get(entry_id)?.original_text.clone()
        };

        let snapshot = self.settings_snapshot();
        let result = self.pipeline.reprocess(&original_text, &snapshot).await;

        let entry = HistoryEntry::new(result.raw_text, result.enriched_text, result.final_text);
        let mut history = self.lock_history();
        history.record(entry);
        history.latest().cloned()
    }

    /// All history entries, newest first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.lock_history().entries().into_iter().cloned().collect()
    }

    pub fn clear_history(&self) {
        self.lock_history().clear();
    }

    /// Seed the ledger from persisted entries (oldest first).
    pub fn restore_history(&self, entries: Vec<HistoryEntry>) {
        self.lock_history().restore(entries);
    }

    /// Replace the settings snapshot. Takes effect on the next cycle; a
    /// cycle already in flight keeps the snapshot it started with.
    pub fn update_settings(&self, snapshot: SettingsSnapshot) {
        *self.write_settings() = snapshot;
    }

    pub fn settings_snapshot(&self) -> SettingsSnapshot {
        match self.settings.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn write_settings(&self) -> std::sync::RwLockWriteGuard<'_, SettingsSnapshot> {
        match self.settings.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn lock_history(&self) -> MutexGuard<'_, HistoryLedger> {
        match self.history.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Session: History lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}
