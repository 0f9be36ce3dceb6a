//! Push-to-talk dictation engine.
//!
//! `parlando` turns one recorded utterance into finalized text through a
//! staged pipeline (transcription, LLM enrichment, macro substitution,
//! spoken style commands) and delivers it to the focused application. The
//! crate is host-agnostic: audio capture, text delivery and settings
//! persistence are capability traits the embedding application implements;
//! the engine owns the state machine, the pipeline and the history ledger.
//!
//! Entry point for hosts is [`session::DictationSession`], wired to a
//! push-to-talk hotkey via `hotkey_pressed` / `hotkey_released`.

pub mod capture;
pub mod delivery;
pub mod history;
pub mod macros;
pub mod pipeline;
pub mod services;
pub mod session;
pub mod settings;
pub mod state;
pub mod styles;

#[cfg(test)]
mod tests;

pub use capture::{AudioCapture, AudioClip, CaptureError};
pub use delivery::{DeliveryError, TextDelivery};
pub use history::{HistoryEntry, HistoryLedger};
pub use pipeline::{Pipeline, PipelineConfig, PipelineError, PipelineResult, Stage};
pub use services::{
    EnrichOptions, Enricher, Enrichment, GroqClient, LlmError, SttError, StyleTransformer,
    Transcriber,
};
pub use session::{CycleError, CycleOutcome, DictationSession};
pub use settings::{
    LeadInTemplate, Macro, SettingsError, SettingsSnapshot, SettingsStore, StyleShortcut,
};
pub use state::{AppState, StateChange, StateMachine};
