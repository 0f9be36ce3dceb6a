//! End-to-end tests for the dictation session: hotkey edges through
//! capture, pipeline, history and delivery, with real timing semantics
//! under paused virtual time.

use crate::capture::{AudioCapture, AudioClip, CaptureError};
use crate::delivery::{DeliveryError, TextDelivery};
use crate::pipeline::Pipeline;
use crate::services::{
    EnrichOptions, Enricher, Enrichment, LlmError, SttError, StyleTransformer, Transcriber,
};
use crate::session::{CycleOutcome, DictationSession};
use crate::settings::{Macro, SettingsSnapshot};
use crate::state::AppState;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct ScriptedTranscriber {
    transcripts: Mutex<Vec<String>>,
}

impl ScriptedTranscriber {
    fn repeating(text: &str, times: usize) -> Self {
        Self {
            transcripts: Mutex::new(vec![text.to_string(); times]),
        }
    }
}

#[async_trait]
impl Transcriber for ScriptedTranscriber {
    async fn transcribe(&self, _audio: &AudioClip) -> Result<String, SttError> {
        let mut transcripts = self.transcripts.lock().unwrap();
        transcripts
            .pop()
            .ok_or_else(|| SttError::Api("script exhausted".to_string()))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

struct PassthroughEnricher;

#[async_trait]
impl Enricher for PassthroughEnricher {
    async fn enrich(&self, text: &str, _options: &EnrichOptions) -> Result<Enrichment, LlmError> {
        Ok(Enrichment {
            text: text.to_string(),
            corrections_applied: 0,
            self_corrections_applied: 0,
        })
    }

    fn name(&self) -> &'static str {
        "passthrough"
    }
}

/// Never completes within the stage timeout.
struct StalledEnricher;

#[async_trait]
impl Enricher for StalledEnricher {
    async fn enrich(&self, _text: &str, _options: &EnrichOptions) -> Result<Enrichment, LlmError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(LlmError::Api("unreachable".to_string()))
    }

    fn name(&self) -> &'static str {
        "stalled"
    }
}

struct PrefixTransformer(&'static str);

#[async_trait]
impl StyleTransformer for PrefixTransformer {
    async fn transform(&self, text: &str, _style_prompt: &str) -> Result<String, LlmError> {
        Ok(format!("{}{}", self.0, text))
    }

    fn name(&self) -> &'static str {
        "prefix"
    }
}

struct FixedCapture {
    duration: Duration,
}

#[async_trait]
impl AudioCapture for FixedCapture {
    async fn start_capture(&self) -> Result<(), CaptureError> {
        Ok(())
    }

    async fn stop_capture(&self) -> Result<AudioClip, CaptureError> {
        Ok(AudioClip::new(vec![0u8; 320], "audio/wav", self.duration))
    }
}

struct RecordingDelivery {
    delivered: Mutex<Vec<String>>,
    failures_remaining: AtomicUsize,
}

impl RecordingDelivery {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            delivered: Mutex::new(Vec::new()),
            failures_remaining: AtomicUsize::new(0),
        })
    }

    fn failing_once() -> Arc<Self> {
        Arc::new(Self {
            delivered: Mutex::new(Vec::new()),
            failures_remaining: AtomicUsize::new(1),
        })
    }

    fn delivered(&self) -> Vec<String> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextDelivery for RecordingDelivery {
    async fn deliver(&self, text: &str) -> Result<(), DeliveryError> {
        if self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(DeliveryError::Failed("paste rejected".to_string()));
        }
        self.delivered.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

fn snapshot() -> SettingsSnapshot {
    SettingsSnapshot::default()
}

async fn run_cycle(session: &DictationSession) -> CycleOutcome {
    session.hotkey_pressed().await.unwrap();
    session.hotkey_released().await.unwrap()
}

#[tokio::test]
async fn test_german_dictation_with_macro_and_style_command() {
    super::init_logging();
    let transcriber = ScriptedTranscriber::repeating(
        "Heute war ein produktiver Tag und mein zoom link steht unten, mach daraus einen LinkedIn Post.",
        1,
    );
    let delivery = RecordingDelivery::new();
    let session = DictationSession::new(
        Pipeline::new(
            Arc::new(transcriber),
            Arc::new(PassthroughEnricher),
            Arc::new(PrefixTransformer("🚀 ")),
        ),
        Arc::new(FixedCapture {
            duration: Duration::from_secs(4),
        }),
        delivery.clone(),
        snapshot(),
    );

    let outcome = run_cycle(&session).await;

    let delivered = delivery.delivered();
    assert_eq!(delivered.len(), 1);
    // Macro expanded, style command stripped, transform applied.
    assert_eq!(
        delivered[0],
        "🚀 Heute war ein produktiver Tag und https://zoom.us/j/DEINE-MEETING-ID steht unten"
    );
    assert!(matches!(outcome, CycleOutcome::Delivered { .. }));

    let history = session.history();
    assert_eq!(history.len(), 1);
    assert!(history[0].original_text.contains("mein zoom link"));
    assert_eq!(history[0].final_text, delivered[0]);
    assert_eq!(session.current_state(), AppState::Idle);
}

#[tokio::test]
async fn test_state_sequence_of_a_successful_cycle() {
    let delivery = RecordingDelivery::new();
    let session = DictationSession::new(
        Pipeline::new(
            Arc::new(ScriptedTranscriber::repeating("hallo welt", 1)),
            Arc::new(PassthroughEnricher),
            Arc::new(PrefixTransformer("")),
        ),
        Arc::new(FixedCapture {
            duration: Duration::from_secs(2),
        }),
        delivery,
        SettingsSnapshot {
            style_shortcuts: Vec::new(),
            ..snapshot()
        },
    );

    let mut changes = session.subscribe();
    run_cycle(&session).await;

    let mut observed = Vec::new();
    while let Ok(change) = changes.try_recv() {
        observed.push(change.to);
    }
    assert_eq!(
        observed,
        vec![
            AppState::Recording,
            AppState::Processing,
            AppState::Pasting,
            AppState::Idle
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_enrichment_timeout_degrades_to_raw_with_macros() {
    let delivery = RecordingDelivery::new();
    let session = DictationSession::new(
        Pipeline::new(
            Arc::new(ScriptedTranscriber::repeating("schick das an meine email", 1)),
            Arc::new(StalledEnricher),
            Arc::new(PrefixTransformer("")),
        ),
        Arc::new(FixedCapture {
            duration: Duration::from_secs(2),
        }),
        delivery.clone(),
        SettingsSnapshot {
            style_shortcuts: Vec::new(),
            ..snapshot()
        },
    );

    let outcome = run_cycle(&session).await;

    // Enrichment timed out after the stage timeout; macros still ran on
    // the raw transcript and the cycle completed normally.
    assert!(matches!(outcome, CycleOutcome::Delivered { .. }));
    assert_eq!(delivery.delivered(), vec!["schick das an deine@email.de"]);

    let history = session.history();
    assert_eq!(history[0].enriched_text, history[0].original_text);
    assert_eq!(session.current_state(), AppState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_delivery_failure_enters_error_then_auto_recovers() {
    super::init_logging();
    let delivery = RecordingDelivery::failing_once();
    let session = DictationSession::new(
        Pipeline::new(
            Arc::new(ScriptedTranscriber::repeating("hallo welt", 2)),
            Arc::new(PassthroughEnricher),
            Arc::new(PrefixTransformer("")),
        ),
        Arc::new(FixedCapture {
            duration: Duration::from_secs(2),
        }),
        delivery.clone(),
        SettingsSnapshot {
            style_shortcuts: Vec::new(),
            ..snapshot()
        },
    );

    session.hotkey_pressed().await.unwrap();
    let err = session.hotkey_released().await.unwrap_err();
    assert!(!err.is_permission_denied());
    assert_eq!(session.current_state(), AppState::Error);

    // A press during the Error display is rejected.
    assert!(!session.hotkey_pressed().await.unwrap());

    // Error auto-resets to Idle, after which a new cycle works.
    tokio::time::sleep(Duration::from_millis(3100)).await;
    assert_eq!(session.current_state(), AppState::Idle);

    let outcome = run_cycle(&session).await;
    assert!(matches!(outcome, CycleOutcome::Delivered { .. }));
    assert_eq!(delivery.delivered(), vec!["hallo welt"]);
}

#[tokio::test]
async fn test_history_is_bounded_across_many_cycles() {
    let delivery = RecordingDelivery::new();
    let session = DictationSession::new(
        Pipeline::new(
            Arc::new(ScriptedTranscriber::repeating("kurzer satz", 12)),
            Arc::new(PassthroughEnricher),
            Arc::new(PrefixTransformer("")),
        ),
        Arc::new(FixedCapture {
            duration: Duration::from_secs(1),
        }),
        delivery,
        SettingsSnapshot {
            style_shortcuts: Vec::new(),
            ..snapshot()
        },
    );

    for _ in 0..12 {
        run_cycle(&session).await;
    }

    assert_eq!(session.history().len(), 10);
}

#[tokio::test]
async fn test_macro_update_takes_effect_on_next_cycle() {
    let delivery = RecordingDelivery::new();
    let session = DictationSession::new(
        Pipeline::new(
            Arc::new(ScriptedTranscriber::repeating("ruf die hotline an", 2)),
            Arc::new(PassthroughEnricher),
            Arc::new(PrefixTransformer("")),
        ),
        Arc::new(FixedCapture {
            duration: Duration::from_secs(1),
        }),
        delivery.clone(),
        SettingsSnapshot {
            style_shortcuts: Vec::new(),
            ..snapshot()
        },
    );

    run_cycle(&session).await;

    let mut updated = session.settings_snapshot();
    updated.macros = vec![Macro::new("die hotline", "+49 30 123456")];
    session.update_settings(updated);

    run_cycle(&session).await;

    assert_eq!(
        delivery.delivered(),
        vec!["ruf die hotline an", "ruf +49 30 123456 an"]
    );
}
