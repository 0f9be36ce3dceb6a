//! Dictation pipeline orchestrator.
//!
//! Converts one captured recording into a finalized text plus an audit
//! record: transcribe → enrich → macro substitution → style
//! detect/transform. The orchestrator never panics past its boundary and
//! never retries; every stage failure degrades to the pre-stage text,
//! except transcription, which aborts the cycle (there is no text to act
//! on).
//!
//! Configuration is passed in as an explicit snapshot on each call; the
//! orchestrator holds no mutable settings of its own.

use crate::capture::AudioClip;
use crate::macros::apply_macros;
use crate::services::{EnrichOptions, Enricher, SttError, StyleTransformer, Transcriber};
use crate::settings::{SettingsSnapshot, STAGE_TIMEOUT_SECS};
use crate::styles::{detect_style_command, remove_style_command};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

/// Errors that abort a dictation cycle.
///
/// Only the transcription stage can abort; downstream stage failures are
/// recorded in the audit set instead.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Transcription failed: {0}")]
    Stt(#[from] SttError),

    #[error("Transcription timed out after {0:?}")]
    Timeout(Duration),
}

/// One step of the pipeline, as recorded in the audit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Transcribe,
    Enrich,
    MacroSubstitution,
    StyleTransform,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Transcribe => "transcribe",
            Stage::Enrich => "enrich",
            Stage::MacroSubstitution => "macro-substitution",
            Stage::StyleTransform => "style-transform",
        }
    }
}

/// Result of one completed cycle.
///
/// Produced once, consumed by the session (history write + delivery), then
/// discarded; the orchestrator retains nothing.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Raw transcript as returned by the speech-to-text service.
    pub raw_text: String,
    /// Text after enrichment; equals `raw_text` when enrichment degraded.
    pub enriched_text: String,
    /// Output of the last successfully completed stage.
    pub final_text: String,
    /// Stages that completed successfully this cycle.
    pub stages_succeeded: BTreeSet<Stage>,
    /// Id of the style shortcut applied, if a style transform succeeded.
    pub style_applied: Option<String>,
}

impl PipelineResult {
    pub fn enrichment_succeeded(&self) -> bool {
        self.stages_succeeded.contains(&Stage::Enrich)
    }
}

/// Configuration for the pipeline orchestrator.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Per-stage timeout. Exceeding it equals a stage failure (an abort
    /// for transcription).
    pub stage_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stage_timeout: Duration::from_secs(STAGE_TIMEOUT_SECS),
        }
    }
}

/// The pipeline orchestrator.
pub struct Pipeline {
    transcriber: Arc<dyn Transcriber>,
    enricher: Arc<dyn Enricher>,
    transformer: Arc<dyn StyleTransformer>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        enricher: Arc<dyn Enricher>,
        transformer: Arc<dyn StyleTransformer>,
    ) -> Self {
        Self::with_config(transcriber, enricher, transformer, PipelineConfig::default())
    }

    pub fn with_config(
        transcriber: Arc<dyn Transcriber>,
        enricher: Arc<dyn Enricher>,
        transformer: Arc<dyn StyleTransformer>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            transcriber,
            enricher,
            transformer,
            config,
        }
    }

    /// Run one end-to-end dictation cycle.
    ///
    /// Returns `Err` only when transcription fails or times out; every
    /// other stage failure is reflected in `stages_succeeded` instead.
    pub async fn run(
        &self,
        audio: AudioClip,
        snapshot: &SettingsSnapshot,
    ) -> Result<PipelineResult, PipelineError> {
        let timeout = self.config.stage_timeout;
        let mut stages_succeeded = BTreeSet::new();

        // Stage 1: transcribe. Hard failure aborts the cycle.
        log::info!(
            "Pipeline: Transcribing {} bytes (timeout {:?})",
            audio.bytes.len(),
            timeout
        );
        let raw_text = match tokio::time::timeout(timeout, self.transcriber.transcribe(&audio))
            .await
        {
            Ok(Ok(text)) => normalize_stt_text(text),
            Ok(Err(e)) => {
                log::error!("Pipeline: Transcription failed: {}", e);
                return Err(PipelineError::Stt(e));
            }
            Err(_) => {
                log::error!("Pipeline: Transcription timed out after {:?}", timeout);
                return Err(PipelineError::Timeout(timeout));
            }
        };
        stages_succeeded.insert(Stage::Transcribe);
        log::info!("Pipeline: Transcript ready, {} chars", raw_text.len());

        // Stage 2: enrich. Failure or timeout degrades to the raw text.
        let options = EnrichOptions {
            self_correction_enabled: snapshot.self_correction_enabled,
        };
        let enriched_text = match tokio::time::timeout(
            timeout,
            self.enricher.enrich(&raw_text, &options),
        )
        .await
        {
            Ok(Ok(enrichment)) => {
                stages_succeeded.insert(Stage::Enrich);
                log::info!(
                    "Pipeline: Enriched ({} corrections, {} self-corrections)",
                    enrichment.corrections_applied,
                    enrichment.self_corrections_applied
                );
                enrichment.text
            }
            Ok(Err(e)) => {
                log::warn!("Pipeline: Enrichment failed ({}), using raw transcript", e);
                raw_text.clone()
            }
            Err(_) => {
                log::warn!(
                    "Pipeline: Enrichment timed out after {:?}, using raw transcript",
                    timeout
                );
                raw_text.clone()
            }
        };

        // Stage 3: macro substitution. Pure and infallible; runs on
        // whichever text the previous stage produced.
        let expanded = apply_macros(&enriched_text, &snapshot.macros);
        if expanded != enriched_text {
            log::debug!("Pipeline: Macros rewrote the text");
        }
        stages_succeeded.insert(Stage::MacroSubstitution);

        // Stage 4: style detection and transform. Transform failure or
        // timeout falls back to the macro-expanded text.
        let mut final_text = expanded.clone();
        let mut style_applied = None;

        if let Some(shortcut) =
            detect_style_command(&expanded, &snapshot.style_shortcuts, &snapshot.lead_ins)
        {
            let clean = remove_style_command(&expanded, shortcut, &snapshot.lead_ins);
            log::info!("Pipeline: Applying style '{}'", shortcut.name);

            match tokio::time::timeout(
                timeout,
                self.transformer.transform(&clean, &shortcut.system_prompt),
            )
            .await
            {
                Ok(Ok(styled)) => {
                    stages_succeeded.insert(Stage::StyleTransform);
                    style_applied = Some(shortcut.id.clone());
                    final_text = styled;
                }
                Ok(Err(e)) => {
                    log::warn!(
                        "Pipeline: Style transform failed ({}), keeping pre-transform text",
                        e
                    );
                }
                Err(_) => {
                    log::warn!(
                        "Pipeline: Style transform timed out after {:?}, keeping pre-transform text",
                        timeout
                    );
                }
            }
        }

        log::info!("Pipeline: Complete, {} chars output", final_text.len());

        Ok(PipelineResult {
            raw_text,
            enriched_text,
            final_text,
            stages_succeeded,
            style_applied,
        })
    }

    /// Re-run enrichment and macro substitution on an existing transcript.
    ///
    /// Used to reprocess a history entry; style detection and transform are
    /// deliberately skipped, as the spoken command was already consumed by
    /// the original cycle. Infallible: enrichment degrades like in [`run`],
    /// and there is no transcription stage to abort.
    ///
    /// [`run`]: Pipeline::run
    pub async fn reprocess(&self, raw_text: &str, snapshot: &SettingsSnapshot) -> PipelineResult {
        let timeout = self.config.stage_timeout;
        let mut stages_succeeded = BTreeSet::new();
        stages_succeeded.insert(Stage::Transcribe);

        let options = EnrichOptions {
            self_correction_enabled: snapshot.self_correction_enabled,
        };
        let enriched_text = match tokio::time::timeout(
            timeout,
            self.enricher.enrich(raw_text, &options),
        )
        .await
        {
            Ok(Ok(enrichment)) => {
                stages_succeeded.insert(Stage::Enrich);
                enrichment.text
            }
            Ok(Err(e)) => {
                log::warn!("Pipeline: Reprocess enrichment failed ({}), using raw text", e);
                raw_text.to_string()
            }
            Err(_) => {
                log::warn!(
                    "Pipeline: Reprocess enrichment timed out after {:?}, using raw text",
                    timeout
                );
                raw_text.to_string()
            }
        };

        let final_text = apply_macros(&enriched_text, &snapshot.macros);
        stages_succeeded.insert(Stage::MacroSubstitution);

        PipelineResult {
            raw_text: raw_text.to_string(),
            enriched_text,
            final_text,
            stages_succeeded,
            style_applied: None,
        }
    }
}

/// Normalize STT output text.
///
/// Whisper-based APIs may emit a leading space as a tokenization artifact.
/// Only leading whitespace is trimmed, to avoid changing internal
/// formatting.
fn normalize_stt_text(text: String) -> String {
    match text.chars().next() {
        Some(c) if c.is_whitespace() => text.trim_start().to_string(),
        _ => text,
    }
}
