//! External service capability traits and implementations.
//!
//! The pipeline talks to speech-to-text, text enrichment and style
//! transformation only through the traits in this module, so providers can
//! be swapped (or mocked in tests) without touching the orchestration
//! logic.

mod groq;
mod prompts;

pub use groq::GroqClient;
pub use prompts::{enrichment_system_prompt, ENRICHMENT_PROMPT_BASE, SELF_CORRECTION_ADDON};

use crate::capture::AudioClip;
use async_trait::async_trait;
use std::time::Duration;

/// Errors that can occur during speech-to-text operations.
#[derive(Debug, thiserror::Error)]
pub enum SttError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Audio processing error: {0}")]
    Audio(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timeout: transcription took too long")]
    Timeout,
}

/// Errors that can occur during LLM-backed operations (enrich, transform).
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("No API key configured for provider: {0}")]
    NoApiKey(String),
}

/// Options for the enrichment stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnrichOptions {
    /// Also resolve verbal self-corrections in the transcript.
    pub self_correction_enabled: bool,
}

/// Structured output of the enrichment stage.
///
/// Providers must return this shape or fail; a response that cannot be
/// decoded into it is an [`LlmError::InvalidResponse`], never a partial
/// success.
#[derive(Debug, Clone)]
pub struct Enrichment {
    /// Corrected transcript text.
    pub text: String,
    /// Number of spelling/grammar/punctuation corrections applied.
    pub corrections_applied: u32,
    /// Number of verbal self-corrections resolved.
    pub self_corrections_applied: u32,
}

/// Trait for speech-to-text providers.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe a captured audio clip to text.
    async fn transcribe(&self, audio: &AudioClip) -> Result<String, SttError>;

    /// Get the name of this provider.
    fn name(&self) -> &'static str;
}

/// Trait for transcript enrichment (spelling, grammar, punctuation,
/// optional self-correction resolution).
#[async_trait]
pub trait Enricher: Send + Sync {
    async fn enrich(&self, text: &str, options: &EnrichOptions) -> Result<Enrichment, LlmError>;

    fn name(&self) -> &'static str;
}

/// Trait for style transformation ("make this a LinkedIn post").
#[async_trait]
pub trait StyleTransformer: Send + Sync {
    /// Rewrite `text` according to `style_prompt` and return the result.
    async fn transform(&self, text: &str, style_prompt: &str) -> Result<String, LlmError>;

    fn name(&self) -> &'static str;
}
