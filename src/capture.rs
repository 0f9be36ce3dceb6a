//! Audio capture capability contract.
//!
//! The engine never touches microphones or audio devices itself; the host
//! implements this trait over whatever platform primitive it uses. The
//! contract the session relies on: `stop_capture` reports the measured
//! duration so the minimum-duration discard policy can be applied before
//! the pipeline is entered.

use async_trait::async_trait;
use std::time::Duration;

/// One finished recording handed to the pipeline.
#[derive(Debug, Clone)]
pub struct AudioClip {
    /// Encoded audio bytes.
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`, e.g. "audio/wav" or "audio/webm".
    pub mime_type: String,
    /// Measured capture duration.
    pub duration: Duration,
}

impl AudioClip {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>, duration: Duration) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
            duration,
        }
    }
}

/// Errors surfaced by the capture collaborator.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Audio device error: {0}")]
    Device(String),

    #[error("Capture is already running")]
    AlreadyCapturing,

    #[error("No capture in progress")]
    NotCapturing,
}

/// Host-side audio capture.
///
/// One capture is active at a time; the session's state machine guarantees
/// start/stop are never interleaved across cycles.
#[async_trait]
pub trait AudioCapture: Send + Sync {
    /// Begin capturing audio.
    async fn start_capture(&self) -> Result<(), CaptureError>;

    /// Stop capturing and return the finished clip.
    async fn stop_capture(&self) -> Result<AudioClip, CaptureError>;
}
