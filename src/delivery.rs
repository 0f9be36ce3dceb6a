//! Text delivery capability contract.
//!
//! Delivery places the finalized text into whatever application currently
//! has input focus (typically clipboard + paste-keystroke injection). A
//! missing OS-level input permission is surfaced as its own error variant
//! so the host UI can prompt for it instead of showing a generic failure.

use async_trait::async_trait;

/// Errors surfaced by the delivery collaborator.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The OS denied synthetic input (e.g. missing accessibility
    /// permission on macOS). Not retried automatically.
    #[error("Input permission missing: {0}")]
    PermissionDenied(String),

    #[error("Delivery failed: {0}")]
    Failed(String),
}

/// Host-side delivery of finalized text to the focused application.
#[async_trait]
pub trait TextDelivery: Send + Sync {
    async fn deliver(&self, text: &str) -> Result<(), DeliveryError>;
}
