//! Configuration snapshot types shared between the host and the engine.
//!
//! The engine never owns live configuration: the host's settings store is the
//! source of truth, and the session holds a read-only [`SettingsSnapshot`]
//! that is replaced wholesale between cycles. Nothing in this module mutates
//! a macro or style shortcut after it has been loaded.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// DEFAULT ENGINE CONSTANTS - Single source of truth for engine timing knobs
// ============================================================================

/// Recordings shorter than this are discarded without entering the pipeline.
pub const MIN_RECORDING_DURATION_MS: u64 = 500;

/// How long the Error state is displayed before auto-resetting to Idle.
pub const ERROR_RESET_TIMEOUT_MS: u64 = 3000;

/// Maximum number of retained history entries.
pub const MAX_HISTORY_ENTRIES: usize = 10;

/// Per-stage timeout for external service calls.
pub const STAGE_TIMEOUT_SECS: u64 = 30;

// ============================================================================

/// A keyword shortcut expanded during dictation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Macro {
    pub id: String,
    /// Spoken phrase to match, e.g. "mein zoom link".
    pub keyword: String,
    /// Text substituted for the keyword, e.g. a meeting URL.
    pub replacement: String,
    pub enabled: bool,
}

impl Macro {
    pub fn new(keyword: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            keyword: keyword.into(),
            replacement: replacement.into(),
            enabled: true,
        }
    }
}

/// A spoken style command that rewrites the dictated text via an LLM.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StyleShortcut {
    pub id: String,
    pub name: String,
    /// Trigger variants for this style, in match-priority order.
    ///
    /// Must contain at least one non-empty phrase; enforced when the host
    /// edits shortcuts, not at match time.
    pub trigger_phrases: Vec<String>,
    /// System prompt sent to the style-transform service.
    pub system_prompt: String,
    pub enabled: bool,
}

/// One lead-in phrasing pattern combined with a trigger phrase to detect a
/// style command mid-sentence ("mach daraus einen linkedin post").
///
/// The list of templates is ordered configuration data, not hard-coded
/// branches; hosts can replace it per locale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeadInTemplate {
    /// Prefix placed before the trigger for detection, e.g. "mach daraus".
    pub detect_prefix: String,
    /// Article words that may appear between prefix and trigger when
    /// stripping ("mach daraus *einen* linkedin post"). Treated as literal
    /// words; the style engine escapes them itself.
    #[serde(default)]
    pub optional_articles: Vec<String>,
}

impl LeadInTemplate {
    pub fn new(detect_prefix: &str) -> Self {
        Self {
            detect_prefix: detect_prefix.to_string(),
            optional_articles: Vec::new(),
        }
    }

    pub fn with_articles(detect_prefix: &str, articles: &[&str]) -> Self {
        Self {
            detect_prefix: detect_prefix.to_string(),
            optional_articles: articles.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Read-only view of the configuration used for one dictation cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsSnapshot {
    pub macros: Vec<Macro>,
    pub style_shortcuts: Vec<StyleShortcut>,
    pub lead_ins: Vec<LeadInTemplate>,
    /// Whether the enrichment stage should also resolve verbal
    /// self-corrections ("an Peter, nein warte, an Maria").
    pub self_correction_enabled: bool,
}

impl Default for SettingsSnapshot {
    fn default() -> Self {
        Self {
            macros: default_macros(),
            style_shortcuts: default_style_shortcuts(),
            lead_ins: default_lead_ins(),
            self_correction_enabled: true,
        }
    }
}

/// Host-side settings and history persistence.
///
/// The engine treats everything read through this trait as already
/// validated. History entries are passed oldest first in both directions,
/// matching [`crate::history::HistoryLedger::restore`].
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn load(&self) -> Result<SettingsSnapshot, SettingsError>;
    async fn save(&self, snapshot: &SettingsSnapshot) -> Result<(), SettingsError>;

    async fn load_history(&self) -> Result<Vec<crate::history::HistoryEntry>, SettingsError>;
    async fn save_history(
        &self,
        entries: &[crate::history::HistoryEntry],
    ) -> Result<(), SettingsError>;
}

/// Errors surfaced by the settings store collaborator.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to read settings: {0}")]
    Read(String),

    #[error("Failed to write settings: {0}")]
    Write(String),
}

/// Seed macros for first use.
pub fn default_macros() -> Vec<Macro> {
    vec![
        Macro {
            id: "example-zoom".to_string(),
            keyword: "mein zoom link".to_string(),
            replacement: "https://zoom.us/j/DEINE-MEETING-ID".to_string(),
            enabled: true,
        },
        Macro {
            id: "example-email".to_string(),
            keyword: "meine email".to_string(),
            replacement: "deine@email.de".to_string(),
            enabled: true,
        },
    ]
}

/// Seed style shortcuts for first use.
///
/// The trigger lists include common transcription-error variants
/// ("linked in post", "linkdin post") so a slightly mangled transcript still
/// selects the intended style.
pub fn default_style_shortcuts() -> Vec<StyleShortcut> {
    vec![
        StyleShortcut {
            id: "linkedin-post".to_string(),
            name: "LinkedIn Post".to_string(),
            trigger_phrases: vec![
                "linkedin post".to_string(),
                "linkedin-post".to_string(),
                "für linkedin".to_string(),
                "linked in post".to_string(),
                "linked in".to_string(),
                "linkdin post".to_string(),
                "linkin post".to_string(),
            ],
            system_prompt: "Transform the following text into a professional LinkedIn post. \
                Start with an attention-grabbing first sentence, use short paragraphs, add \
                two or three fitting emojis, and end with a question or call to action. \
                Reply only with the transformed text."
                .to_string(),
            enabled: true,
        },
        StyleShortcut {
            id: "email".to_string(),
            name: "E-Mail".to_string(),
            trigger_phrases: vec![
                "e-mail".to_string(),
                "email".to_string(),
            ],
            system_prompt: "Transform the following text into a professional e-mail with a \
                fitting salutation and closing. Keep all important information. Reply only \
                with the transformed text."
                .to_string(),
            enabled: true,
        },
        StyleShortcut {
            id: "summary".to_string(),
            name: "Zusammenfassung".to_string(),
            trigger_phrases: vec![
                "zusammenfassung".to_string(),
                "zusammenfassen".to_string(),
                "fasse zusammen".to_string(),
                "summary".to_string(),
            ],
            system_prompt: "Summarize the following text in two to three concise sentences. \
                Reply only with the summary."
                .to_string(),
            enabled: true,
        },
        StyleShortcut {
            id: "bulletpoints".to_string(),
            name: "Bulletpoints".to_string(),
            trigger_phrases: vec![
                "bulletpoints".to_string(),
                "bullet points".to_string(),
                "als liste".to_string(),
                "stichpunkte".to_string(),
            ],
            system_prompt: "Restructure the following text as a bullet-point list with \
                short, concise points, one thought per point. Reply only with the list."
                .to_string(),
            enabled: true,
        },
    ]
}

/// The default lead-in vocabulary (German conversational phrasing).
///
/// Ordered most-specific first; the style engine relies on this order when
/// stripping commands.
pub fn default_lead_ins() -> Vec<LeadInTemplate> {
    vec![
        LeadInTemplate::with_articles("mach daraus", &["einen", "eine", "ein"]),
        LeadInTemplate::with_articles("mach das zu", &["einem", "einer"]),
        LeadInTemplate::new("strukturiere als"),
        LeadInTemplate::new("formatiere als"),
        LeadInTemplate::new("als"),
        LeadInTemplate::new("für"),
    ]
}
