//! Bounded dictation history ledger.
//!
//! Records the outcome of each completed cycle. The ledger is a strict FIFO
//! ring: at capacity, recording a new entry evicts the oldest. Entries are
//! immutable once recorded; persistence is the host's concern (via the
//! settings store), not the ledger's.

use crate::settings::MAX_HISTORY_ENTRIES;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

/// A single completed dictation cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    /// Raw transcript as returned by the speech-to-text service.
    pub original_text: String,
    /// Text after the enrichment stage (equals `original_text` when
    /// enrichment degraded).
    pub enriched_text: String,
    /// Text after macros and optional style transform; what was delivered.
    pub final_text: String,
}

impl HistoryEntry {
    pub fn new(original_text: String, enriched_text: String, final_text: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            original_text,
            enriched_text,
            final_text,
        }
    }
}

/// Bounded FIFO of completed cycles, newest first on read.
#[derive(Debug)]
pub struct HistoryLedger {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl HistoryLedger {
    /// Create a ledger with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(MAX_HISTORY_ENTRIES)
    }

    /// Create a ledger holding at most `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Record a completed cycle, evicting the oldest entry at capacity.
    pub fn record(&mut self, entry: HistoryEntry) {
        if self.entries.len() == self.capacity {
            let evicted = self.entries.pop_front();
            if let Some(evicted) = evicted {
                log::debug!("History: Evicted oldest entry {}", evicted.id);
            }
        }
        self.entries.push_back(entry);
    }

    /// All entries, newest first.
    pub fn entries(&self) -> Vec<&HistoryEntry> {
        self.entries.iter().rev().collect()
    }

    /// Look up an entry by id.
    pub fn get(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Most recently recorded entry.
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Replace the ledger contents with entries loaded from the host's
    /// store (oldest first). Excess entries beyond capacity are dropped
    /// from the oldest end.
    pub fn restore(&mut self, entries: Vec<HistoryEntry>) {
        self.entries.clear();
        for entry in entries {
            self.record(entry);
        }
    }
}

impl Default for HistoryLedger {
    fn default() -> Self {
        Self::new()
    }
}
