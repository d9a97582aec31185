// Moderation domain models - data structures for the anti-spam system.
//
// These are pure domain types with no Discord dependencies.
// The Discord layer converts a verdict into delete/timeout/alert actions.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Outcome of checking a single message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpamVerdict {
    /// Not spam
    Clean,
    /// Too many messages inside the time window (window size after appending)
    Rapid { count: usize },
    /// Same content sent repeatedly (current duplicate streak)
    Duplicate { count: u32 },
    /// Messages carrying links (lifetime link counter)
    Links { count: u32 },
    /// Too many uppercase letters (rounded percentage)
    Caps { percentage: u32 },
}

impl SpamVerdict {
    pub fn is_spam(&self) -> bool {
        !matches!(self, SpamVerdict::Clean)
    }

    /// Short label used in audit-log reasons.
    pub fn kind(&self) -> &'static str {
        match self {
            SpamVerdict::Clean => "clean",
            SpamVerdict::Rapid { .. } => "rapid",
            SpamVerdict::Duplicate { .. } => "duplicate",
            SpamVerdict::Links { .. } => "links",
            SpamVerdict::Caps { .. } => "caps",
        }
    }

    /// Human-readable description of the violation.
    pub fn describe(&self, settings: &SpamSettings) -> String {
        match self {
            SpamVerdict::Clean => "No violation".to_string(),
            SpamVerdict::Rapid { count } => format!(
                "Rapid messaging ({} messages in {}s)",
                count,
                settings.time_window_ms / 1000
            ),
            SpamVerdict::Duplicate { count } => {
                format!("Duplicate messages ({} identical messages)", count)
            }
            SpamVerdict::Links { count } => format!("Link spam ({} links in short time)", count),
            SpamVerdict::Caps { percentage } => {
                format!("Excessive caps ({}% uppercase)", percentage)
            }
        }
    }
}

/// A record of a message kept inside the sliding window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    pub content: String,
    /// Unix epoch milliseconds
    pub timestamp_ms: i64,
}

/// Per-user detector state. Lives for the process lifetime and is dropped
/// wholesale when a violation fires.
#[derive(Debug, Clone, Default)]
pub struct SpamState {
    pub messages: VecDeque<MessageRecord>,
    pub last_message: String,
    pub duplicate_count: u32,
    /// Only reset on a violation, never by window expiry.
    pub link_count: u32,
}

/// Runtime-tunable anti-spam thresholds for one guild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpamSettings {
    pub enabled: bool,
    /// Window size above which the sender is flagged
    pub max_messages: usize,
    pub time_window_ms: i64,
    pub duplicate_threshold: u32,
    pub link_spam_threshold: u32,
    /// Percentage of uppercase letters that must be exceeded
    pub caps_threshold_pct: u32,
    pub mute_duration_ms: u64,
}

impl SpamSettings {
    pub fn mute_duration(&self) -> Duration {
        Duration::from_millis(self.mute_duration_ms)
    }
}

impl Default for SpamSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_messages: 3,           // 3 messages...
            time_window_ms: 5_000,     // ...in 5 seconds
            duplicate_threshold: 2,    // 2 repeats of the previous message
            link_spam_threshold: 2,    // 2 messages containing links
            caps_threshold_pct: 60,    // more than 60% uppercase
            mute_duration_ms: 300_000, // 5 minute timeout
        }
    }
}
