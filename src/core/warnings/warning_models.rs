use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Warnings at which the member is kicked automatically.
pub const AUTO_KICK_THRESHOLD: usize = 3;

/// A single moderator warning. The wire names match the `warnings.json`
/// document: `{ id, reason, moderator, timestamp }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    /// Creation time in epoch milliseconds
    pub id: i64,
    pub reason: String,
    /// Moderator tag at the time of the warning
    pub moderator: String,
    /// ISO-8601 creation time
    pub timestamp: String,
    /// Set when the automatic kick triggered by this warning failed
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub kick_failed: bool,
}

impl Warning {
    pub fn new(reason: impl Into<String>, moderator: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            id: at.timestamp_millis(),
            reason: reason.into(),
            moderator: moderator.into(),
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            kick_failed: false,
        }
    }
}

/// Result of adding a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarnOutcome {
    /// Total warnings for the member after this one
    pub count: usize,
    /// The caller should kick the member
    pub threshold_reached: bool,
}

/// One line of the guild-wide overview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarnedMember {
    pub user_id: u64,
    pub count: usize,
    pub latest_reason: String,
}
