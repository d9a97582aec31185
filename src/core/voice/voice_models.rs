// Voice session domain models.
//
// Pure types - the Discord layer turns reports into embeds.

/// Mute/deafen/stream flags captured on join. Informational only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoiceFlags {
    pub self_mute: bool,
    pub self_deaf: bool,
    pub server_mute: bool,
    pub server_deaf: bool,
    pub streaming: bool,
    pub video: bool,
}

impl VoiceFlags {
    pub fn muted(&self) -> bool {
        self.self_mute || self.server_mute
    }

    pub fn deafened(&self) -> bool {
        self.self_deaf || self.server_deaf
    }
}

/// A voice channel as seen by the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceChannelRef {
    pub id: u64,
    pub name: String,
}

/// An open voice session. At most one per user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceSession {
    pub session_id: String,
    pub user_id: u64,
    pub channel_id: u64,
    pub channel_name: String,
    /// Epoch milliseconds of the original join; survives channel switches
    pub join_timestamp_ms: i64,
    pub flags: VoiceFlags,
}

/// Transition derived from the before/after voice states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceTransition {
    Join,
    Leave,
    Switch,
    /// Mute/deafen change or no channel on either side
    None,
}

impl VoiceTransition {
    pub fn classify(old_channel: Option<u64>, new_channel: Option<u64>) -> Self {
        match (old_channel, new_channel) {
            (None, Some(_)) => VoiceTransition::Join,
            (Some(_), None) => VoiceTransition::Leave,
            (Some(old), Some(new)) if old != new => VoiceTransition::Switch,
            _ => VoiceTransition::None,
        }
    }
}

/// Coarse display bucket for a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionQuality {
    Long,
    Good,
    Short,
    Quick,
}

impl SessionQuality {
    pub fn from_duration_ms(duration_ms: u64) -> Self {
        const MINUTE: u64 = 60_000;
        if duration_ms > 60 * MINUTE {
            SessionQuality::Long
        } else if duration_ms > 30 * MINUTE {
            SessionQuality::Good
        } else if duration_ms > 5 * MINUTE {
            SessionQuality::Short
        } else {
            SessionQuality::Quick
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionQuality::Long => "🏆 Long Session",
            SessionQuality::Good => "⭐ Good Session",
            SessionQuality::Short => "👍 Short Session",
            SessionQuality::Quick => "⚡ Quick Visit",
        }
    }
}

/// Emitted when a tracked member moves to another channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchReport {
    pub session_id: String,
    pub from: VoiceChannelRef,
    pub to: VoiceChannelRef,
    /// Time since the original join
    pub elapsed_ms: u64,
}

/// Emitted when a tracked member leaves voice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveReport {
    pub session: VoiceSession,
    pub leave_timestamp_ms: i64,
    pub duration_ms: u64,
    pub quality: SessionQuality,
    /// Finished sessions for this member today, including this one
    pub sessions_today: u32,
}
