// Voice session tracking - join/switch/leave bookkeeping and durations.
//
// Sessions live in memory only. A member who is already in voice when the
// process starts has no session, so their switch/leave is silently skipped.

use super::voice_models::{
    LeaveReport, SessionQuality, SwitchReport, VoiceChannelRef, VoiceFlags, VoiceSession,
};
use chrono::{DateTime, NaiveDate};
use dashmap::DashMap;

/// Session length that fills the duration bar.
const FULL_BAR_MS: u64 = 2 * 60 * 60 * 1000;
const BAR_BLOCKS: usize = 10;

pub struct VoiceSessionTracker {
    // User ID -> open session
    sessions: DashMap<u64, VoiceSession>,
    // (User ID, UTC day) -> finished sessions that day
    daily_counts: DashMap<(u64, NaiveDate), u32>,
}

impl Default for VoiceSessionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl VoiceSessionTracker {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            daily_counts: DashMap::new(),
        }
    }

    /// Open a session. An existing session for the user is replaced.
    pub fn join(
        &self,
        user_id: u64,
        channel: VoiceChannelRef,
        flags: VoiceFlags,
        now_ms: i64,
    ) -> VoiceSession {
        let session = VoiceSession {
            session_id: format!("{}_{}", user_id, now_ms),
            user_id,
            channel_id: channel.id,
            channel_name: channel.name,
            join_timestamp_ms: now_ms,
            flags,
        };
        self.sessions.insert(user_id, session.clone());
        session
    }

    /// Move an open session to another channel, keeping the original join
    /// time. `None` when the user has no tracked session.
    pub fn switch(&self, user_id: u64, to: VoiceChannelRef, now_ms: i64) -> Option<SwitchReport> {
        let mut session = self.sessions.get_mut(&user_id)?;

        let from = VoiceChannelRef {
            id: session.channel_id,
            name: session.channel_name.clone(),
        };
        let elapsed_ms = elapsed(session.join_timestamp_ms, now_ms);

        session.channel_id = to.id;
        session.channel_name = to.name.clone();

        Some(SwitchReport {
            session_id: session.session_id.clone(),
            from,
            to,
            elapsed_ms,
        })
    }

    /// Close a session. `None` when the user has no tracked session.
    pub fn leave(&self, user_id: u64, now_ms: i64) -> Option<LeaveReport> {
        let (_, session) = self.sessions.remove(&user_id)?;
        let duration_ms = elapsed(session.join_timestamp_ms, now_ms);
        let sessions_today = self.bump_daily_count(user_id, now_ms);

        Some(LeaveReport {
            quality: SessionQuality::from_duration_ms(duration_ms),
            leave_timestamp_ms: now_ms,
            duration_ms,
            sessions_today,
            session,
        })
    }

    #[cfg(test)]
    pub fn session(&self, user_id: u64) -> Option<VoiceSession> {
        self.sessions.get(&user_id).map(|s| s.clone())
    }

    pub fn open_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Drop per-day counters for any day other than `today`.
    pub fn prune_daily_counts(&self, today: NaiveDate) -> usize {
        let before = self.daily_counts.len();
        self.daily_counts.retain(|(_, day), _| *day == today);
        before - self.daily_counts.len()
    }

    fn bump_daily_count(&self, user_id: u64, now_ms: i64) -> u32 {
        let day = DateTime::from_timestamp_millis(now_ms)
            .map(|dt| dt.date_naive())
            .unwrap_or(NaiveDate::MIN);
        let mut count = self.daily_counts.entry((user_id, day)).or_insert(0);
        *count += 1;
        *count
    }
}

/// Clock skew can make `now` earlier than the join; clamp to zero.
fn elapsed(from_ms: i64, to_ms: i64) -> u64 {
    to_ms.saturating_sub(from_ms).max(0) as u64
}

/// `1h 2m 3s`, `2m 3s` or `3s`.
pub fn format_duration_ms(duration_ms: u64) -> String {
    let total_secs = duration_ms / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Ten-block progress bar where two hours is a full bar.
pub fn duration_bar(duration_ms: u64) -> String {
    let pct = (duration_ms as f64 / FULL_BAR_MS as f64 * 100.0).min(100.0);
    let filled = ((pct / 10.0).round() as usize).min(BAR_BLOCKS);
    format!(
        "`{}{}` {:.1}%",
        "█".repeat(filled),
        "░".repeat(BAR_BLOCKS - filled),
        pct
    )
}
