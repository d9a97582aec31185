// Anti-spam service - core business logic for spam detection.
//
// This service handles:
// - Rapid messaging (sliding window per user)
// - Duplicate content streaks
// - Link spam (lifetime link counter)
// - Excessive caps
//
// NO Discord dependencies here - just pure domain logic.

use super::moderation_models::{MessageRecord, SpamSettings, SpamState, SpamVerdict};
use dashmap::DashMap;
use regex::Regex;
use std::ops::RangeInclusive;
use std::sync::LazyLock;
use thiserror::Error;

/// Letter count that must be exceeded before caps are checked at all.
const MIN_LETTERS_FOR_CAPS: usize = 10;

static LINK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)https?://\S+").expect("valid link regex"));

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpamError {
    #[error("{setting} must be between {min} and {max} (got {value})")]
    OutOfRange {
        setting: &'static str,
        min: u64,
        max: u64,
        value: u64,
    },
}

// ============================================================================
// DETECTOR
// ============================================================================

/// Per-user sliding-window spam classifier.
///
/// State is keyed by `(guild_id, user_id)` and mutated synchronously inside
/// `classify`, so a single call never observes a half-written window.
#[derive(Default)]
pub struct SpamDetector {
    states: DashMap<(u64, u64), SpamState>,
}

impl SpamDetector {
    pub fn new() -> Self {
        Self {
            states: DashMap::new(),
        }
    }

    /// Classify one message. Checks run in a fixed order and the first match
    /// wins; counters updated by earlier checks stay updated even when a later
    /// check fires.
    pub fn classify(
        &self,
        guild_id: u64,
        user_id: u64,
        content: &str,
        now_ms: i64,
        settings: &SpamSettings,
    ) -> SpamVerdict {
        if !settings.enabled {
            return SpamVerdict::Clean;
        }

        let mut state = self.states.entry((guild_id, user_id)).or_default();

        // Sliding window: keep only records strictly inside the window
        state
            .messages
            .retain(|record| now_ms - record.timestamp_ms < settings.time_window_ms);

        state.messages.push_back(MessageRecord {
            content: content.to_string(),
            timestamp_ms: now_ms,
        });

        if state.messages.len() > settings.max_messages {
            return SpamVerdict::Rapid {
                count: state.messages.len(),
            };
        }

        if content == state.last_message {
            state.duplicate_count += 1;
            if state.duplicate_count >= settings.duplicate_threshold {
                return SpamVerdict::Duplicate {
                    count: state.duplicate_count,
                };
            }
        } else {
            state.duplicate_count = 0;
            state.last_message = content.to_string();
        }

        if contains_link(content) {
            state.link_count += 1;
            if state.link_count >= settings.link_spam_threshold {
                return SpamVerdict::Links {
                    count: state.link_count,
                };
            }
        }

        if let Some(percentage) = caps_percentage(content) {
            if percentage > settings.caps_threshold_pct as f64 {
                return SpamVerdict::Caps {
                    percentage: percentage.round() as u32,
                };
            }
        }

        SpamVerdict::Clean
    }

    /// Forget everything about a user (called after a violation is handled).
    pub fn reset(&self, guild_id: u64, user_id: u64) {
        self.states.remove(&(guild_id, user_id));
    }

    /// Copy of the current state for a user, if any.
    #[cfg(test)]
    pub fn snapshot(&self, guild_id: u64, user_id: u64) -> Option<SpamState> {
        self.states.get(&(guild_id, user_id)).map(|s| s.clone())
    }

    pub fn tracked_users(&self) -> usize {
        self.states.len()
    }
}

fn contains_link(content: &str) -> bool {
    LINK_PATTERN.is_match(content)
}

/// Uppercase share of ASCII letters, or `None` when there are too few letters.
fn caps_percentage(content: &str) -> Option<f64> {
    let letters = content.chars().filter(|c| c.is_ascii_alphabetic()).count();
    if letters <= MIN_LETTERS_FOR_CAPS {
        return None;
    }
    let upper = content.chars().filter(|c| c.is_ascii_uppercase()).count();
    Some(upper as f64 / letters as f64 * 100.0)
}

// ============================================================================
// SETTINGS REGISTRY
// ============================================================================

/// Per-guild anti-spam settings. In-memory only; a restart returns every
/// guild to the defaults.
#[derive(Default)]
pub struct SpamSettingsRegistry {
    settings: DashMap<u64, SpamSettings>,
}

impl SpamSettingsRegistry {
    pub fn new() -> Self {
        Self {
            settings: DashMap::new(),
        }
    }

    /// Settings for a guild (defaults when never configured).
    pub fn get(&self, guild_id: u64) -> SpamSettings {
        self.settings
            .get(&guild_id)
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    fn update(&self, guild_id: u64, apply: impl FnOnce(&mut SpamSettings)) -> SpamSettings {
        let mut entry = self.settings.entry(guild_id).or_default();
        apply(entry.value_mut());
        entry.value().clone()
    }

    pub fn set_enabled(&self, guild_id: u64, enabled: bool) -> SpamSettings {
        self.update(guild_id, |s| s.enabled = enabled)
    }

    pub fn toggle(&self, guild_id: u64) -> SpamSettings {
        self.update(guild_id, |s| s.enabled = !s.enabled)
    }

    pub fn set_max_messages(&self, guild_id: u64, value: u64) -> Result<SpamSettings, SpamError> {
        check_range("Max messages", 2..=20, value)?;
        Ok(self.update(guild_id, |s| s.max_messages = value as usize))
    }

    pub fn set_time_window_secs(
        &self,
        guild_id: u64,
        value: u64,
    ) -> Result<SpamSettings, SpamError> {
        check_range("Time window (seconds)", 3..=30, value)?;
        Ok(self.update(guild_id, |s| s.time_window_ms = value as i64 * 1000))
    }

    pub fn set_duplicate_threshold(
        &self,
        guild_id: u64,
        value: u64,
    ) -> Result<SpamSettings, SpamError> {
        check_range("Duplicate threshold", 2..=10, value)?;
        Ok(self.update(guild_id, |s| s.duplicate_threshold = value as u32))
    }

    pub fn set_link_threshold(
        &self,
        guild_id: u64,
        value: u64,
    ) -> Result<SpamSettings, SpamError> {
        check_range("Link spam threshold", 2..=10, value)?;
        Ok(self.update(guild_id, |s| s.link_spam_threshold = value as u32))
    }

    pub fn set_caps_threshold(
        &self,
        guild_id: u64,
        value: u64,
    ) -> Result<SpamSettings, SpamError> {
        check_range("Caps threshold (%)", 40..=90, value)?;
        Ok(self.update(guild_id, |s| s.caps_threshold_pct = value as u32))
    }

    pub fn set_mute_minutes(&self, guild_id: u64, value: u64) -> Result<SpamSettings, SpamError> {
        check_range("Mute duration (minutes)", 1..=60, value)?;
        Ok(self.update(guild_id, |s| s.mute_duration_ms = value * 60_000))
    }

    pub fn reset(&self, guild_id: u64) -> SpamSettings {
        self.settings.remove(&guild_id);
        SpamSettings::default()
    }
}

fn check_range(
    setting: &'static str,
    range: RangeInclusive<u64>,
    value: u64,
) -> Result<(), SpamError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(SpamError::OutOfRange {
            setting,
            min: *range.start(),
            max: *range.end(),
            value,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const GUILD: u64 = 456;
    const USER: u64 = 123;

    fn lenient() -> SpamSettings {
        // Only the check under test should be able to fire
        SpamSettings {
            max_messages: 100,
            duplicate_threshold: 100,
            link_spam_threshold: 100,
            caps_threshold_pct: 100,
            ..Default::default()
        }
    }

    #[test]
    fn test_normal_message_is_clean() {
        let detector = SpamDetector::new();
        let verdict = detector.classify(GUILD, USER, "Hello world!", 0, &SpamSettings::default());
        assert_eq!(verdict, SpamVerdict::Clean);
    }

    #[test]
    fn test_rapid_fires_on_message_after_max() {
        let detector = SpamDetector::new();
        let settings = SpamSettings::default();

        for i in 0..3 {
            let verdict =
                detector.classify(GUILD, USER, &format!("message {}", i), i * 1000, &settings);
            assert_eq!(verdict, SpamVerdict::Clean, "message {} should be clean", i);
        }

        let verdict = detector.classify(GUILD, USER, "one too many", 4000, &settings);
        assert_eq!(verdict, SpamVerdict::Rapid { count: 4 });
    }

    #[test]
    fn test_window_expiry_drops_old_messages() {
        let detector = SpamDetector::new();
        let settings = SpamSettings::default();

        for i in 0..3 {
            detector.classify(GUILD, USER, &format!("early {}", i), i, &settings);
        }

        // Exactly one window later the early messages no longer count
        let verdict = detector.classify(GUILD, USER, "later", 5_002, &settings);
        assert_eq!(verdict, SpamVerdict::Clean);
        let state = detector.snapshot(GUILD, USER).unwrap();
        assert_eq!(state.messages.len(), 1);
    }

    #[test]
    fn test_duplicate_streak_counts_and_resets() {
        let detector = SpamDetector::new();
        let settings = lenient();

        detector.classify(GUILD, USER, "same", 0, &settings);
        assert_eq!(detector.snapshot(GUILD, USER).unwrap().duplicate_count, 0);

        detector.classify(GUILD, USER, "same", 10_000, &settings);
        assert_eq!(detector.snapshot(GUILD, USER).unwrap().duplicate_count, 1);

        detector.classify(GUILD, USER, "same", 20_000, &settings);
        assert_eq!(detector.snapshot(GUILD, USER).unwrap().duplicate_count, 2);

        detector.classify(GUILD, USER, "different", 30_000, &settings);
        let state = detector.snapshot(GUILD, USER).unwrap();
        assert_eq!(state.duplicate_count, 0);
        assert_eq!(state.last_message, "different");
    }

    #[test]
    fn test_duplicate_fires_at_threshold() {
        let detector = SpamDetector::new();
        let settings = SpamSettings {
            max_messages: 100,
            ..Default::default()
        };

        assert_eq!(
            detector.classify(GUILD, USER, "buy now", 0, &settings),
            SpamVerdict::Clean
        );
        assert_eq!(
            detector.classify(GUILD, USER, "buy now", 1, &settings),
            SpamVerdict::Clean
        );
        assert_eq!(
            detector.classify(GUILD, USER, "buy now", 2, &settings),
            SpamVerdict::Duplicate { count: 2 }
        );
    }

    #[test]
    fn test_link_counter_survives_window_expiry() {
        let detector = SpamDetector::new();
        let settings = SpamSettings::default();

        let first = detector.classify(GUILD, USER, "see https://a.example", 0, &settings);
        assert_eq!(first, SpamVerdict::Clean);

        // Far outside the window, still counted
        let second = detector.classify(GUILD, USER, "and http://b.example", 600_000, &settings);
        assert_eq!(second, SpamVerdict::Links { count: 2 });
    }

    #[test]
    fn test_caps_threshold_is_strict() {
        let detector = SpamDetector::new();
        let settings = SpamSettings {
            caps_threshold_pct: 60,
            ..lenient()
        };

        // 6 of 10 letters... too few letters to check at all
        assert_eq!(
            detector.classify(GUILD, 1, "ABCDEFghij", 0, &settings),
            SpamVerdict::Clean
        );

        // 12 of 20 letters = exactly 60%: not flagged
        assert_eq!(
            detector.classify(GUILD, 2, "ABCDEFGHIJKLmnopqrst", 0, &settings),
            SpamVerdict::Clean
        );

        // 13 of 20 letters = 65%: flagged
        assert_eq!(
            detector.classify(GUILD, 3, "ABCDEFGHIJKLMnopqrst", 0, &settings),
            SpamVerdict::Caps { percentage: 65 }
        );
    }

    #[test]
    fn test_rapid_takes_precedence_over_duplicate() {
        let detector = SpamDetector::new();
        let settings = SpamSettings {
            max_messages: 2,
            duplicate_threshold: 2,
            ..Default::default()
        };

        detector.classify(GUILD, USER, "x", 0, &settings);
        detector.classify(GUILD, USER, "x", 1, &settings);
        let verdict = detector.classify(GUILD, USER, "x", 2, &settings);
        assert_eq!(verdict, SpamVerdict::Rapid { count: 3 });
    }

    #[test]
    fn test_disabled_detector_is_always_clean() {
        let detector = SpamDetector::new();
        let settings = SpamSettings {
            enabled: false,
            ..Default::default()
        };

        for i in 0..20 {
            let verdict = detector.classify(GUILD, USER, "SPAM SPAM SPAM SPAM", i, &settings);
            assert_eq!(verdict, SpamVerdict::Clean);
        }
        assert_eq!(detector.tracked_users(), 0);
    }

    #[test]
    fn test_reset_clears_state() {
        let detector = SpamDetector::new();
        let settings = SpamSettings::default();

        detector.classify(GUILD, USER, "https://a.example", 0, &settings);
        detector.reset(GUILD, USER);
        assert!(detector.snapshot(GUILD, USER).is_none());

        // Link counter starts from zero again
        let verdict = detector.classify(GUILD, USER, "https://b.example", 1, &settings);
        assert_eq!(verdict, SpamVerdict::Clean);
    }

    #[test]
    fn test_guilds_do_not_share_state() {
        let detector = SpamDetector::new();
        let settings = SpamSettings::default();

        for i in 0..3 {
            detector.classify(1, USER, &format!("guild one {}", i), i, &settings);
        }
        let verdict = detector.classify(2, USER, "guild two", 3, &settings);
        assert_eq!(verdict, SpamVerdict::Clean);
    }

    #[test]
    fn test_registry_validates_ranges() {
        let registry = SpamSettingsRegistry::new();

        assert!(registry.set_max_messages(GUILD, 1).is_err());
        assert_eq!(registry.get(GUILD).max_messages, 3);

        let updated = registry.set_max_messages(GUILD, 8).unwrap();
        assert_eq!(updated.max_messages, 8);
        assert_eq!(registry.get(GUILD).max_messages, 8);

        let updated = registry.set_time_window_secs(GUILD, 10).unwrap();
        assert_eq!(updated.time_window_ms, 10_000);

        let err = registry.set_caps_threshold(GUILD, 95).unwrap_err();
        assert_eq!(
            err,
            SpamError::OutOfRange {
                setting: "Caps threshold (%)",
                min: 40,
                max: 90,
                value: 95,
            }
        );
    }

    #[test]
    fn test_registry_is_per_guild() {
        let registry = SpamSettingsRegistry::new();

        registry.set_enabled(1, false);
        assert!(!registry.get(1).enabled);
        assert!(registry.get(2).enabled);

        assert!(registry.toggle(1).enabled);
        registry.set_mute_minutes(1, 10).unwrap();
        assert_eq!(registry.get(1).mute_duration_ms, 600_000);

        assert_eq!(registry.reset(1), SpamSettings::default());
        assert_eq!(registry.get(1), SpamSettings::default());
    }
}
