// Reaction polls - request parsing, the live poll registry and tallying.

use crate::core::moderation::{parse_duration_within, TimeoutParseError};
use dashmap::DashMap;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

/// Longest poll accepted.
pub const MAX_POLL_DURATION: Duration = Duration::from_secs(7 * 24 * 60 * 60);
pub const MAX_OPTIONS: usize = 10;

pub const NUMBER_EMOJIS: [&str; MAX_OPTIONS] = [
    "1️⃣", "2️⃣", "3️⃣", "4️⃣", "5️⃣", "6️⃣", "7️⃣", "8️⃣", "9️⃣", "🔟",
];

static TIME_FLAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)time:(\d+)([smhd])").expect("valid poll time regex"));
static ANONYMOUS_FLAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\banonymous\b").expect("valid anonymous regex"));
static MULTIPLE_FLAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bmultiple\b").expect("valid multiple regex"));
static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]+)""#).expect("valid quoted regex"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PollError {
    #[error("Please provide a question for the poll!")]
    MissingQuestion,
    #[error("Poll duration cannot exceed 7 days!")]
    TooLong,
    #[error("You can only have up to 10 options!")]
    TooManyOptions,
}

/// One votable answer and the reaction that counts for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollChoice {
    pub emoji: &'static str,
    pub label: String,
}

/// A parsed `poll` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollRequest {
    pub question: String,
    /// Empty for a yes/no poll
    pub options: Vec<String>,
    pub duration: Option<Duration>,
    pub anonymous: bool,
    pub multiple: bool,
}

impl PollRequest {
    /// Parse `"Question" "Option 1" "Option 2" [time:5m] [anonymous] [multiple]`.
    ///
    /// Without quoted options the whole text is the question and the poll is
    /// yes/no. `time:0s` means no time limit.
    pub fn parse(content: &str) -> Result<Self, PollError> {
        let duration = match TIME_FLAG.captures(content) {
            Some(caps) => {
                let flag = format!("{}{}", &caps[1], &caps[2]);
                match parse_duration_within(&flag, MAX_POLL_DURATION) {
                    Ok(duration) => Some(duration),
                    Err(TimeoutParseError::TooLong { .. }) => return Err(PollError::TooLong),
                    Err(TimeoutParseError::InvalidFormat) => None,
                }
            }
            None => None,
        };
        let anonymous = ANONYMOUS_FLAG.is_match(content);
        let multiple = MULTIPLE_FLAG.is_match(content);

        let cleaned = TIME_FLAG.replace_all(content, "");
        let cleaned = ANONYMOUS_FLAG.replace_all(&cleaned, "");
        let cleaned = MULTIPLE_FLAG.replace_all(&cleaned, "");
        let cleaned = cleaned.trim();

        let mut quoted = QUOTED
            .captures_iter(cleaned)
            .map(|caps| caps[1].to_string());
        let (question, options) = match quoted.next() {
            Some(question) => (question, quoted.collect::<Vec<_>>()),
            None => (cleaned.to_string(), Vec::new()),
        };

        if question.trim().is_empty() {
            return Err(PollError::MissingQuestion);
        }
        if options.len() > MAX_OPTIONS {
            return Err(PollError::TooManyOptions);
        }

        Ok(Self {
            question,
            options,
            duration,
            anonymous,
            multiple,
        })
    }

    pub fn choices(&self) -> Vec<PollChoice> {
        if self.options.is_empty() {
            return vec![
                PollChoice {
                    emoji: "✅",
                    label: "Yes".to_string(),
                },
                PollChoice {
                    emoji: "❌",
                    label: "No".to_string(),
                },
            ];
        }
        NUMBER_EMOJIS
            .iter()
            .zip(&self.options)
            .map(|(emoji, label)| PollChoice {
                emoji: *emoji,
                label: label.clone(),
            })
            .collect()
    }

    /// "5 minutes", "1 hour".
    pub fn duration_label(&self) -> Option<String> {
        let secs = self.duration?.as_secs();
        let (amount, unit) = if secs % 86_400 == 0 {
            (secs / 86_400, "day")
        } else if secs % 3600 == 0 {
            (secs / 3600, "hour")
        } else if secs % 60 == 0 {
            (secs / 60, "minute")
        } else {
            (secs, "second")
        };
        Some(format!(
            "{} {}{}",
            amount,
            unit,
            if amount == 1 { "" } else { "s" }
        ))
    }
}

/// A poll that can still be ended, keyed by its message ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivePoll {
    pub question: String,
    pub choices: Vec<PollChoice>,
    pub anonymous: bool,
    pub creator_id: u64,
    pub creator_name: String,
}

impl ActivePoll {
    /// Only the creator or an administrator may close a poll early.
    pub fn can_be_ended_by(&self, user_id: u64, is_administrator: bool) -> bool {
        is_administrator || user_id == self.creator_id
    }
}

/// Polls still accepting votes. Lives in memory only.
#[derive(Default)]
pub struct PollRegistry {
    polls: DashMap<u64, ActivePoll>,
}

impl PollRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, message_id: u64, poll: ActivePoll) {
        self.polls.insert(message_id, poll);
    }

    pub fn get(&self, message_id: u64) -> Option<ActivePoll> {
        self.polls.get(&message_id).map(|p| p.clone())
    }

    /// Take the poll out of the registry. Only the first caller gets it, so
    /// a timer and a button racing to close the same poll end it once.
    pub fn finish(&self, message_id: u64) -> Option<ActivePoll> {
        self.polls.remove(&message_id).map(|(_, poll)| poll)
    }

    pub fn active_count(&self) -> usize {
        self.polls.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TallyRow {
    pub emoji: &'static str,
    pub label: String,
    pub votes: u64,
}

/// Vote counts ordered from most to fewest votes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollResults {
    pub rows: Vec<TallyRow>,
    pub total: u64,
}

impl PollResults {
    /// `votes_for` returns the human votes for an emoji, without the bot's
    /// own seed reaction.
    pub fn tally(choices: &[PollChoice], votes_for: impl Fn(&str) -> u64) -> Self {
        let mut rows: Vec<TallyRow> = choices
            .iter()
            .map(|choice| TallyRow {
                emoji: choice.emoji,
                label: choice.label.clone(),
                votes: votes_for(choice.emoji),
            })
            .collect();
        // Stable: ties keep their option order
        rows.sort_by(|a, b| b.votes.cmp(&a.votes));
        let total = rows.iter().map(|r| r.votes).sum();
        Self { rows, total }
    }

    /// Medal, bar and percentage per row, or `None` when nobody voted.
    pub fn render(&self) -> Option<String> {
        if self.total == 0 {
            return None;
        }
        let max = self.rows.iter().map(|r| r.votes).max().unwrap_or(0).max(1);

        let mut text = String::new();
        for (i, row) in self.rows.iter().enumerate() {
            let medal = match i {
                0 => "🥇",
                1 => "🥈",
                2 => "🥉",
                _ => "▫️",
            };
            let filled = ((row.votes as f64 / max as f64) * 10.0).round() as usize;
            let percentage = row.votes as f64 / self.total as f64 * 100.0;
            text.push_str(&format!(
                "{} {} **{}**\n{}{} {} votes ({:.1}%)\n\n",
                medal,
                row.emoji,
                row.label,
                "█".repeat(filled),
                "░".repeat(10 - filled),
                row.votes,
                percentage
            ));
        }
        Some(text.trim_end().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_question_is_yes_no() {
        let poll = PollRequest::parse("Should we have a movie night?").unwrap();
        assert_eq!(poll.question, "Should we have a movie night?");
        assert!(poll.options.is_empty());
        assert_eq!(poll.duration, None);

        let emojis: Vec<&str> = poll.choices().iter().map(|c| c.emoji).collect();
        assert_eq!(emojis, vec!["✅", "❌"]);
    }

    #[test]
    fn test_quoted_options_and_flags() {
        let poll = PollRequest::parse(
            r#""Pick your hobbies" "Gaming" "Reading" "Sports" time:10m multiple Anonymous"#,
        )
        .unwrap();
        assert_eq!(poll.question, "Pick your hobbies");
        assert_eq!(poll.options, vec!["Gaming", "Reading", "Sports"]);
        assert_eq!(poll.duration, Some(Duration::from_secs(600)));
        assert!(poll.multiple);
        assert!(poll.anonymous);
        assert_eq!(poll.duration_label().as_deref(), Some("10 minutes"));

        let choices = poll.choices();
        assert_eq!(choices[2].emoji, "3️⃣");
        assert_eq!(choices[2].label, "Sports");
    }

    #[test]
    fn test_single_quoted_question_with_time() {
        let poll = PollRequest::parse(r#""Lunch now?" time:1h"#).unwrap();
        assert_eq!(poll.question, "Lunch now?");
        assert!(poll.options.is_empty());
        assert_eq!(poll.duration_label().as_deref(), Some("1 hour"));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(PollRequest::parse("   "), Err(PollError::MissingQuestion));
        assert_eq!(
            PollRequest::parse("time:5m anonymous"),
            Err(PollError::MissingQuestion)
        );
        assert_eq!(PollRequest::parse("Vote? time:8d"), Err(PollError::TooLong));

        let eleven: String = (1..=11).map(|i| format!(" \"o{}\"", i)).collect();
        assert_eq!(
            PollRequest::parse(&format!("\"Q\"{}", eleven)),
            Err(PollError::TooManyOptions)
        );
    }

    #[test]
    fn test_zero_time_means_no_limit() {
        let poll = PollRequest::parse("Vote? time:0m").unwrap();
        assert_eq!(poll.duration, None);
        assert_eq!(poll.question, "Vote?");
    }

    #[test]
    fn test_tally_orders_and_renders() {
        let poll = PollRequest::parse(r#""Color?" "Red" "Blue" "Green""#).unwrap();
        let results = PollResults::tally(&poll.choices(), |emoji| match emoji {
            "1️⃣" => 1,
            "2️⃣" => 3,
            _ => 0,
        });

        let labels: Vec<&str> = results.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Blue", "Red", "Green"]);
        assert_eq!(results.total, 4);

        let text = results.render().unwrap();
        assert!(text.starts_with("🥇 2️⃣ **Blue**\n██████████ 3 votes (75.0%)"));
        assert!(text.contains("███░░░░░░░ 1 votes (25.0%)"));
        assert!(text.contains("░░░░░░░░░░ 0 votes (0.0%)"));
    }

    #[test]
    fn test_no_votes_renders_nothing() {
        let poll = PollRequest::parse("Yes or no?").unwrap();
        let results = PollResults::tally(&poll.choices(), |_| 0);
        assert_eq!(results.total, 0);
        assert!(results.render().is_none());
    }

    #[test]
    fn test_registry_finishes_once() {
        let registry = PollRegistry::new();
        let poll = ActivePoll {
            question: "Q".to_string(),
            choices: Vec::new(),
            anonymous: false,
            creator_id: 10,
            creator_name: "host".to_string(),
        };
        registry.register(500, poll.clone());

        assert_eq!(registry.get(500), Some(poll.clone()));
        assert!(poll.can_be_ended_by(10, false));
        assert!(poll.can_be_ended_by(11, true));
        assert!(!poll.can_be_ended_by(11, false));

        assert_eq!(registry.finish(500), Some(poll));
        assert_eq!(registry.finish(500), None);
        assert_eq!(registry.active_count(), 0);
    }
}
