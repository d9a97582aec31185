use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Days allowed per month. February always allows 29 - birthdays have no year.
pub const DAYS_IN_MONTH: [u32; 12] = [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})$").expect("valid birthday regex"));

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BirthdayDateError {
    #[error("Invalid format! Please use DD/MM format (e.g., 15/03 for March 15th)")]
    Format,
    #[error("Invalid day! Please enter a day between 1 and 31.")]
    Day,
    #[error("Invalid month! Please enter a month between 1 and 12.")]
    Month,
    #[error("Invalid date! Month {month} only has {max_days} days.")]
    DayOutOfMonth { month: u32, max_days: u32 },
}

/// A day/month pair with no year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BirthdayDate {
    // Field order gives month-then-day ordering
    pub month: u32,
    pub day: u32,
}

impl BirthdayDate {
    /// Parse `DD/MM`.
    pub fn parse(input: &str) -> Result<Self, BirthdayDateError> {
        let caps = DATE_PATTERN
            .captures(input.trim())
            .ok_or(BirthdayDateError::Format)?;
        let day: u32 = caps[1].parse().map_err(|_| BirthdayDateError::Format)?;
        let month: u32 = caps[2].parse().map_err(|_| BirthdayDateError::Format)?;
        Self::new(day, month)
    }

    pub fn new(day: u32, month: u32) -> Result<Self, BirthdayDateError> {
        if !(1..=31).contains(&day) {
            return Err(BirthdayDateError::Day);
        }
        if !(1..=12).contains(&month) {
            return Err(BirthdayDateError::Month);
        }
        let max_days = DAYS_IN_MONTH[(month - 1) as usize];
        if day > max_days {
            return Err(BirthdayDateError::DayOutOfMonth { month, max_days });
        }
        Ok(Self { month, day })
    }

    pub fn month_name(&self) -> &'static str {
        MONTH_NAMES[(self.month - 1) as usize]
    }
}

impl std::fmt::Display for BirthdayDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.day, self.month_name())
    }
}

/// A registered birthday as stored in `birthday-settings.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BirthdayEntry {
    pub day: u32,
    pub month: u32,
    pub username: String,
    pub display_name: String,
    pub added_at: i64,
}

impl BirthdayEntry {
    pub fn date(&self) -> BirthdayDate {
        BirthdayDate {
            month: self.month,
            day: self.day,
        }
    }
}

/// Per-guild birthday configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuildBirthdays {
    #[serde(
        serialize_with = "serialize_u64_as_string",
        deserialize_with = "deserialize_u64_from_string_or_number"
    )]
    pub channel_id: u64,
    #[serde(
        serialize_with = "serialize_u64_as_string",
        deserialize_with = "deserialize_u64_from_string_or_number"
    )]
    pub setup_by: u64,
    pub setup_at: i64,
    #[serde(default)]
    pub birthdays: HashMap<u64, BirthdayEntry>,
}

// Discord snowflakes are written as strings so the file stays readable by
// tools that parse numbers as doubles. Older files may hold plain numbers.
fn serialize_u64_as_string<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&value.to_string())
}

fn deserialize_u64_from_string_or_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Snowflake {
        Text(String),
        Number(u64),
    }

    match Snowflake::deserialize(deserializer)? {
        Snowflake::Text(text) => text.trim().parse::<u64>().map_err(D::Error::custom),
        Snowflake::Number(value) => Ok(value),
    }
}

/// Today's birthdays for one guild.
#[derive(Debug, Clone, PartialEq)]
pub struct Celebration {
    pub guild_id: u64,
    pub channel_id: u64,
    pub user_ids: Vec<u64>,
}
