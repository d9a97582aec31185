// Runtime configuration read from the environment (and `.env` via dotenv).

use anyhow::{bail, Context as _, Result};
use chrono_tz::Tz;
use std::path::PathBuf;

pub struct BotConfig {
    pub discord_token: String,
    /// Where moderation actions are reported
    pub mod_log_channel_id: Option<u64>,
    /// Where voice join/switch/leave reports are posted
    pub voice_report_channel_id: Option<u64>,
    pub port: u16,
    pub data_dir: PathBuf,
    pub prefix: String,
    /// Zone whose midnight triggers the birthday check
    pub birthday_timezone: Tz,
}

impl BotConfig {
    pub fn from_env() -> Result<Self> {
        // Load environment variables from .env file (if it exists)
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let Some(discord_token) = get("DISCORD_TOKEN") else {
            bail!(
                "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token."
            );
        };

        let mod_log_channel_id = parse_channel_id("MOD_LOG_CHANNEL_ID", get("MOD_LOG_CHANNEL_ID"))?;
        let voice_report_channel_id = parse_channel_id(
            "TRACKTIMER_CHANNEL_ID",
            get("TRACKTIMER_CHANNEL_ID").or_else(|| get("tracktimer_channel_id")),
        )?;

        let port = match get("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("PORT must be a port number, got {raw:?}"))?,
            None => 3000,
        };

        let birthday_timezone = match get("BIRTHDAY_TIMEZONE") {
            Some(raw) => raw
                .parse::<Tz>()
                .map_err(|e| anyhow::anyhow!("Invalid BIRTHDAY_TIMEZONE {raw:?}: {e}"))?,
            None => Tz::UTC,
        };

        Ok(Self {
            discord_token,
            mod_log_channel_id,
            voice_report_channel_id,
            port,
            data_dir: PathBuf::from(get("DATA_DIR").unwrap_or_else(|| "data".to_string())),
            prefix: get("COMMAND_PREFIX").unwrap_or_else(|| "!".to_string()),
            birthday_timezone,
        })
    }

    pub fn warnings_path(&self) -> PathBuf {
        self.data_dir.join("warnings.json")
    }

    pub fn birthdays_path(&self) -> PathBuf {
        self.data_dir.join("birthday-settings.json")
    }
}

fn parse_channel_id(key: &str, raw: Option<String>) -> Result<Option<u64>> {
    raw.map(|raw| {
        raw.parse::<u64>()
            .with_context(|| format!("{key} must be a numeric channel id, got {raw:?}"))
    })
    .transpose()
}
