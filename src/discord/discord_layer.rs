// Discord layer - commands and event handlers.
//
// Everything in here translates between serenity/poise types and the
// primitives the core services expect.

#[path = "birthdays/mod.rs"]
pub mod birthdays;

#[path = "community/mod.rs"]
pub mod community;

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "error_handler.rs"]
pub mod error_handler;

#[path = "events.rs"]
pub mod events;

#[path = "moderation/mod.rs"]
pub mod moderation;

#[path = "voice/mod.rs"]
pub mod voice;

use crate::config::BotConfig;
use crate::core::birthdays::BirthdayService;
use crate::core::community::PollRegistry;
use crate::core::moderation::{SpamDetector, SpamSettingsRegistry};
use crate::core::voice::VoiceSessionTracker;
use crate::core::warnings::WarningLedger;
use crate::infra::birthdays::JsonBirthdayStore;
use crate::infra::warnings::JsonWarningStore;
use std::sync::Arc;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Shared state handed to every command and event handler.
pub struct Data {
    pub spam_detector: Arc<SpamDetector>,
    pub spam_settings: Arc<SpamSettingsRegistry>,
    pub warnings: Arc<WarningLedger<JsonWarningStore>>,
    pub voice: Arc<VoiceSessionTracker>,
    pub birthdays: Arc<BirthdayService<JsonBirthdayStore>>,
    pub polls: Arc<PollRegistry>,
    pub config: Arc<BotConfig>,
}
