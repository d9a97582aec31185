// This is the entry point of the Discord bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (JSON files on disk)
// - `discord/` = Discord-specific adapters (commands, events)
// - `http/` = Liveness endpoints
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Start the background tasks

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
mod config;
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "http/health.rs"]
mod http;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::config::BotConfig;
use crate::core::birthdays::BirthdayService;
use crate::core::community::PollRegistry;
use crate::core::moderation::{SpamDetector, SpamSettingsRegistry};
use crate::core::voice::VoiceSessionTracker;
use crate::core::warnings::WarningLedger;
use crate::discord::birthdays::birthday_checker;
use crate::discord::Data;
use crate::infra::birthdays::JsonBirthdayStore;
use crate::infra::warnings::JsonWarningStore;
use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let started = Instant::now();
    let config = Arc::new(BotConfig::from_env()?);

    std::fs::create_dir_all(&config.data_dir).with_context(|| {
        format!(
            "Failed to create data directory {}",
            config.data_dir.display()
        )
    })?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // This is the "composition root" where we wire everything together.

    let warnings = Arc::new(WarningLedger::new(JsonWarningStore::new(
        config.warnings_path(),
    )));
    let birthdays = Arc::new(BirthdayService::new(JsonBirthdayStore::new(
        config.birthdays_path(),
    )));

    let data = Data {
        spam_detector: Arc::new(SpamDetector::new()),
        spam_settings: Arc::new(SpamSettingsRegistry::new()),
        warnings,
        voice: Arc::new(VoiceSessionTracker::new()),
        birthdays,
        polls: Arc::new(PollRegistry::new()),
        config: Arc::clone(&config),
    };

    if config.voice_report_channel_id.is_none() {
        tracing::warn!("TRACKTIMER_CHANNEL_ID is not set; voice sessions will not be reported");
    }

    // Liveness endpoints run alongside the gateway connection
    let port = config.port;
    tokio::spawn(async move {
        if let Err(e) = http::serve(port, started).await {
            tracing::error!("Health server stopped: {}", e);
        }
    });

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required to read message content
        | serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::GUILD_VOICE_STATES;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: discord::commands::all(),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(config.prefix.clone()),
                ..Default::default()
            },
            on_error: |error| Box::pin(discord::error_handler::on_error(error)),
            // Event handler for messages and voice updates
            event_handler: |ctx, event, framework, data| {
                Box::pin(discord::events::event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                // Register slash commands globally (can take up to an hour to propagate)
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                tracing::info!(
                    commands = framework.options().commands.len(),
                    "Commands registered"
                );

                birthday_checker::spawn_daily_tasks(
                    ctx.http.clone(),
                    Arc::clone(&data.birthdays),
                    Arc::clone(&data.voice),
                    Arc::clone(&data.spam_detector),
                    data.config.birthday_timezone,
                );

                Ok(data)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(&config.discord_token, intents)
        .framework(framework)
        .await
        .context("Error creating client")?;

    client.start().await.context("Error running bot")?;
    Ok(())
}
