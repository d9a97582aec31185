// Anti-spam commands for per-guild configuration.

use crate::core::moderation::SpamSettings;
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

/// Tunable anti-spam settings.
#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum SpamSetting {
    #[name = "maxmessages"]
    MaxMessages,
    #[name = "timewindow"]
    TimeWindow,
    #[name = "duplicates"]
    Duplicates,
    #[name = "links"]
    Links,
    #[name = "caps"]
    Caps,
    #[name = "mute"]
    Mute,
}

/// Anti-spam configuration commands.
#[poise::command(
    prefix_command,
    slash_command,
    subcommands("status", "enable", "disable", "toggle", "set", "reset"),
    required_permissions = "ADMINISTRATOR",
    default_member_permissions = "ADMINISTRATOR",
    guild_only
)]
pub async fn antispam(ctx: Context<'_>) -> Result<(), Error> {
    // A bare `!antispam` shows the current settings
    show_status(ctx).await
}

/// Show current anti-spam status and settings.
#[poise::command(prefix_command, slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn status(ctx: Context<'_>) -> Result<(), Error> {
    show_status(ctx).await
}

/// Enable anti-spam protection.
#[poise::command(prefix_command, slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn enable(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    ctx.data().spam_settings.set_enabled(guild_id.get(), true);
    ctx.say("✅ Anti-spam protection has been **enabled**.").await?;
    Ok(())
}

/// Disable anti-spam protection.
#[poise::command(prefix_command, slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn disable(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    ctx.data().spam_settings.set_enabled(guild_id.get(), false);
    ctx.say("❌ Anti-spam protection has been **disabled**.").await?;
    Ok(())
}

/// Flip anti-spam protection on or off.
#[poise::command(prefix_command, slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn toggle(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let settings = ctx.data().spam_settings.toggle(guild_id.get());
    ctx.say(format!(
        "Anti-spam protection is now **{}**.",
        if settings.enabled { "enabled" } else { "disabled" }
    ))
    .await?;
    Ok(())
}

/// Change one anti-spam threshold.
#[poise::command(prefix_command, slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn set(
    ctx: Context<'_>,
    #[description = "Setting to change"] setting: SpamSetting,
    #[description = "New value"] value: u64,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?.get();
    let registry = &ctx.data().spam_settings;

    let result = match setting {
        SpamSetting::MaxMessages => registry.set_max_messages(guild_id, value),
        SpamSetting::TimeWindow => registry.set_time_window_secs(guild_id, value),
        SpamSetting::Duplicates => registry.set_duplicate_threshold(guild_id, value),
        SpamSetting::Links => registry.set_link_threshold(guild_id, value),
        SpamSetting::Caps => registry.set_caps_threshold(guild_id, value),
        SpamSetting::Mute => registry.set_mute_minutes(guild_id, value),
    };

    match result {
        Ok(settings) => {
            tracing::info!(guild_id, ?setting, value, "Anti-spam setting changed");
            let embed = settings_embed(&settings).title("✅ Anti-Spam Updated");
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Err(e) => {
            ctx.say(format!("❌ {}", e)).await?;
        }
    }
    Ok(())
}

/// Restore the default anti-spam settings.
#[poise::command(prefix_command, slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn reset(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let settings = ctx.data().spam_settings.reset(guild_id.get());
    let embed = settings_embed(&settings).title("🔄 Anti-Spam Reset");
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

async fn show_status(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let settings = ctx.data().spam_settings.get(guild_id.get());

    let embed = settings_embed(&settings).title("🛡️ Anti-Spam Status");
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

fn settings_embed(settings: &SpamSettings) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .color(if settings.enabled { 0x00FF00 } else { 0xFF0000 })
        .field(
            "Status",
            if settings.enabled { "✅ Enabled" } else { "❌ Disabled" },
            false,
        )
        .field(
            "Rapid Messaging",
            format!(
                "More than {} messages / {} seconds",
                settings.max_messages,
                settings.time_window_ms / 1000
            ),
            true,
        )
        .field(
            "Duplicates",
            format!("{} repeats", settings.duplicate_threshold),
            true,
        )
        .field(
            "Links",
            format!("{} messages with links", settings.link_spam_threshold),
            true,
        )
        .field(
            "Caps",
            format!("Over {}% uppercase", settings.caps_threshold_pct),
            true,
        )
        .field(
            "Mute Duration",
            format!("{} minutes", settings.mute_duration_ms / 60_000),
            true,
        )
        .footer(serenity::CreateEmbedFooter::new(
            "Change with: antispam set <maxmessages|timewindow|duplicates|links|caps|mute> <value>",
        ))
}
