// Birthday commands. Setup is admin-only; registering, removing and listing
// are open to every member.

use crate::core::birthdays::{BirthdayDate, BirthdayError, MONTH_NAMES};
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;
use std::collections::BTreeMap;

const BIRTHDAY_COLOR: u32 = 0xFF69B4;
const CHANNEL_NAME: &str = "🎂⪼・birthdays";

/// Create the birthday channel and enable birthday announcements.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn setupbirthdays(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    if let Some(existing) = ctx.data().birthdays.settings(guild_id.get()).await? {
        let channel = serenity::ChannelId::new(existing.channel_id);
        if channel.to_channel(ctx.serenity_context()).await.is_ok() {
            ctx.say(format!(
                "❌ Birthday system is already set up in <#{}>!",
                existing.channel_id
            ))
            .await?;
            return Ok(());
        }
        tracing::info!(
            guild_id = guild_id.get(),
            channel_id = existing.channel_id,
            "Birthday channel is gone, setting up a new one"
        );
    }

    let audit_reason = format!("Birthday system setup by {}", ctx.author().tag());
    let channel = guild_id
        .create_channel(
            ctx.http(),
            serenity::CreateChannel::new(CHANNEL_NAME)
                .kind(serenity::ChannelType::Text)
                .topic("Birthday celebrations and reminders! 🎉")
                .audit_log_reason(&audit_reason),
        )
        .await?;

    ctx.data()
        .birthdays
        .setup(
            guild_id.get(),
            channel.id.get(),
            ctx.author().id.get(),
            chrono::Utc::now().timestamp_millis(),
        )
        .await?;

    let welcome = serenity::CreateEmbed::new()
        .title("🎂 Birthday Reminder System")
        .description("Welcome to the birthday channel! Here's how to use it:")
        .field(
            "🎉 Add Your Birthday",
            "Use `!addbirthday DD/MM` to register your birthday\nExample: `!addbirthday 15/03` for March 15th",
            false,
        )
        .field("📅 View Birthdays", "Use `!birthdays` to see all upcoming birthdays", false)
        .field(
            "🗑️ Remove Birthday",
            "Use `!removebirthday` to remove your birthday from the list",
            false,
        )
        .color(BIRTHDAY_COLOR)
        .timestamp(serenity::Timestamp::now());
    if let Err(e) = channel
        .send_message(ctx.http(), serenity::CreateMessage::new().embed(welcome))
        .await
    {
        tracing::warn!("Failed to post birthday welcome message: {}", e);
    }

    let embed = serenity::CreateEmbed::new()
        .title("✅ Birthday System Setup Complete!")
        .description("Birthday reminder system has been successfully set up!")
        .field("📍 Channel Created", format!("<#{}>", channel.id), true)
        .field("👮 Setup by", ctx.author().tag(), true)
        .field(
            "🎯 Next Steps",
            "Users can now add their birthdays using `!addbirthday DD/MM`",
            false,
        )
        .color(0x00FF00)
        .timestamp(serenity::Timestamp::now());
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Register your birthday (DD/MM).
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn addbirthday(
    ctx: Context<'_>,
    #[description = "Your birthday as DD/MM, e.g. 15/03"] date: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let Some(date) = date else {
        ctx.say("❌ Please provide your birthday in DD/MM format (e.g., `!addbirthday 15/03`).")
            .await?;
        return Ok(());
    };

    let date = match BirthdayDate::parse(&date) {
        Ok(date) => date,
        Err(e) => {
            ctx.say(format!("❌ {}", e)).await?;
            return Ok(());
        }
    };

    let author = ctx.author();
    let display_name = ctx
        .author_member()
        .await
        .map(|m| m.display_name().to_string())
        .unwrap_or_else(|| author.name.clone());

    let previous = match ctx
        .data()
        .birthdays
        .add(
            guild_id.get(),
            author.id.get(),
            date,
            &author.name,
            &display_name,
            chrono::Utc::now().timestamp_millis(),
        )
        .await
    {
        Ok(previous) => previous,
        Err(e @ BirthdayError::NotSetup) => {
            ctx.say(format!("❌ {}", e)).await?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let mut embed = serenity::CreateEmbed::new()
        .title("🎉 Birthday Added Successfully!")
        .description(format!("Your birthday has been set to **{}**!", date))
        .field("👤 User", format!("<@{}>", author.id), true)
        .field("📅 Birthday", format!("{}/{}", date.day, date.month), true)
        .color(BIRTHDAY_COLOR)
        .timestamp(serenity::Timestamp::now());
    if let Some(previous) = previous {
        embed = embed
            .title("🎉 Birthday Updated!")
            .field("🔄 Previous", previous.date().to_string(), true);
    }

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Remove your birthday from the list.
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn removebirthday(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    match ctx
        .data()
        .birthdays
        .remove(guild_id.get(), ctx.author().id.get())
        .await
    {
        Ok(removed) => {
            let embed = serenity::CreateEmbed::new()
                .title("✅ Birthday Removed Successfully!")
                .description(format!(
                    "Your birthday (**{}**) has been removed from the system.",
                    removed.date()
                ))
                .color(0x00FF00)
                .timestamp(serenity::Timestamp::now());
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Err(e @ (BirthdayError::NotSetup | BirthdayError::NotRegistered)) => {
            ctx.say(format!("❌ {}", e)).await?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// View all registered birthdays in the server.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    aliases("bdays", "birthdaylist")
)]
pub async fn birthdays(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let entries = match ctx.data().birthdays.list_sorted(guild_id.get()).await {
        Ok(entries) => entries,
        Err(e @ BirthdayError::NotSetup) => {
            ctx.say(format!("❌ {}", e)).await?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if entries.is_empty() {
        let embed = serenity::CreateEmbed::new()
            .title("🎂 No Birthdays Registered")
            .description(
                "No one has registered their birthday yet!\n\nUse `!addbirthday DD/MM` to add your birthday.",
            )
            .color(0xFFA500);
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        return Ok(());
    }

    // Entries arrive sorted, so each month's lines stay in day order
    let mut by_month: BTreeMap<u32, Vec<String>> = BTreeMap::new();
    for (user_id, entry) in &entries {
        by_month
            .entry(entry.month)
            .or_default()
            .push(format!("**{}** - <@{}>", entry.day, user_id));
    }

    let mut embed = serenity::CreateEmbed::new()
        .title("🎂 Server Birthdays")
        .description("Here are all the registered birthdays in this server!")
        .color(BIRTHDAY_COLOR)
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Total: {} birthdays",
            entries.len()
        )));
    for (month, lines) in by_month {
        embed = embed.field(
            format!("📅 {}", month_label(month)),
            lines.join("\n"),
            false,
        );
    }

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

fn month_label(month: u32) -> &'static str {
    (month as usize)
        .checked_sub(1)
        .and_then(|i| MONTH_NAMES.get(i))
        .copied()
        .unwrap_or("Unknown month")
}
