// Warning commands. The ledger decides when a kick is due; this file
// performs the kick and reports the outcome.

use crate::core::warnings::{Warning, WarningError, AUTO_KICK_THRESHOLD};
use crate::discord::moderation::{
    clip, mod_log, resolve_target, AUDIT_REASON_LIMIT, EMBED_FIELD_LIMIT,
};
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

const WARN_COLOR: u32 = 0xFF9500;
const KICK_COLOR: u32 = 0xFF4757;

/// Most recent warnings listed by `showwarnings @user`.
const RECENT_WARNINGS_SHOWN: usize = 5;
/// Reason preview length in the listing; leaves room for moderator and date.
const LISTED_REASON_LIMIT: usize = 800;
/// Reason preview length in the server overview.
const OVERVIEW_REASON_LIMIT: usize = 100;

/// Warn a member. Three warnings kick them automatically.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn warn(
    ctx: Context<'_>,
    #[description = "Member to warn"] user: serenity::User,
    #[description = "Reason for the warning"]
    #[rest]
    reason: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let Some(member) = resolve_target(ctx, &user, "You cannot warn yourself!").await? else {
        return Ok(());
    };

    let reason = reason.unwrap_or_else(|| "No reason provided".to_string());
    let moderator = ctx.author().tag();

    let outcome = ctx
        .data()
        .warnings
        .add_warning(guild_id.get(), user.id.get(), &reason, &moderator, chrono::Utc::now())
        .await?;
    let count_label = format!("{}/{}", outcome.count, AUTO_KICK_THRESHOLD);

    // DM is best-effort: closed DMs are common
    let mut dm = serenity::CreateEmbed::new()
        .title("⚠️ You have been warned!")
        .description(format!(
            "You have been warned in **{}**",
            guild_name(ctx, guild_id)
        ))
        .field("📝 Reason", clip(&reason, EMBED_FIELD_LIMIT), false)
        .field("👮 Moderator", &moderator, true)
        .field("⚠️ Warning Count", &count_label, true)
        .color(WARN_COLOR)
        .timestamp(serenity::Timestamp::now());
    if outcome.threshold_reached {
        dm = dm.field(
            "🚨 Action Taken",
            format!(
                "You have been automatically kicked for reaching {} warnings!",
                AUTO_KICK_THRESHOLD
            ),
            false,
        );
    }
    if let Err(e) = user
        .direct_message(ctx.http(), serenity::CreateMessage::new().embed(dm))
        .await
    {
        tracing::debug!(user_id = user.id.get(), "Could not DM warned user: {}", e);
    }

    let mut embed = serenity::CreateEmbed::new()
        .title("⚠️ User Warned")
        .description(format!("**{}** has been warned.", user.tag()))
        .field("👤 User", format!("{} ({})", user.tag(), user.id), true)
        .field("👮 Moderator", &moderator, true)
        .field("📝 Reason", clip(&reason, EMBED_FIELD_LIMIT), false)
        .field("⚠️ Warning Count", &count_label, true)
        .color(WARN_COLOR)
        .thumbnail(user.face())
        .timestamp(serenity::Timestamp::now());

    if outcome.threshold_reached {
        let kick_reason = clip(
            &format!(
                "Auto-kick: Reached {} warnings. Last warning by {}: {}",
                AUTO_KICK_THRESHOLD, moderator, reason
            ),
            AUDIT_REASON_LIMIT,
        );
        match member.kick_with_reason(ctx.serenity_context(), &kick_reason).await {
            Ok(()) => {
                tracing::info!(
                    guild_id = guild_id.get(),
                    user_id = user.id.get(),
                    "Member auto-kicked after reaching the warning threshold"
                );
                embed = embed
                    .field(
                        "🚨 Action Taken",
                        format!(
                            "User has been automatically kicked for reaching {} warnings!",
                            AUTO_KICK_THRESHOLD
                        ),
                        false,
                    )
                    .color(KICK_COLOR);
            }
            Err(e) => {
                tracing::error!("Error auto-kicking user: {}", e);
                if let Err(e) = ctx
                    .data()
                    .warnings
                    .record_kick_failure(guild_id.get(), user.id.get())
                    .await
                {
                    tracing::error!("Failed to flag warning after kick failure: {}", e);
                }
                embed = embed.field(
                    "❌ Auto-kick Failed",
                    "Could not kick user automatically.",
                    false,
                );
            }
        }
    }

    mod_log::report(ctx.http(), ctx.data(), embed.clone()).await;
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Remove a member's most recent warnings.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn removewarn(
    ctx: Context<'_>,
    #[description = "Member whose warnings to remove"] user: serenity::User,
    #[description = "How many warnings to remove (default: 1)"] amount: Option<usize>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let amount = amount.unwrap_or(1);

    match ctx
        .data()
        .warnings
        .remove_warnings(guild_id.get(), user.id.get(), amount)
        .await
    {
        Ok((removed, remaining)) => {
            let embed = serenity::CreateEmbed::new()
                .title("✅ Warnings Removed")
                .description(format!(
                    "Removed **{}** warning{} from **{}**.",
                    removed,
                    if removed == 1 { "" } else { "s" },
                    user.tag()
                ))
                .field(
                    "⚠️ Remaining Warnings",
                    format!("{}/{}", remaining, AUTO_KICK_THRESHOLD),
                    true,
                )
                .field("👮 Moderator", ctx.author().tag(), true)
                .color(0x2ED573)
                .timestamp(serenity::Timestamp::now());
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Err(e @ WarningError::NoWarnings) => {
            ctx.say(format!("❌ {}", e)).await?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Show warnings for a member, or every warned member when none is given.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn showwarnings(
    ctx: Context<'_>,
    #[description = "Member to inspect"] user: Option<serenity::User>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let embed = match user {
        Some(user) => {
            let warnings = ctx
                .data()
                .warnings
                .warnings_for(guild_id.get(), user.id.get())
                .await?;
            if warnings.is_empty() {
                ctx.say(format!("✅ **{}** has no warnings.", user.tag())).await?;
                return Ok(());
            }

            let mut embed = serenity::CreateEmbed::new()
                .title(format!("⚠️ Warnings for {}", user.tag()))
                .description(format!(
                    "**{}/{}** warnings",
                    warnings.len(),
                    AUTO_KICK_THRESHOLD
                ))
                .thumbnail(user.face())
                .color(WARN_COLOR);
            let (fields, hidden) = recent_warning_fields(&warnings);
            for (name, value) in fields {
                embed = embed.field(name, value, false);
            }
            if hidden > 0 {
                embed = embed.field(
                    "📋 Additional Info",
                    format!(
                        "This user has **{}** more warning{} not shown above.\n\
                         Showing the {} most recent warnings only.",
                        hidden,
                        if hidden == 1 { "" } else { "s" },
                        RECENT_WARNINGS_SHOWN
                    ),
                    false,
                );
            }
            embed
        }
        None => {
            let overview = ctx.data().warnings.guild_overview(guild_id.get()).await?;
            if overview.is_empty() {
                ctx.say("✅ No one in this server has warnings.").await?;
                return Ok(());
            }

            let lines: Vec<String> = overview
                .iter()
                .take(25)
                .map(|m| {
                    format!(
                        "<@{}> - **{}** warning{} (latest: {})",
                        m.user_id,
                        m.count,
                        if m.count == 1 { "" } else { "s" },
                        clip(&m.latest_reason, OVERVIEW_REASON_LIMIT)
                    )
                })
                .collect();

            serenity::CreateEmbed::new()
                .title("⚠️ Server Warnings")
                .description(lines.join("\n"))
                .footer(serenity::CreateEmbedFooter::new(format!(
                    "{} member(s) with warnings",
                    overview.len()
                )))
                .color(WARN_COLOR)
        }
    };

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

fn guild_name(ctx: Context<'_>, guild_id: serenity::GuildId) -> String {
    ctx.cache()
        .guild(guild_id)
        .map(|g| g.name.clone())
        .unwrap_or_else(|| "this server".to_string())
}

/// Embed fields for the most recent warnings, numbered by their position in
/// the full list, plus how many older warnings were left out.
fn recent_warning_fields(warnings: &[Warning]) -> (Vec<(String, String)>, usize) {
    let hidden = warnings.len().saturating_sub(RECENT_WARNINGS_SHOWN);
    let fields = warnings
        .iter()
        .enumerate()
        .skip(hidden)
        .map(|(i, warning)| {
            let mut value = format!(
                "**Reason:** {}\n**Moderator:** {}\n**Date:** {}",
                clip(&warning.reason, LISTED_REASON_LIMIT),
                warning.moderator,
                warning.timestamp
            );
            if warning.kick_failed {
                value.push_str("\n❌ Auto-kick failed");
            }
            (format!("Warning #{}", i + 1), clip(&value, EMBED_FIELD_LIMIT))
        })
        .collect();
    (fields, hidden)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn warning(reason: &str, minute: u32) -> Warning {
        Warning::new(
            reason,
            "mod#0001",
            Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap(),
        )
    }

    #[test]
    fn test_short_history_lists_everything() {
        let warnings = vec![warning("first", 0), warning("second", 1)];
        let (fields, hidden) = recent_warning_fields(&warnings);

        assert_eq!(hidden, 0);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].0, "Warning #1");
        assert!(fields[1].1.contains("**Reason:** second"));
    }

    #[test]
    fn test_long_history_shows_latest_five() {
        let warnings: Vec<Warning> = (0..30).map(|i| warning(&format!("r{}", i), i)).collect();
        let (fields, hidden) = recent_warning_fields(&warnings);

        assert_eq!(hidden, 25);
        assert_eq!(fields.len(), RECENT_WARNINGS_SHOWN);
        assert_eq!(fields[0].0, "Warning #26");
        assert_eq!(fields[4].0, "Warning #30");
        assert!(fields[4].1.contains("**Reason:** r29"));
    }

    #[test]
    fn test_huge_reason_fits_in_a_field() {
        let mut flagged = warning(&"x".repeat(5000), 0);
        flagged.kick_failed = true;
        let (fields, _) = recent_warning_fields(&[flagged]);

        assert!(fields[0].1.len() <= EMBED_FIELD_LIMIT);
        assert!(fields[0].1.ends_with("❌ Auto-kick failed"));
    }
}
