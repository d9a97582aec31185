// One-shot moderator actions: kick, ban, timeout, untimeout and voice mute.
//
// Platform failures are logged and answered with a short reply; they never
// bubble up to the framework error handler.

use crate::core::moderation::parse_timeout;
use crate::discord::moderation::{
    clip, mod_log, resolve_target, AUDIT_REASON_LIMIT, EMBED_FIELD_LIMIT,
};
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

/// Kick a member from the server.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn kick(
    ctx: Context<'_>,
    #[description = "Member to kick"] user: serenity::User,
    #[description = "Reason for the kick"]
    #[rest]
    reason: Option<String>,
) -> Result<(), Error> {
    let Some(member) = resolve_target(ctx, &user, "You cannot kick yourself!").await? else {
        return Ok(());
    };
    let reason = reason.unwrap_or_else(|| "No reason provided".to_string());
    let audit_reason = clip(
        &format!("Kicked by {}: {}", ctx.author().tag(), reason),
        AUDIT_REASON_LIMIT,
    );

    if let Err(e) = member.kick_with_reason(ctx.serenity_context(), &audit_reason).await {
        tracing::error!(user_id = user.id.get(), "Error kicking user: {}", e);
        ctx.say("❌ An error occurred while trying to kick the user.").await?;
        return Ok(());
    }

    let embed = action_embed(ctx, &user, "👢 User Kicked", "has been kicked", 0xFF4757)
        .field("📝 Reason", clip(&reason, EMBED_FIELD_LIMIT), false);
    finish(ctx, embed).await
}

/// Ban a user from the server.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn ban(
    ctx: Context<'_>,
    #[description = "Member to ban"] user: serenity::User,
    #[description = "Reason for the ban"]
    #[rest]
    reason: Option<String>,
) -> Result<(), Error> {
    let Some(member) = resolve_target(ctx, &user, "You cannot ban yourself!").await? else {
        return Ok(());
    };
    let reason = reason.unwrap_or_else(|| "No reason provided".to_string());
    let audit_reason = clip(
        &format!("Banned by {}: {}", ctx.author().tag(), reason),
        AUDIT_REASON_LIMIT,
    );

    if let Err(e) = member
        .ban_with_reason(ctx.serenity_context(), 0, &audit_reason)
        .await
    {
        tracing::error!(user_id = user.id.get(), "Error banning user: {}", e);
        ctx.say("❌ An error occurred while trying to ban the user.").await?;
        return Ok(());
    }

    let embed = action_embed(ctx, &user, "🔨 User Banned", "has been banned", 0x8B0000)
        .field("📝 Reason", clip(&reason, EMBED_FIELD_LIMIT), false);
    finish(ctx, embed).await
}

/// Time a member out (format: 1s, 5m, 2h, 1d; at most 28 days).
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn timeout(
    ctx: Context<'_>,
    #[description = "Member to time out"] user: serenity::User,
    #[description = "Duration such as 30s, 5m, 2h or 1d"] duration: String,
    #[description = "Reason for the timeout"]
    #[rest]
    reason: Option<String>,
) -> Result<(), Error> {
    let length = match parse_timeout(&duration) {
        Ok(length) => length,
        Err(e) => {
            ctx.say(format!("❌ {}", e)).await?;
            return Ok(());
        }
    };

    let Some(mut member) = resolve_target(ctx, &user, "You cannot timeout yourself!").await? else {
        return Ok(());
    };
    let reason = reason.unwrap_or_else(|| "No reason provided".to_string());
    let audit_reason = clip(
        &format!("Timed out by {}: {}", ctx.author().tag(), reason),
        AUDIT_REASON_LIMIT,
    );

    let ends = chrono::Utc::now().timestamp() + length.as_secs() as i64;
    let until = serenity::Timestamp::from_unix_timestamp(ends)
        .map_err(|_| "Invalid timeout end time")?;

    if let Err(e) = member
        .edit(
            ctx.serenity_context(),
            serenity::EditMember::new()
                .disable_communication_until_datetime(until)
                .audit_log_reason(&audit_reason),
        )
        .await
    {
        tracing::error!(user_id = user.id.get(), "Error timing out user: {}", e);
        ctx.say("❌ I cannot timeout this user! They may have higher permissions than me.")
            .await?;
        return Ok(());
    }

    let embed = action_embed(ctx, &user, "⏰ User Timed Out", "has been timed out", 0xFF6B35)
        .field("⏱️ Duration", duration, true)
        .field("📝 Reason", clip(&reason, EMBED_FIELD_LIMIT), false)
        .field("⏰ Ends", format!("<t:{}:F>", ends), false);
    finish(ctx, embed).await
}

/// Lift a member's timeout.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    aliases("rtimeout"),
    required_permissions = "ADMINISTRATOR",
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn untimeout(
    ctx: Context<'_>,
    #[description = "Member whose timeout to remove"] user: serenity::User,
) -> Result<(), Error> {
    let Some(mut member) =
        resolve_target(ctx, &user, "You cannot remove your own timeout!").await?
    else {
        return Ok(());
    };

    let timed_out = member
        .communication_disabled_until
        .is_some_and(|until| until.unix_timestamp() > chrono::Utc::now().timestamp());
    if !timed_out {
        ctx.say("❌ This user is not currently timed out!").await?;
        return Ok(());
    }

    let audit_reason = format!("Timeout removed by {}", ctx.author().tag());
    if let Err(e) = member
        .edit(
            ctx.serenity_context(),
            serenity::EditMember::new()
                .enable_communication()
                .audit_log_reason(&audit_reason),
        )
        .await
    {
        tracing::error!(user_id = user.id.get(), "Error removing timeout: {}", e);
        ctx.say("❌ An error occurred while trying to remove the timeout.")
            .await?;
        return Ok(());
    }

    let embed = action_embed(ctx, &user, "✅ Timeout Removed", "is no longer timed out", 0x00FF00);
    finish(ctx, embed).await
}

/// Server-mute a member in voice.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    aliases("skot"),
    required_permissions = "ADMINISTRATOR",
    required_bot_permissions = "MUTE_MEMBERS",
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn mute(
    ctx: Context<'_>,
    #[description = "Member to mute in voice"] user: serenity::User,
) -> Result<(), Error> {
    set_voice_mute(ctx, user, true).await
}

/// Lift a member's voice server-mute.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    aliases("hder"),
    required_permissions = "ADMINISTRATOR",
    required_bot_permissions = "MUTE_MEMBERS",
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn unmute(
    ctx: Context<'_>,
    #[description = "Member to unmute in voice"] user: serenity::User,
) -> Result<(), Error> {
    set_voice_mute(ctx, user, false).await
}

async fn set_voice_mute(ctx: Context<'_>, user: serenity::User, mute: bool) -> Result<(), Error> {
    let self_target = if mute {
        "You cannot mute yourself!"
    } else {
        "You cannot unmute yourself!"
    };
    let Some(mut member) = resolve_target(ctx, &user, self_target).await? else {
        return Ok(());
    };

    // (channel name, server-muted) from the cached voice state
    let voice = ctx.guild().and_then(|guild| {
        let state = guild.voice_states.get(&user.id)?;
        let channel_id = state.channel_id?;
        let name = guild
            .channels
            .get(&channel_id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| format!("<#{}>", channel_id));
        Some((name, state.mute))
    });

    let muted = voice.as_ref().is_some_and(|(_, muted)| *muted);
    if let Some(blocker) = voice_mute_blocker(voice.is_some(), muted, mute) {
        ctx.say(format!("❌ {}", blocker)).await?;
        return Ok(());
    }
    let channel_name = voice.map(|(name, _)| name).unwrap_or_default();

    let audit_reason = format!(
        "{} by {}",
        if mute { "Muted" } else { "Unmuted" },
        ctx.author().tag()
    );
    if let Err(e) = member
        .edit(
            ctx.serenity_context(),
            serenity::EditMember::new()
                .mute(mute)
                .audit_log_reason(&audit_reason),
        )
        .await
    {
        tracing::error!(user_id = user.id.get(), mute, "Error changing voice mute: {}", e);
        ctx.say(format!(
            "❌ An error occurred while trying to {} the user.",
            if mute { "mute" } else { "unmute" }
        ))
        .await?;
        return Ok(());
    }

    let (title, verb, color) = if mute {
        ("🔇 User Muted", "has been muted in voice channels", 0xFF4757)
    } else {
        ("🔊 User Unmuted", "has been unmuted in voice channels", 0x00FF00)
    };
    let embed = action_embed(ctx, &user, title, verb, color)
        .field("🎵 Voice Channel", channel_name, true);
    finish(ctx, embed).await
}

/// Why a voice mute change cannot go ahead, if it cannot.
fn voice_mute_blocker(in_voice: bool, muted: bool, mute: bool) -> Option<&'static str> {
    if !in_voice {
        return Some("This user is not in a voice channel!");
    }
    match (mute, muted) {
        (true, true) => Some("This user is already muted!"),
        (false, false) => Some("This user is not muted!"),
        _ => None,
    }
}

fn action_embed(
    ctx: Context<'_>,
    user: &serenity::User,
    title: &str,
    verb: &str,
    color: u32,
) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title(title)
        .description(format!("**{}** {}.", user.tag(), verb))
        .field("👤 User", format!("{} ({})", user.tag(), user.id), true)
        .field("👮 Moderator", ctx.author().tag(), true)
        .color(color)
        .thumbnail(user.face())
        .timestamp(serenity::Timestamp::now())
}

async fn finish(ctx: Context<'_>, embed: serenity::CreateEmbed) -> Result<(), Error> {
    tracing::info!(
        guild_id = ?ctx.guild_id(),
        moderator = ctx.author().id.get(),
        command = %ctx.command().name,
        "Moderation action applied"
    );
    mod_log::report(ctx.http(), ctx.data(), embed.clone()).await;
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_mute_needs_a_voice_channel() {
        assert_eq!(
            voice_mute_blocker(false, false, true),
            Some("This user is not in a voice channel!")
        );
        assert_eq!(
            voice_mute_blocker(false, false, false),
            Some("This user is not in a voice channel!")
        );
    }

    #[test]
    fn test_voice_mute_state_must_change() {
        assert_eq!(voice_mute_blocker(true, false, true), None);
        assert_eq!(voice_mute_blocker(true, true, false), None);
        assert_eq!(
            voice_mute_blocker(true, true, true),
            Some("This user is already muted!")
        );
        assert_eq!(
            voice_mute_blocker(true, false, false),
            Some("This user is not muted!")
        );
    }
}
