// Discord-specific spam handling - translates spam verdicts to Discord actions.

use crate::core::moderation::{SpamSettings, SpamVerdict};
use crate::discord::moderation::mod_log;
use crate::discord::Data;
use poise::serenity_prelude as serenity;
use std::time::Duration;

/// How long the public alert stays in the channel.
const ALERT_LIFETIME: Duration = Duration::from_secs(10);

/// Check a message for spam and enforce the verdict.
///
/// Returns `true` if the message was spam and was handled.
pub async fn handle_message_for_spam(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    data: &Data,
) -> bool {
    // Skip bots
    if msg.author.bot {
        return false;
    }

    // Only check guild messages
    let Some(guild_id) = msg.guild_id else {
        return false;
    };

    if is_administrator(ctx, msg, guild_id).await {
        return false;
    }

    let settings = data.spam_settings.get(guild_id.get());
    let verdict = data.spam_detector.classify(
        guild_id.get(),
        msg.author.id.get(),
        &msg.content,
        chrono::Utc::now().timestamp_millis(),
        &settings,
    );

    if !verdict.is_spam() {
        return false;
    }

    tracing::info!(
        guild_id = guild_id.get(),
        user_id = msg.author.id.get(),
        kind = verdict.kind(),
        "Spam detected"
    );

    enforce(ctx, msg, guild_id, data, &verdict, &settings).await;
    data.spam_detector.reset(guild_id.get(), msg.author.id.get());

    true
}

/// Members with Administrator are exempt. The roles come from the message
/// itself, so members missing from the cache are still recognised; only an
/// uncached guild counts as not exempt.
async fn is_administrator(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    guild_id: serenity::GuildId,
) -> bool {
    let roles = match msg.member.as_ref() {
        Some(member) => member.roles.clone(),
        None => match guild_id.member(ctx, msg.author.id).await {
            Ok(member) => member.roles,
            Err(e) => {
                tracing::warn!("Failed to fetch message author for permission check: {}", e);
                return false;
            }
        },
    };

    let Some(guild) = ctx.cache.guild(guild_id) else {
        return false;
    };
    let everyone = guild
        .roles
        .get(&serenity::RoleId::new(guild_id.get()))
        .map(|role| role.permissions)
        .unwrap_or_else(serenity::Permissions::empty);
    let granted = roles
        .iter()
        .filter_map(|role_id| guild.roles.get(role_id))
        .map(|role| role.permissions);

    holds_administrator(guild.owner_id == msg.author.id, everyone, granted)
}

fn holds_administrator(
    is_owner: bool,
    everyone: serenity::Permissions,
    granted: impl IntoIterator<Item = serenity::Permissions>,
) -> bool {
    is_owner || granted.into_iter().fold(everyone, |acc, p| acc | p).administrator()
}

/// Delete, time out, alert. Every step is independent; a failure is logged
/// and the next step still runs.
async fn enforce(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    guild_id: serenity::GuildId,
    data: &Data,
    verdict: &SpamVerdict,
    settings: &SpamSettings,
) {
    let reason = verdict.describe(settings);
    let audit_reason = format!("Anti-spam: {}", reason);
    let mute_minutes = settings.mute_duration_ms / 60_000;

    if let Err(e) = msg.delete(&ctx.http).await {
        tracing::warn!("Failed to delete spam message: {}", e);
    }

    let until = chrono::Utc::now().timestamp() + settings.mute_duration().as_secs() as i64;
    match serenity::Timestamp::from_unix_timestamp(until) {
        Ok(until) => {
            if let Err(e) = guild_id
                .edit_member(
                    &ctx.http,
                    msg.author.id,
                    serenity::EditMember::new()
                        .disable_communication_until_datetime(until)
                        .audit_log_reason(&audit_reason),
                )
                .await
            {
                tracing::error!("Failed to timeout user: {}", e);
            }
        }
        Err(e) => tracing::error!("Failed to create timeout timestamp: {}", e),
    }

    let alert = serenity::CreateEmbed::new()
        .title("🛡️ Anti-Spam Alert")
        .description(format!(
            "<@{}> has been muted for {} minutes.",
            msg.author.id, mute_minutes
        ))
        .field("Reason", &reason, false)
        .color(0xFF4444)
        .timestamp(serenity::Timestamp::now());

    match msg
        .channel_id
        .send_message(&ctx.http, serenity::CreateMessage::new().embed(alert))
        .await
    {
        Ok(sent) => {
            let http = ctx.http.clone();
            tokio::spawn(async move {
                tokio::time::sleep(ALERT_LIFETIME).await;
                if let Err(e) = sent.delete(&http).await {
                    tracing::debug!("Failed to remove spam alert: {}", e);
                }
            });
        }
        Err(e) => tracing::warn!("Failed to send spam alert: {}", e),
    }

    let log_embed = serenity::CreateEmbed::new()
        .title("🛡️ Spam Timeout")
        .color(0xFF4444)
        .field("User", format!("<@{}>", msg.author.id), true)
        .field("Channel", format!("<#{}>", msg.channel_id), true)
        .field("Duration", format!("{} minutes", mute_minutes), true)
        .field("Reason", reason, false)
        .timestamp(serenity::Timestamp::now());
    mod_log::report(&ctx.http, data, log_embed).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use self::serenity::Permissions;

    #[test]
    fn test_administrator_from_any_role() {
        let everyone = Permissions::SEND_MESSAGES;
        assert!(holds_administrator(
            false,
            everyone,
            [Permissions::MANAGE_MESSAGES, Permissions::ADMINISTRATOR]
        ));
        assert!(!holds_administrator(
            false,
            everyone,
            [Permissions::MANAGE_MESSAGES, Permissions::KICK_MEMBERS]
        ));
    }

    #[test]
    fn test_everyone_role_and_owner_count() {
        assert!(holds_administrator(false, Permissions::ADMINISTRATOR, []));
        assert!(holds_administrator(true, Permissions::empty(), []));
        assert!(!holds_administrator(false, Permissions::empty(), []));
    }
}
