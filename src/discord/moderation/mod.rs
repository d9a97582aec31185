// Discord-side moderation: anti-spam enforcement and the moderator commands.

pub mod actions;
pub mod antispam;
pub mod mod_log;
pub mod spam_handler;
pub mod warnings;

use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

/// Longest value Discord accepts in an embed field.
pub(crate) const EMBED_FIELD_LIMIT: usize = 1024;
/// Longest audit log reason Discord accepts.
pub(crate) const AUDIT_REASON_LIMIT: usize = 512;

/// Cut `text` to at most `limit` bytes on a char boundary, marking the cut
/// with an ellipsis.
pub(crate) fn clip(text: &str, limit: usize) -> String {
    const ELLIPSIS: char = '…';

    if text.len() <= limit {
        return text.to_string();
    }
    let mut end = limit.saturating_sub(ELLIPSIS.len_utf8());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let mut clipped = text[..end].to_string();
    clipped.push(ELLIPSIS);
    clipped
}

/// Resolve the target as a guild member, replying and returning `None` when
/// the invoker targets themselves or the user is not in the server.
pub(crate) async fn resolve_target(
    ctx: Context<'_>,
    user: &serenity::User,
    self_target_msg: &str,
) -> Result<Option<serenity::Member>, Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    if user.id == ctx.author().id {
        ctx.say(format!("❌ {}", self_target_msg)).await?;
        return Ok(None);
    }

    match guild_id.member(ctx.serenity_context(), user.id).await {
        Ok(member) => Ok(Some(member)),
        Err(e) => {
            tracing::debug!(user_id = user.id.get(), "Member lookup failed: {}", e);
            ctx.say("❌ User not found in this server!").await?;
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_leaves_short_text_alone() {
        assert_eq!(clip("spamming links", EMBED_FIELD_LIMIT), "spamming links");
        assert_eq!(clip("", 10), "");
    }

    #[test]
    fn test_clip_respects_limit_and_char_boundaries() {
        let long = "a".repeat(2000);
        let clipped = clip(&long, EMBED_FIELD_LIMIT);
        assert_eq!(clipped.len(), EMBED_FIELD_LIMIT);
        assert!(clipped.ends_with('…'));

        // 'é' is two bytes; the cut must not land inside one
        let accented = "é".repeat(600);
        let clipped = clip(&accented, AUDIT_REASON_LIMIT);
        assert!(clipped.len() <= AUDIT_REASON_LIMIT);
        assert!(clipped.ends_with('…'));
        assert!(clipped.trim_end_matches('…').chars().all(|c| c == 'é'));
    }
}
