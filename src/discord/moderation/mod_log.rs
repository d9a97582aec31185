use crate::discord::Data;
use poise::serenity_prelude::{self as serenity, CreateEmbed, CreateMessage};

/// Post a moderation embed to the configured mod-log channel, if any.
/// Failures are logged and swallowed.
pub async fn report(http: &serenity::Http, data: &Data, embed: CreateEmbed) {
    let Some(channel_id) = data.config.mod_log_channel_id else {
        return;
    };

    if let Err(e) = serenity::ChannelId::new(channel_id)
        .send_message(http, CreateMessage::new().embed(embed))
        .await
    {
        tracing::warn!("Failed to send mod log to channel {}: {}", channel_id, e);
    }
}
