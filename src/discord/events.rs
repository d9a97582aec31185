use crate::discord::community::poll::handle_poll_button;
use crate::discord::moderation::spam_handler::handle_message_for_spam;
use crate::discord::voice::voice_events;
use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;

/// Event handler for non-command Discord events.
pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            tracing::info!(
                user = %data_about_bot.user.name,
                guilds = data_about_bot.guilds.len(),
                "Bot is ready"
            );
            ctx.set_presence(
                Some(serenity::ActivityData::watching("over the server")),
                serenity::OnlineStatus::Online,
            );
        }
        serenity::FullEvent::Message { new_message } => {
            if handle_message_for_spam(ctx, new_message, data).await {
                tracing::debug!(message_id = new_message.id.get(), "Message removed as spam");
            }
        }
        serenity::FullEvent::VoiceStateUpdate { old, new } => {
            if let Err(e) =
                voice_events::handle_voice_state_update(ctx, data, old.as_ref(), new).await
            {
                tracing::error!("Error handling voice state update: {}", e);
            }
        }
        serenity::FullEvent::InteractionCreate {
            interaction: serenity::Interaction::Component(component),
        } => {
            if let Err(e) = handle_poll_button(ctx, component, data).await {
                tracing::error!("Error handling poll button: {}", e);
            }
        }
        _ => {}
    }

    Ok(())
}
