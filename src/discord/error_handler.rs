use crate::discord::{Data, Error};

/// Framework-wide error hook. Command failures get a short reply; anything
/// else falls through to poise's default handling.
pub async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            tracing::error!("Failed to start bot: {:?}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            tracing::error!("Error in command `{}`: {:?}", ctx.command().name, error);
            if let Err(e) = ctx
                .say("❌ An error occurred while running this command.")
                .await
            {
                tracing::error!("Failed to send error message: {}", e);
            }
        }
        poise::FrameworkError::MissingUserPermissions { ctx, .. } => {
            if let Err(e) = ctx
                .say("❌ You don't have permission to use this command!")
                .await
            {
                tracing::error!("Failed to send permission error: {}", e);
            }
        }
        poise::FrameworkError::MissingBotPermissions {
            missing_permissions,
            ctx,
            ..
        } => {
            if let Err(e) = ctx
                .say(format!("❌ I'm missing permissions: {}", missing_permissions))
                .await
            {
                tracing::error!("Failed to send bot permission error: {}", e);
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                tracing::error!("Error while handling error: {}", e)
            }
        }
    }
}
