// Giveaway command. The end timer lives in memory, so giveaways still
// running when the bot restarts are never drawn.

use crate::core::community::{pick_winners, Giveaway};
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;
use rand::rngs::StdRng;
use rand::SeedableRng;

const ENTRY_REACTION: char = '🎉';
const OPEN_COLOR: u32 = 0xFFA502;
const WON_COLOR: u32 = 0x00FF00;
const EMPTY_COLOR: u32 = 0xFF4757;

/// Start a giveaway. Members enter by reacting with 🎉.
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn giveaway(
    ctx: Context<'_>,
    #[description = "How long it runs, such as 30m, 2h or 1d"] duration: String,
    #[description = "Number of winners (1-20)"] winners: u32,
    #[description = "What is being given away"]
    #[rest]
    prize: String,
) -> Result<(), Error> {
    let giveaway = match Giveaway::parse(&duration, winners, &prize) {
        Ok(giveaway) => giveaway,
        Err(e) => {
            ctx.say(format!(
                "❌ {}\nUsage: `giveaway <time> <winners> <prize>` (e.g. `giveaway 1h 1 Discord Nitro`)",
                e
            ))
            .await?;
            return Ok(());
        }
    };

    let ends_at = chrono::Utc::now() + chrono::Duration::from_std(giveaway.duration)?;
    let ends = serenity::Timestamp::from_unix_timestamp(ends_at.timestamp())
        .map_err(|_| "Invalid giveaway end time")?;
    let host_id = ctx.author().id;

    let embed = serenity::CreateEmbed::new()
        .title("🎉 GIVEAWAY 🎉")
        .description(format!(
            "**{}**\n\nReact with 🎉 to enter!\n\n**Winners:** {}\n**Ends:** <t:{}:R>\n**Hosted by:** <@{}>",
            giveaway.prize,
            giveaway.winners,
            ends_at.timestamp(),
            host_id
        ))
        .color(OPEN_COLOR)
        .timestamp(ends);

    let channel_id = ctx.channel_id();
    let message = channel_id
        .send_message(ctx.http(), serenity::CreateMessage::new().embed(embed))
        .await?;
    if let Err(e) = message.react(ctx.http(), ENTRY_REACTION).await {
        tracing::warn!("Failed to add giveaway reaction: {}", e);
    }

    match ctx {
        poise::Context::Prefix(prefix) => {
            if let Err(e) = prefix.msg.delete(ctx.http()).await {
                tracing::debug!("Could not delete giveaway command message: {}", e);
            }
        }
        poise::Context::Application(_) => {
            ctx.send(
                poise::CreateReply::default()
                    .content("🎉 Giveaway started!")
                    .ephemeral(true),
            )
            .await?;
        }
    }

    tracing::info!(
        guild_id = ?ctx.guild_id(),
        message_id = message.id.get(),
        winners = giveaway.winners,
        duration_secs = giveaway.duration.as_secs(),
        "Giveaway started"
    );

    let http = ctx.serenity_context().http.clone();
    let message_id = message.id;
    tokio::spawn(async move {
        tokio::time::sleep(giveaway.duration).await;
        end_giveaway(&http, channel_id, message_id, host_id, &giveaway).await;
    });

    Ok(())
}

async fn end_giveaway(
    http: &serenity::Http,
    channel_id: serenity::ChannelId,
    message_id: serenity::MessageId,
    host_id: serenity::UserId,
    giveaway: &Giveaway,
) {
    let entrants = match collect_entrants(http, channel_id, message_id).await {
        Ok(entrants) => entrants,
        Err(e) => {
            tracing::error!(message_id = message_id.get(), "Error ending giveaway: {}", e);
            return;
        }
    };
    let winners = pick_winners(
        &entrants,
        host_id.get(),
        giveaway.winners,
        &mut StdRng::from_entropy(),
    );
    let mentions = winners
        .iter()
        .map(|id| format!("<@{}>", id))
        .collect::<Vec<_>>()
        .join(", ");

    let (winner_line, color) = if winners.is_empty() {
        ("No valid entries".to_string(), EMPTY_COLOR)
    } else {
        (mentions.clone(), WON_COLOR)
    };
    let ended = serenity::CreateEmbed::new()
        .title("🎉 GIVEAWAY ENDED 🎉")
        .description(format!(
            "**{}**\n\n**Winners:** {}\n**Hosted by:** <@{}>",
            giveaway.prize, winner_line, host_id
        ))
        .color(color)
        .timestamp(serenity::Timestamp::now());
    if let Err(e) = channel_id
        .edit_message(http, message_id, serenity::EditMessage::new().embed(ended))
        .await
    {
        tracing::error!(message_id = message_id.get(), "Failed to close giveaway: {}", e);
        return;
    }

    tracing::info!(
        message_id = message_id.get(),
        entrants = entrants.len(),
        winners = winners.len(),
        "Giveaway ended"
    );
    if winners.is_empty() {
        return;
    }

    let announcement = serenity::CreateEmbed::new()
        .title("🎉 Congratulations! 🎉")
        .description(format!("{} won **{}**!", mentions, giveaway.prize))
        .color(WON_COLOR)
        .timestamp(serenity::Timestamp::now());
    if let Err(e) = channel_id
        .send_message(http, serenity::CreateMessage::new().embed(announcement))
        .await
    {
        tracing::error!("Failed to announce giveaway winners: {}", e);
    }
}

/// Every non-bot user who reacted with 🎉, paging through the reaction list.
async fn collect_entrants(
    http: &serenity::Http,
    channel_id: serenity::ChannelId,
    message_id: serenity::MessageId,
) -> Result<Vec<u64>, serenity::Error> {
    const PAGE: u8 = 100;

    let mut entrants = Vec::new();
    let mut after: Option<serenity::UserId> = None;
    loop {
        let page = channel_id
            .reaction_users(http, message_id, ENTRY_REACTION, Some(PAGE), after)
            .await?;
        let full = page.len() == PAGE as usize;
        after = page.last().map(|user| user.id);
        entrants.extend(page.into_iter().filter(|u| !u.bot).map(|u| u.id.get()));
        if !full {
            return Ok(entrants);
        }
    }
}
