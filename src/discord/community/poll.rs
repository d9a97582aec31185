// Reaction polls with "show results" and "end poll" buttons. Buttons are
// routed here from the event handler, so they keep working after the
// command invocation is gone.

use crate::core::community::{ActivePoll, PollRequest, PollResults};
use crate::discord::moderation::{clip, EMBED_FIELD_LIMIT};
use crate::discord::{Context, Data, Error};
use poise::serenity_prelude as serenity;

const POLL_COLOR: u32 = 0x4834D4;
const ENDED_COLOR: u32 = 0x00FF00;
const USAGE: &str = "**Usage:** `!poll \"Question\" \"Option 1\" \"Option 2\" [time:5m] [anonymous] [multiple]`";

/// Create a reaction poll.
///
/// Quote the question and each option. Without options the poll is yes/no.
/// Add `time:10m` to close it automatically, `anonymous` to hide the author
/// and `multiple` to allow more than one choice.
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn poll(
    ctx: Context<'_>,
    #[description = "\"Question\" \"Option 1\" \"Option 2\" [time:5m] [anonymous] [multiple]"]
    #[rest]
    content: String,
) -> Result<(), Error> {
    let request = match PollRequest::parse(&content) {
        Ok(request) => request,
        Err(e) => {
            ctx.say(format!("❌ {}\n{}", e, USAGE)).await?;
            return Ok(());
        }
    };
    let choices = request.choices();
    let author = ctx.author();

    let mut embed = serenity::CreateEmbed::new()
        .title("📊 Poll")
        .description(format!("**{}**", request.question))
        .author(poll_author(request.anonymous, &author.tag(), Some(author.face())))
        .color(POLL_COLOR)
        .timestamp(serenity::Timestamp::now());

    let mut settings = Vec::new();
    if let Some(label) = request.duration_label() {
        settings.push(format!("⏰ Duration: {}", label));
    }
    if request.anonymous {
        settings.push("🕵️ Anonymous poll".to_string());
    }
    if request.multiple {
        settings.push("☑️ Multiple choice allowed".to_string());
    }
    if !settings.is_empty() {
        embed = embed.field("⚙️ Poll Settings", settings.join("\n"), false);
    }

    let mut instructions = if request.options.is_empty() {
        "React with ✅ for Yes or ❌ for No".to_string()
    } else {
        let options: Vec<String> = choices
            .iter()
            .map(|c| format!("{} {}", c.emoji, c.label))
            .collect();
        embed = embed.field(
            "📋 Options",
            clip(&options.join("\n"), EMBED_FIELD_LIMIT),
            false,
        );
        "React with the number emoji to vote for your choice".to_string()
    };
    if request.multiple && !request.options.is_empty() {
        instructions.push_str(" (multiple selections allowed)");
    }
    embed = embed.field("📝 How to Vote", instructions, false);

    if let Some(duration) = request.duration {
        let ends = chrono::Utc::now() + chrono::Duration::from_std(duration)?;
        embed = embed.field("⏱️ Poll Ends", format!("<t:{}:R>", ends.timestamp()), true);
    }

    let channel_id = ctx.channel_id();
    let mut message = channel_id
        .send_message(ctx.http(), serenity::CreateMessage::new().embed(embed))
        .await?;
    for choice in &choices {
        let reaction = serenity::ReactionType::Unicode(choice.emoji.to_string());
        if let Err(e) = message.react(ctx.http(), reaction).await {
            tracing::warn!("Failed to add poll reaction: {}", e);
        }
    }

    // Button IDs carry the message ID, so they can only be added once it exists
    message
        .edit(
            ctx.http(),
            serenity::EditMessage::new().components(poll_buttons(message.id)),
        )
        .await?;

    ctx.data().polls.register(
        message.id.get(),
        ActivePoll {
            question: request.question.clone(),
            choices,
            anonymous: request.anonymous,
            creator_id: author.id.get(),
            creator_name: author.tag(),
        },
    );

    match ctx {
        poise::Context::Prefix(prefix) => {
            if let Err(e) = prefix.msg.delete(ctx.http()).await {
                tracing::debug!("Could not delete poll command message: {}", e);
            }
        }
        poise::Context::Application(_) => {
            ctx.send(
                poise::CreateReply::default()
                    .content("📊 Poll created!")
                    .ephemeral(true),
            )
            .await?;
        }
    }

    tracing::info!(
        guild_id = ?ctx.guild_id(),
        message_id = message.id.get(),
        options = request.options.len(),
        timed = request.duration.is_some(),
        "Poll created"
    );

    if let Some(duration) = request.duration {
        let http = ctx.serenity_context().http.clone();
        let polls = ctx.data().polls.clone();
        let message_id = message.id;
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            // Already closed from the button
            let Some(poll) = polls.finish(message_id.get()) else {
                return;
            };
            if let Err(e) = close_on_timer(&http, channel_id, message_id, &poll).await {
                tracing::error!(message_id = message_id.get(), "Error ending poll: {}", e);
            }
        });
    }

    Ok(())
}

async fn close_on_timer(
    http: &serenity::Http,
    channel_id: serenity::ChannelId,
    message_id: serenity::MessageId,
    poll: &ActivePoll,
) -> Result<(), serenity::Error> {
    let message = channel_id.message(http, message_id).await?;
    let results = PollResults::tally(&poll.choices, |emoji| votes_for(&message.reactions, emoji));
    let embed = results_embed(poll, &results, "📊 Poll Results", ENDED_COLOR)
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Total Votes: {} • Poll Ended",
            results.total
        )));

    channel_id
        .edit_message(
            http,
            message_id,
            serenity::EditMessage::new()
                .embed(embed)
                .components(Vec::new()),
        )
        .await?;
    tracing::info!(message_id = message_id.get(), votes = results.total, "Poll ended");
    Ok(())
}

/// Handle a click on a poll button. Clicks on other components are ignored.
pub async fn handle_poll_button(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    data: &Data,
) -> Result<(), serenity::Error> {
    let Some(button) = PollButton::parse(&component.data.custom_id) else {
        return Ok(());
    };

    let Some(poll) = data.polls.get(button.message_id()) else {
        return reply_ephemeral(ctx, component, "❌ Poll data not found or poll has already ended.")
            .await;
    };

    let reactions = &component.message.reactions;
    match button {
        PollButton::Results(_) => {
            let results = PollResults::tally(&poll.choices, |emoji| votes_for(reactions, emoji));
            let embed = results_embed(&poll, &results, "📊 Current Poll Results", POLL_COLOR)
                .footer(serenity::CreateEmbedFooter::new(format!(
                    "Total Votes: {} • Poll Active",
                    results.total
                )));
            component
                .create_response(
                    ctx,
                    serenity::CreateInteractionResponse::Message(
                        serenity::CreateInteractionResponseMessage::new()
                            .embed(embed)
                            .ephemeral(true),
                    ),
                )
                .await
        }
        PollButton::End(message_id) => {
            let is_admin = component
                .member
                .as_ref()
                .and_then(|m| m.permissions)
                .is_some_and(|p| p.administrator());
            if !poll.can_be_ended_by(component.user.id.get(), is_admin) {
                return reply_ephemeral(
                    ctx,
                    component,
                    "❌ Only the poll creator or administrators can end this poll.",
                )
                .await;
            }

            // Lost a race with the timer
            let Some(poll) = data.polls.finish(message_id) else {
                return reply_ephemeral(ctx, component, "❌ This poll has already ended.").await;
            };

            let results = PollResults::tally(&poll.choices, |emoji| votes_for(reactions, emoji));
            let embed = results_embed(&poll, &results, "📊 Poll Results", ENDED_COLOR).footer(
                serenity::CreateEmbedFooter::new(format!(
                    "Total Votes: {} • Poll Ended by {}",
                    results.total,
                    component.user.tag()
                )),
            );
            tracing::info!(message_id, votes = results.total, "Poll ended from button");
            component
                .create_response(
                    ctx,
                    serenity::CreateInteractionResponse::UpdateMessage(
                        serenity::CreateInteractionResponseMessage::new()
                            .embed(embed)
                            .components(Vec::new()),
                    ),
                )
                .await
        }
    }
}

async fn reply_ephemeral(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    content: &str,
) -> Result<(), serenity::Error> {
    component
        .create_response(
            ctx,
            serenity::CreateInteractionResponse::Message(
                serenity::CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(true),
            ),
        )
        .await
}

fn results_embed(
    poll: &ActivePoll,
    results: &PollResults,
    title: &str,
    color: u32,
) -> serenity::CreateEmbed {
    let summary = results
        .render()
        .map(|text| clip(&text, EMBED_FIELD_LIMIT))
        .unwrap_or_else(|| "No votes were cast.".to_string());
    serenity::CreateEmbed::new()
        .title(title)
        .description(format!("**{}**", poll.question))
        .author(poll_author(poll.anonymous, &poll.creator_name, None))
        .field("📈 Results", summary, false)
        .color(color)
        .timestamp(serenity::Timestamp::now())
}

fn poll_author(anonymous: bool, name: &str, icon: Option<String>) -> serenity::CreateEmbedAuthor {
    if anonymous {
        return serenity::CreateEmbedAuthor::new("Anonymous Poll");
    }
    let author = serenity::CreateEmbedAuthor::new(name);
    match icon {
        Some(url) => author.icon_url(url),
        None => author,
    }
}

fn poll_buttons(message_id: serenity::MessageId) -> Vec<serenity::CreateActionRow> {
    vec![serenity::CreateActionRow::Buttons(vec![
        serenity::CreateButton::new(format!("{}{}", PollButton::RESULTS_PREFIX, message_id))
            .label("📊 Show Results")
            .style(serenity::ButtonStyle::Primary),
        serenity::CreateButton::new(format!("{}{}", PollButton::END_PREFIX, message_id))
            .label("🔒 End Poll")
            .style(serenity::ButtonStyle::Danger),
    ])]
}

/// Human votes for `emoji`; the bot's own seed reaction is not a vote.
fn votes_for(reactions: &[serenity::MessageReaction], emoji: &str) -> u64 {
    reactions
        .iter()
        .find(|r| matches!(&r.reaction_type, serenity::ReactionType::Unicode(e) if e == emoji))
        .map(|r| r.count.saturating_sub(u64::from(r.me)))
        .unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollButton {
    Results(u64),
    End(u64),
}

impl PollButton {
    const RESULTS_PREFIX: &'static str = "poll_results_";
    const END_PREFIX: &'static str = "poll_end_";

    fn parse(custom_id: &str) -> Option<Self> {
        if let Some(id) = custom_id.strip_prefix(Self::RESULTS_PREFIX) {
            return id.parse().ok().map(Self::Results);
        }
        custom_id
            .strip_prefix(Self::END_PREFIX)?
            .parse()
            .ok()
            .map(Self::End)
    }

    fn message_id(self) -> u64 {
        match self {
            Self::Results(id) | Self::End(id) => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_ids_round_trip() {
        assert_eq!(
            PollButton::parse("poll_results_123456789012345678"),
            Some(PollButton::Results(123456789012345678))
        );
        assert_eq!(PollButton::parse("poll_end_42"), Some(PollButton::End(42)));
        assert_eq!(PollButton::parse("poll_end_42").map(|b| b.message_id()), Some(42));
    }

    #[test]
    fn test_foreign_button_ids_are_ignored() {
        assert_eq!(PollButton::parse("prev"), None);
        assert_eq!(PollButton::parse("poll_end_"), None);
        assert_eq!(PollButton::parse("poll_results_abc"), None);
        assert_eq!(PollButton::parse("help_moderation"), None);
    }
}
