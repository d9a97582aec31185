// Daily midnight job: announce today's birthdays and drop stale per-day
// voice counters. Runs for the lifetime of the process; a restart simply
// schedules the next midnight again.

use crate::core::birthdays::{
    birthday_date_of, duration_until_next_midnight, BirthdayService, Celebration,
};
use crate::core::moderation::SpamDetector;
use crate::core::voice::VoiceSessionTracker;
use crate::infra::birthdays::JsonBirthdayStore;
use chrono_tz::Tz;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

const BIRTHDAY_COLOR: u32 = 0xFF69B4;
const REACTIONS: [char; 5] = ['🎉', '🎂', '🎈', '🎁', '❤'];

pub fn spawn_daily_tasks(
    http: Arc<serenity::Http>,
    birthdays: Arc<BirthdayService<JsonBirthdayStore>>,
    voice: Arc<VoiceSessionTracker>,
    spam: Arc<SpamDetector>,
    timezone: Tz,
) {
    tokio::spawn(async move {
        loop {
            let now = chrono::Utc::now().with_timezone(&timezone);
            let wait = duration_until_next_midnight(&now);
            tracing::info!(minutes = wait.num_minutes(), "Next birthday check scheduled");
            tokio::time::sleep(wait.to_std().unwrap_or_default()).await;

            let today = chrono::Utc::now().with_timezone(&timezone);
            let date = birthday_date_of(&today);
            tracing::info!(%date, "Running daily birthday check");

            match birthdays.celebrants(date).await {
                Ok(celebrations) => {
                    for celebration in celebrations {
                        announce(&http, &celebration, &date.to_string()).await;
                    }
                }
                Err(e) => tracing::error!("Birthday check failed: {}", e),
            }

            let pruned = voice.prune_daily_counts(chrono::Utc::now().date_naive());
            tracing::info!(
                pruned,
                open_voice_sessions = voice.open_sessions(),
                spam_tracked_users = spam.tracked_users(),
                "Daily housekeeping done"
            );
        }
    });
}

async fn announce(http: &serenity::Http, celebration: &Celebration, date_label: &str) {
    let guild_id = serenity::GuildId::new(celebration.guild_id);
    let channel_id = serenity::ChannelId::new(celebration.channel_id);

    for user_id in &celebration.user_ids {
        // Members who left the server are skipped
        let member = match guild_id.member(http, serenity::UserId::new(*user_id)).await {
            Ok(member) => member,
            Err(e) => {
                tracing::debug!(
                    guild_id = celebration.guild_id,
                    user_id,
                    "Skipping birthday: {}",
                    e
                );
                continue;
            }
        };
        let name = member.display_name().to_string();

        let embed = serenity::CreateEmbed::new()
            .title("🎉 Happy Birthday! 🎂")
            .description(format!(
                "Today is **{}**'s birthday!\n\nLet's all wish them a wonderful day! 🎈",
                name
            ))
            .field("🎂 Birthday Person", format!("<@{}>", user_id), true)
            .field("📅 Date", date_label, true)
            .field(
                "🎁 Birthday Wishes",
                "React with 🎉 to wish them a happy birthday!",
                false,
            )
            .color(BIRTHDAY_COLOR)
            .thumbnail(member.face())
            .timestamp(serenity::Timestamp::now());

        let message = serenity::CreateMessage::new()
            .content(format!("🎉 @everyone It's {}'s birthday today! 🎂", name))
            .embed(embed);

        match channel_id.send_message(http, message).await {
            Ok(sent) => {
                for reaction in REACTIONS {
                    if let Err(e) = sent.react(http, reaction).await {
                        tracing::debug!("Failed to add birthday reaction: {}", e);
                    }
                }
                tracing::info!(
                    guild_id = celebration.guild_id,
                    user_id,
                    "Sent birthday message"
                );
            }
            Err(e) => {
                tracing::error!(
                    guild_id = celebration.guild_id,
                    user_id,
                    "Error sending birthday message: {}",
                    e
                );
                continue;
            }
        }

        let dm = serenity::CreateEmbed::new()
            .title("🎂 Happy Birthday! 🎉")
            .description(format!(
                "Happy Birthday, **{}**!\n\nWe hope you have a wonderful day filled with joy and celebration! 🎈\n\nYour birthday has been announced in <#{}>.",
                name, celebration.channel_id
            ))
            .color(BIRTHDAY_COLOR)
            .timestamp(serenity::Timestamp::now());
        if let Err(e) = member
            .user
            .direct_message(http, serenity::CreateMessage::new().embed(dm))
            .await
        {
            tracing::debug!(user_id, "Could not send birthday DM: {}", e);
        }
    }
}
