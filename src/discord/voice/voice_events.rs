// Voice state glue: classify the transition, update the tracker and post a
// report to the voice-tracking channel.

use crate::core::voice::{
    duration_bar, format_duration_ms, LeaveReport, SwitchReport, VoiceChannelRef, VoiceFlags,
    VoiceSession, VoiceTransition,
};
use crate::discord::Data;
use anyhow::Result;
use poise::serenity_prelude::{self as serenity, Context, CreateEmbed, CreateEmbedFooter};

const JOIN_COLOR: u32 = 0x00D26A;
const LEAVE_COLOR: u32 = 0xFF4757;
const SWITCH_COLOR: u32 = 0xFFA726;

pub async fn handle_voice_state_update(
    ctx: &Context,
    data: &Data,
    old: Option<&serenity::VoiceState>,
    new: &serenity::VoiceState,
) -> Result<()> {
    let Some(guild_id) = new.guild_id else {
        return Ok(());
    };

    let Some(member) = new.member.as_ref() else {
        return Ok(());
    };

    if member.user.bot {
        return Ok(());
    }

    let Some(report_channel) = data.config.voice_report_channel_id else {
        tracing::warn!("Voice tracking channel is not configured; skipping voice update");
        return Ok(());
    };

    let user_id = member.user.id.get();
    let old_channel = old.and_then(|s| s.channel_id);
    let new_channel = new.channel_id;
    let now_ms = chrono::Utc::now().timestamp_millis();

    let embed = match VoiceTransition::classify(
        old_channel.map(|id| id.get()),
        new_channel.map(|id| id.get()),
    ) {
        VoiceTransition::Join => {
            let Some(channel_id) = new_channel else {
                return Ok(());
            };
            let channel = channel_ref(ctx, guild_id, channel_id);
            let session = data.voice.join(user_id, channel, flags_of(new), now_ms);
            tracing::debug!(user_id, channel_id = session.channel_id, "Voice session opened");
            join_embed(member, &session)
        }
        VoiceTransition::Switch => {
            let Some(channel_id) = new_channel else {
                return Ok(());
            };
            let channel = channel_ref(ctx, guild_id, channel_id);
            match data.voice.switch(user_id, channel, now_ms) {
                Some(report) => switch_embed(member, &report, &flags_of(new)),
                None => {
                    tracing::debug!(user_id, "Switch without a tracked session");
                    return Ok(());
                }
            }
        }
        VoiceTransition::Leave => match data.voice.leave(user_id, now_ms) {
            Some(report) => leave_embed(member, &report),
            None => {
                tracing::debug!(user_id, "Leave without a tracked session");
                return Ok(());
            }
        },
        // Mute/deafen/stream toggles inside the same channel
        VoiceTransition::None => return Ok(()),
    };

    if let Err(e) = serenity::ChannelId::new(report_channel)
        .send_message(&ctx.http, serenity::CreateMessage::new().embed(embed))
        .await
    {
        tracing::warn!(
            "Failed to send voice report to channel {}: {}",
            report_channel,
            e
        );
    }

    Ok(())
}

fn flags_of(state: &serenity::VoiceState) -> VoiceFlags {
    VoiceFlags {
        self_mute: state.self_mute,
        self_deaf: state.self_deaf,
        server_mute: state.mute,
        server_deaf: state.deaf,
        streaming: state.self_stream.unwrap_or(false),
        video: state.self_video,
    }
}

fn channel_ref(
    ctx: &Context,
    guild_id: serenity::GuildId,
    channel_id: serenity::ChannelId,
) -> VoiceChannelRef {
    let name = ctx
        .cache
        .guild(guild_id)
        .and_then(|g| g.channels.get(&channel_id).map(|c| c.name.clone()))
        .unwrap_or_else(|| "Unknown channel".to_string());

    VoiceChannelRef {
        id: channel_id.get(),
        name,
    }
}

fn member_field(member: &serenity::Member) -> String {
    format!("`{}`\n<@{}>", member.user.tag(), member.user.id)
}

fn status_field(flags: &VoiceFlags) -> String {
    format!(
        "{}\n{}{}",
        if flags.muted() { "🔇 Muted" } else { "🔊 Unmuted" },
        if flags.deafened() { "🔇 Deafened" } else { "👂 Listening" },
        if flags.streaming { "\n📺 Streaming" } else { "" }
    )
}

fn join_embed(member: &serenity::Member, session: &VoiceSession) -> CreateEmbed {
    CreateEmbed::new()
        .title("🎤 Voice Channel Joined")
        .description(format!(
            "**{}** has joined the voice channel",
            member.display_name()
        ))
        .field("👤 Member", member_field(member), true)
        .field(
            "🔊 Channel",
            format!("**{}**\n`{}`", session.channel_name, session.channel_id),
            true,
        )
        .field(
            "⏰ Join Time",
            format!("<t:{}:T>", session.join_timestamp_ms / 1000),
            true,
        )
        .field("🎛️ Voice Status", status_field(&session.flags), true)
        .color(JOIN_COLOR)
        .thumbnail(member.face())
        .footer(CreateEmbedFooter::new(format!(
            "Session ID: {}",
            short_session_id(&session.session_id)
        )))
        .timestamp(serenity::Timestamp::now())
}

fn switch_embed(
    member: &serenity::Member,
    report: &SwitchReport,
    flags: &VoiceFlags,
) -> CreateEmbed {
    CreateEmbed::new()
        .title("🔄 Voice Channel Switch")
        .description(format!("**{}** switched voice channels", member.display_name()))
        .field(
            "📤 From Channel",
            format!("**{}**\n`{}`", report.from.name, report.from.id),
            true,
        )
        .field(
            "📥 To Channel",
            format!("**{}**\n`{}`", report.to.name, report.to.id),
            true,
        )
        .field(
            "⏱️ Time in Previous",
            format!(
                "**{}**\n{}",
                format_duration_ms(report.elapsed_ms),
                duration_bar(report.elapsed_ms)
            ),
            false,
        )
        .field("👤 Member Info", member_field(member), true)
        .field("🎛️ Voice Status", status_field(flags), true)
        .color(SWITCH_COLOR)
        .thumbnail(member.face())
        .footer(CreateEmbedFooter::new(
            "Session continues • Total session time will be calculated on leave",
        ))
        .timestamp(serenity::Timestamp::now())
}

fn leave_embed(member: &serenity::Member, report: &LeaveReport) -> CreateEmbed {
    let duration = format_duration_ms(report.duration_ms);
    let session = &report.session;

    CreateEmbed::new()
        .title("🚪 Voice Channel Left")
        .description(format!(
            "**{}** has left the voice channel",
            member.display_name()
        ))
        .field("👤 Member", member_field(member), true)
        .field(
            "🔊 Channel",
            format!("**{}**\n`{}`", session.channel_name, session.channel_id),
            true,
        )
        .field(
            "⏱️ Session Duration",
            format!(
                "**{}**\n{}\n{}",
                duration,
                duration_bar(report.duration_ms),
                report.quality.label()
            ),
            false,
        )
        .field(
            "📅 Session Times",
            format!(
                "**Joined:** <t:{}:T>\n**Left:** <t:{}:T>",
                session.join_timestamp_ms / 1000,
                report.leave_timestamp_ms / 1000
            ),
            true,
        )
        .field(
            "📊 Session Stats",
            format!("**Total Time:** {}\n**Status:** Completed ✅", duration),
            true,
        )
        .color(LEAVE_COLOR)
        .thumbnail(member.face())
        .footer(CreateEmbedFooter::new(format!(
            "Session ID: {} • Total Sessions Today: {}",
            short_session_id(&session.session_id),
            report.sessions_today
        )))
        .timestamp(serenity::Timestamp::now())
}

/// Last eight characters, enough to tell sessions apart in a channel.
fn short_session_id(session_id: &str) -> &str {
    let start = session_id.len().saturating_sub(8);
    session_id.get(start..).unwrap_or(session_id)
}
