// Birthday reminders - registration and the daily "who is celebrating" query.
//
// Like the other services this one only works with primitives; the Discord
// layer creates the channel and posts the celebration embeds.

use super::birthday_models::{BirthdayDate, BirthdayEntry, Celebration, GuildBirthdays};
use super::birthday_store::BirthdayStore;
use crate::core::store_error::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum BirthdayError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Birthday system is not set up! Ask an administrator to use `!setupbirthdays` first.")]
    NotSetup,
    #[error("You don't have a birthday registered in the system.")]
    NotRegistered,
}

pub struct BirthdayService<S: BirthdayStore> {
    store: S,
}

impl<S: BirthdayStore> BirthdayService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn settings(&self, guild_id: u64) -> Result<Option<GuildBirthdays>, BirthdayError> {
        Ok(self.store.get_guild(guild_id).await?)
    }

    /// Point the guild at a birthday channel. Birthdays already registered
    /// are kept when the channel is replaced.
    pub async fn setup(
        &self,
        guild_id: u64,
        channel_id: u64,
        setup_by: u64,
        now_ms: i64,
    ) -> Result<GuildBirthdays, BirthdayError> {
        let birthdays = self
            .store
            .get_guild(guild_id)
            .await?
            .map(|existing| existing.birthdays)
            .unwrap_or_default();

        let settings = GuildBirthdays {
            channel_id,
            setup_by,
            setup_at: now_ms,
            birthdays,
        };
        self.store.save_guild(guild_id, settings.clone()).await?;

        tracing::info!(guild_id, channel_id, "Birthday system configured");
        Ok(settings)
    }

    /// Register or replace a member's birthday. Returns the previous entry.
    pub async fn add(
        &self,
        guild_id: u64,
        user_id: u64,
        date: BirthdayDate,
        username: &str,
        display_name: &str,
        now_ms: i64,
    ) -> Result<Option<BirthdayEntry>, BirthdayError> {
        let mut settings = self.require_settings(guild_id).await?;

        let previous = settings.birthdays.insert(
            user_id,
            BirthdayEntry {
                day: date.day,
                month: date.month,
                username: username.to_string(),
                display_name: display_name.to_string(),
                added_at: now_ms,
            },
        );
        self.store.save_guild(guild_id, settings).await?;
        Ok(previous)
    }

    pub async fn remove(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> Result<BirthdayEntry, BirthdayError> {
        let mut settings = self.require_settings(guild_id).await?;
        let removed = settings
            .birthdays
            .remove(&user_id)
            .ok_or(BirthdayError::NotRegistered)?;
        self.store.save_guild(guild_id, settings).await?;
        Ok(removed)
    }

    /// Every registered birthday, ordered by month then day.
    pub async fn list_sorted(
        &self,
        guild_id: u64,
    ) -> Result<Vec<(u64, BirthdayEntry)>, BirthdayError> {
        let settings = self.require_settings(guild_id).await?;
        let mut entries: Vec<(u64, BirthdayEntry)> = settings.birthdays.into_iter().collect();
        entries.sort_by(|(a_id, a), (b_id, b)| a.date().cmp(&b.date()).then(a_id.cmp(b_id)));
        Ok(entries)
    }

    /// Guilds with at least one member celebrating on `date`.
    pub async fn celebrants(&self, date: BirthdayDate) -> Result<Vec<Celebration>, BirthdayError> {
        let mut celebrations: Vec<Celebration> = self
            .store
            .all_guilds()
            .await?
            .into_iter()
            .filter_map(|(guild_id, settings)| {
                let mut user_ids: Vec<u64> = settings
                    .birthdays
                    .iter()
                    .filter(|(_, entry)| entry.date() == date)
                    .map(|(user_id, _)| *user_id)
                    .collect();
                if user_ids.is_empty() {
                    return None;
                }
                user_ids.sort_unstable();
                Some(Celebration {
                    guild_id,
                    channel_id: settings.channel_id,
                    user_ids,
                })
            })
            .collect();

        celebrations.sort_by_key(|c| c.guild_id);
        Ok(celebrations)
    }

    async fn require_settings(&self, guild_id: u64) -> Result<GuildBirthdays, BirthdayError> {
        self.store
            .get_guild(guild_id)
            .await?
            .ok_or(BirthdayError::NotSetup)
    }
}
