use super::birthday_models::GuildBirthdays;
use crate::core::store_error::StoreError;
use async_trait::async_trait;

#[async_trait]
pub trait BirthdayStore: Send + Sync {
    async fn get_guild(&self, guild_id: u64) -> Result<Option<GuildBirthdays>, StoreError>;
    async fn save_guild(&self, guild_id: u64, settings: GuildBirthdays) -> Result<(), StoreError>;
    async fn all_guilds(&self) -> Result<Vec<(u64, GuildBirthdays)>, StoreError>;
}
