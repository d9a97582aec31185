use super::warning_models::Warning;
pub use crate::core::store_error::StoreError;
use async_trait::async_trait;

/// Persistence port for the warning ledger.
#[async_trait]
pub trait WarningStore: Send + Sync {
    /// Append a warning and return the member's new total.
    async fn append(&self, guild_id: u64, user_id: u64, warning: Warning)
        -> Result<usize, StoreError>;

    /// All warnings for a member, oldest first.
    async fn list(&self, guild_id: u64, user_id: u64) -> Result<Vec<Warning>, StoreError>;

    /// Drop up to `count` warnings from the newest end. Removes the member's
    /// entry when nothing is left. Returns `(removed, remaining)`.
    async fn truncate_tail(
        &self,
        guild_id: u64,
        user_id: u64,
        count: usize,
    ) -> Result<(usize, usize), StoreError>;

    /// Every member in the guild with at least one warning.
    async fn guild_warnings(&self, guild_id: u64) -> Result<Vec<(u64, Vec<Warning>)>, StoreError>;

    /// Flag the member's most recent warning as having a failed kick.
    async fn mark_last_kick_failed(&self, guild_id: u64, user_id: u64) -> Result<(), StoreError>;
}
