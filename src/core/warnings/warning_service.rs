// Warning ledger - append-only moderator warnings with an auto-kick threshold.
//
// The ledger only decides; kicking is the Discord layer's job. Warnings and
// kicks are not transactional: a failed kick never rolls back the warning, it
// only flags it.

use super::warning_models::{WarnOutcome, WarnedMember, Warning, AUTO_KICK_THRESHOLD};
use super::warning_store::{StoreError, WarningStore};
use chrono::{DateTime, Utc};

#[derive(Debug, thiserror::Error)]
pub enum WarningError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("This user has no warnings to remove!")]
    NoWarnings,
}

pub struct WarningLedger<S: WarningStore> {
    store: S,
}

impl<S: WarningStore> WarningLedger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Record a warning. `threshold_reached` tells the caller to kick.
    pub async fn add_warning(
        &self,
        guild_id: u64,
        user_id: u64,
        reason: &str,
        moderator: &str,
        at: DateTime<Utc>,
    ) -> Result<WarnOutcome, WarningError> {
        let warning = Warning::new(reason, moderator, at);
        let count = self.store.append(guild_id, user_id, warning).await?;

        tracing::info!(guild_id, user_id, count, "Warning recorded");

        Ok(WarnOutcome {
            count,
            threshold_reached: count >= AUTO_KICK_THRESHOLD,
        })
    }

    /// Mark the latest warning so the failed kick stays visible in the ledger.
    pub async fn record_kick_failure(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> Result<(), WarningError> {
        self.store.mark_last_kick_failed(guild_id, user_id).await?;
        Ok(())
    }

    /// Remove up to `count` of the most recent warnings; a count of zero
    /// removes one. Returns `(removed, remaining)`.
    pub async fn remove_warnings(
        &self,
        guild_id: u64,
        user_id: u64,
        count: usize,
    ) -> Result<(usize, usize), WarningError> {
        let count = count.max(1);

        if self.store.list(guild_id, user_id).await?.is_empty() {
            return Err(WarningError::NoWarnings);
        }

        Ok(self.store.truncate_tail(guild_id, user_id, count).await?)
    }

    pub async fn warnings_for(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> Result<Vec<Warning>, WarningError> {
        Ok(self.store.list(guild_id, user_id).await?)
    }

    /// Members with warnings, most-warned first (ties by user id).
    pub async fn guild_overview(&self, guild_id: u64) -> Result<Vec<WarnedMember>, WarningError> {
        let mut members: Vec<WarnedMember> = self
            .store
            .guild_warnings(guild_id)
            .await?
            .into_iter()
            .filter(|(_, warnings)| !warnings.is_empty())
            .map(|(user_id, warnings)| WarnedMember {
                user_id,
                count: warnings.len(),
                latest_reason: warnings
                    .last()
                    .map(|w| w.reason.clone())
                    .unwrap_or_default(),
            })
            .collect();

        members.sort_by(|a, b| b.count.cmp(&a.count).then(a.user_id.cmp(&b.user_id)));
        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use dashmap::DashMap;

    /// In-memory store for testing
    struct MockWarningStore {
        warnings: DashMap<(u64, u64), Vec<Warning>>,
    }

    impl MockWarningStore {
        fn new() -> Self {
            Self {
                warnings: DashMap::new(),
            }
        }
    }

    #[async_trait]
    impl WarningStore for MockWarningStore {
        async fn append(
            &self,
            guild_id: u64,
            user_id: u64,
            warning: Warning,
        ) -> Result<usize, StoreError> {
            let mut list = self.warnings.entry((guild_id, user_id)).or_default();
            list.push(warning);
            Ok(list.len())
        }

        async fn list(&self, guild_id: u64, user_id: u64) -> Result<Vec<Warning>, StoreError> {
            Ok(self
                .warnings
                .get(&(guild_id, user_id))
                .map(|w| w.clone())
                .unwrap_or_default())
        }

        async fn truncate_tail(
            &self,
            guild_id: u64,
            user_id: u64,
            count: usize,
        ) -> Result<(usize, usize), StoreError> {
            let (removed, remaining) = match self.warnings.get_mut(&(guild_id, user_id)) {
                Some(mut list) => {
                    let removed = count.min(list.len());
                    let keep = list.len() - removed;
                    list.truncate(keep);
                    (removed, keep)
                }
                None => (0, 0),
            };
            if remaining == 0 {
                self.warnings.remove(&(guild_id, user_id));
            }
            Ok((removed, remaining))
        }

        async fn guild_warnings(
            &self,
            guild_id: u64,
        ) -> Result<Vec<(u64, Vec<Warning>)>, StoreError> {
            Ok(self
                .warnings
                .iter()
                .filter(|e| e.key().0 == guild_id)
                .map(|e| (e.key().1, e.value().clone()))
                .collect())
        }

        async fn mark_last_kick_failed(
            &self,
            guild_id: u64,
            user_id: u64,
        ) -> Result<(), StoreError> {
            if let Some(mut list) = self.warnings.get_mut(&(guild_id, user_id)) {
                if let Some(last) = list.last_mut() {
                    last.kick_failed = true;
                }
            }
            Ok(())
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[tokio::test]
    async fn test_counts_climb_and_third_triggers_kick() {
        let ledger = WarningLedger::new(MockWarningStore::new());

        let first = ledger.add_warning(1, 10, "spam", "mod#0001", at(0)).await.unwrap();
        let second = ledger.add_warning(1, 10, "spam", "mod#0001", at(1)).await.unwrap();
        let third = ledger.add_warning(1, 10, "spam", "mod#0001", at(2)).await.unwrap();

        assert_eq!((first.count, first.threshold_reached), (1, false));
        assert_eq!((second.count, second.threshold_reached), (2, false));
        assert_eq!((third.count, third.threshold_reached), (3, true));
    }

    #[tokio::test]
    async fn test_kick_does_not_clear_list() {
        let ledger = WarningLedger::new(MockWarningStore::new());

        for i in 0..3 {
            ledger.add_warning(1, 10, "rude", "mod", at(i)).await.unwrap();
        }
        // Member re-joins and gets warned again
        let outcome = ledger.add_warning(1, 10, "rude again", "mod", at(9)).await.unwrap();
        assert_eq!(outcome.count, 4);
        assert!(outcome.threshold_reached);
    }

    #[tokio::test]
    async fn test_warning_fields() {
        let ledger = WarningLedger::new(MockWarningStore::new());
        ledger.add_warning(1, 10, "caps", "mod#42", at(0)).await.unwrap();

        let warnings = ledger.warnings_for(1, 10).await.unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].id, at(0).timestamp_millis());
        assert_eq!(warnings[0].reason, "caps");
        assert_eq!(warnings[0].moderator, "mod#42");
        assert_eq!(warnings[0].timestamp, "2023-11-14T22:13:20.000Z");
        assert!(!warnings[0].kick_failed);
    }

    #[tokio::test]
    async fn test_remove_from_most_recent_end() {
        let ledger = WarningLedger::new(MockWarningStore::new());
        for i in 0..5 {
            ledger
                .add_warning(1, 10, &format!("reason {}", i), "mod", at(i))
                .await
                .unwrap();
        }

        let (removed, remaining) = ledger.remove_warnings(1, 10, 2).await.unwrap();
        assert_eq!((removed, remaining), (2, 3));

        let reasons: Vec<String> = ledger
            .warnings_for(1, 10)
            .await
            .unwrap()
            .into_iter()
            .map(|w| w.reason)
            .collect();
        assert_eq!(reasons, vec!["reason 0", "reason 1", "reason 2"]);
    }

    #[tokio::test]
    async fn test_remove_more_than_available_deletes_entry() {
        let store = MockWarningStore::new();
        let ledger = WarningLedger::new(store);
        ledger.add_warning(1, 10, "a", "mod", at(0)).await.unwrap();
        ledger.add_warning(1, 10, "b", "mod", at(1)).await.unwrap();

        let (removed, remaining) = ledger.remove_warnings(1, 10, 10).await.unwrap();
        assert_eq!((removed, remaining), (2, 0));
        assert!(ledger.guild_overview(1).await.unwrap().is_empty());

        let err = ledger.remove_warnings(1, 10, 1).await.unwrap_err();
        assert!(matches!(err, WarningError::NoWarnings));
    }

    #[tokio::test]
    async fn test_remove_zero_removes_one() {
        let ledger = WarningLedger::new(MockWarningStore::new());
        ledger.add_warning(1, 10, "a", "mod", at(0)).await.unwrap();
        ledger.add_warning(1, 10, "b", "mod", at(1)).await.unwrap();

        let (removed, remaining) = ledger.remove_warnings(1, 10, 0).await.unwrap();
        assert_eq!((removed, remaining), (1, 1));
        let left = ledger.warnings_for(1, 10).await.unwrap();
        assert_eq!(left[0].reason, "a");
    }

    #[tokio::test]
    async fn test_kick_failure_flags_latest_warning() {
        let ledger = WarningLedger::new(MockWarningStore::new());
        for i in 0..3 {
            ledger.add_warning(1, 10, "x", "mod", at(i)).await.unwrap();
        }

        ledger.record_kick_failure(1, 10).await.unwrap();

        let warnings = ledger.warnings_for(1, 10).await.unwrap();
        assert_eq!(warnings.len(), 3);
        assert!(!warnings[1].kick_failed);
        assert!(warnings[2].kick_failed);
    }

    #[tokio::test]
    async fn test_overview_sorted_and_scoped_to_guild() {
        let ledger = WarningLedger::new(MockWarningStore::new());
        ledger.add_warning(1, 10, "a", "mod", at(0)).await.unwrap();
        ledger.add_warning(1, 20, "b", "mod", at(1)).await.unwrap();
        ledger.add_warning(1, 20, "c", "mod", at(2)).await.unwrap();
        ledger.add_warning(2, 30, "other guild", "mod", at(3)).await.unwrap();

        let overview = ledger.guild_overview(1).await.unwrap();
        assert_eq!(overview.len(), 2);
        assert_eq!(overview[0].user_id, 20);
        assert_eq!(overview[0].count, 2);
        assert_eq!(overview[0].latest_reason, "c");
        assert_eq!(overview[1].user_id, 10);
    }
}
