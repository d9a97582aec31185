use crate::core::warnings::{StoreError, Warning, WarningStore};
use crate::infra::storage::JsonDocument;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;

// guild ID -> user ID -> warnings, oldest first
type WarningsDocument = HashMap<u64, HashMap<u64, Vec<Warning>>>;

/// Warning ledger backed by `warnings.json`.
pub struct JsonWarningStore {
    doc: JsonDocument<WarningsDocument>,
}

impl JsonWarningStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            doc: JsonDocument::open(path),
        }
    }
}

#[async_trait]
impl WarningStore for JsonWarningStore {
    async fn append(
        &self,
        guild_id: u64,
        user_id: u64,
        warning: Warning,
    ) -> Result<usize, StoreError> {
        self.doc
            .update(|guilds| {
                let list = guilds
                    .entry(guild_id)
                    .or_default()
                    .entry(user_id)
                    .or_default();
                list.push(warning);
                list.len()
            })
            .await
    }

    async fn list(&self, guild_id: u64, user_id: u64) -> Result<Vec<Warning>, StoreError> {
        Ok(self
            .doc
            .read(|guilds| {
                guilds
                    .get(&guild_id)
                    .and_then(|users| users.get(&user_id))
                    .cloned()
                    .unwrap_or_default()
            })
            .await)
    }

    async fn truncate_tail(
        &self,
        guild_id: u64,
        user_id: u64,
        count: usize,
    ) -> Result<(usize, usize), StoreError> {
        self.doc
            .update(|guilds| {
                let Some(users) = guilds.get_mut(&guild_id) else {
                    return (0, 0);
                };
                let Some(list) = users.get_mut(&user_id) else {
                    return (0, 0);
                };

                let removed = count.min(list.len());
                list.truncate(list.len() - removed);
                let remaining = list.len();

                if remaining == 0 {
                    users.remove(&user_id);
                }
                if users.is_empty() {
                    guilds.remove(&guild_id);
                }
                (removed, remaining)
            })
            .await
    }

    async fn guild_warnings(&self, guild_id: u64) -> Result<Vec<(u64, Vec<Warning>)>, StoreError> {
        Ok(self
            .doc
            .read(|guilds| {
                guilds
                    .get(&guild_id)
                    .map(|users| {
                        users
                            .iter()
                            .filter(|(_, list)| !list.is_empty())
                            .map(|(user_id, list)| (*user_id, list.clone()))
                            .collect()
                    })
                    .unwrap_or_default()
            })
            .await)
    }

    async fn mark_last_kick_failed(&self, guild_id: u64, user_id: u64) -> Result<(), StoreError> {
        self.doc
            .update(|guilds| {
                if let Some(last) = guilds
                    .get_mut(&guild_id)
                    .and_then(|users| users.get_mut(&user_id))
                    .and_then(|list| list.last_mut())
                {
                    last.kick_failed = true;
                }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    fn warning(reason: &str) -> Warning {
        Warning::new(reason, "mod#0001", Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
    }

    #[tokio::test]
    async fn test_warnings_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("warnings.json");

        let store = JsonWarningStore::new(&path);
        assert_eq!(store.append(1, 10, warning("spam")).await.unwrap(), 1);
        assert_eq!(store.append(1, 10, warning("caps")).await.unwrap(), 2);
        store.mark_last_kick_failed(1, 10).await.unwrap();

        let reopened = JsonWarningStore::new(&path);
        let list = reopened.list(1, 10).await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].reason, "spam");
        assert!(!list[0].kick_failed);
        assert!(list[1].kick_failed);
    }

    #[tokio::test]
    async fn test_document_shape_uses_string_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("warnings.json");

        let store = JsonWarningStore::new(&path);
        store.append(123, 456, warning("spam")).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let entry = &raw["123"]["456"][0];
        assert_eq!(entry["reason"], "spam");
        assert_eq!(entry["moderator"], "mod#0001");
        assert_eq!(entry["timestamp"], "2024-05-01T12:00:00.000Z");
        assert!(entry.get("kick_failed").is_none());
    }

    #[tokio::test]
    async fn test_truncate_removes_empty_entries() {
        let dir = tempdir().unwrap();
        let store = JsonWarningStore::new(dir.path().join("warnings.json"));
        store.append(1, 10, warning("a")).await.unwrap();
        store.append(1, 10, warning("b")).await.unwrap();

        assert_eq!(store.truncate_tail(1, 10, 1).await.unwrap(), (1, 1));
        assert_eq!(store.list(1, 10).await.unwrap()[0].reason, "a");

        assert_eq!(store.truncate_tail(1, 10, 5).await.unwrap(), (1, 0));
        assert!(store.guild_warnings(1).await.unwrap().is_empty());
        assert_eq!(store.truncate_tail(1, 10, 1).await.unwrap(), (0, 0));
    }
}
