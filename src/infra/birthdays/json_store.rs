use crate::core::birthdays::{BirthdayStore, GuildBirthdays};
use crate::core::store_error::StoreError;
use crate::infra::storage::JsonDocument;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;

/// Birthday settings backed by `birthday-settings.json`, keyed by guild ID.
pub struct JsonBirthdayStore {
    doc: JsonDocument<HashMap<u64, GuildBirthdays>>,
}

impl JsonBirthdayStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            doc: JsonDocument::open(path),
        }
    }
}

#[async_trait]
impl BirthdayStore for JsonBirthdayStore {
    async fn get_guild(&self, guild_id: u64) -> Result<Option<GuildBirthdays>, StoreError> {
        Ok(self.doc.read(|guilds| guilds.get(&guild_id).cloned()).await)
    }

    async fn save_guild(&self, guild_id: u64, settings: GuildBirthdays) -> Result<(), StoreError> {
        self.doc
            .update(|guilds| {
                guilds.insert(guild_id, settings);
            })
            .await
    }

    async fn all_guilds(&self) -> Result<Vec<(u64, GuildBirthdays)>, StoreError> {
        Ok(self
            .doc
            .read(|guilds| {
                guilds
                    .iter()
                    .map(|(id, settings)| (*id, settings.clone()))
                    .collect()
            })
            .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::birthdays::BirthdayEntry;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_settings_round_trip_with_camel_case_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("birthday-settings.json");

        let mut settings = GuildBirthdays {
            channel_id: 500,
            setup_by: 99,
            setup_at: 1_700_000_000_000,
            birthdays: HashMap::new(),
        };
        settings.birthdays.insert(
            10,
            BirthdayEntry {
                day: 15,
                month: 3,
                username: "alice".to_string(),
                display_name: "Alice".to_string(),
                added_at: 1_700_000_000_001,
            },
        );

        let store = JsonBirthdayStore::new(&path);
        store.save_guild(1, settings.clone()).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["1"]["channelId"], "500");
        assert_eq!(raw["1"]["setupBy"], "99");
        assert_eq!(raw["1"]["birthdays"]["10"]["displayName"], "Alice");

        let reopened = JsonBirthdayStore::new(&path);
        assert_eq!(reopened.get_guild(1).await.unwrap(), Some(settings));
        assert_eq!(reopened.all_guilds().await.unwrap().len(), 1);
        assert!(reopened.get_guild(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_settings_without_birthdays_field_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("birthday-settings.json");
        std::fs::write(
            &path,
            r#"{"7": {"channelId": 1, "setupBy": 2, "setupAt": 3}}"#,
        )
        .unwrap();

        let store = JsonBirthdayStore::new(&path);
        let settings = store.get_guild(7).await.unwrap().unwrap();
        assert!(settings.birthdays.is_empty());
    }

    #[tokio::test]
    async fn test_string_snowflakes_load_and_survive_a_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("birthday-settings.json");
        std::fs::write(
            &path,
            r#"{
                "7": {
                    "channelId": "111",
                    "setupBy": "222",
                    "setupAt": 1700000000000,
                    "birthdays": {
                        "333": {
                            "day": 14,
                            "month": 11,
                            "username": "alice",
                            "displayName": "Alice",
                            "addedAt": 1700000000001
                        }
                    }
                },
                "8": {"channelId": "444", "setupBy": "555", "setupAt": 1, "birthdays": {}}
            }"#,
        )
        .unwrap();

        let store = JsonBirthdayStore::new(&path);
        let settings = store.get_guild(7).await.unwrap().unwrap();
        assert_eq!(settings.channel_id, 111);
        assert_eq!(settings.setup_by, 222);
        assert_eq!(settings.birthdays[&333].display_name, "Alice");

        store
            .save_guild(
                9,
                GuildBirthdays {
                    channel_id: 666,
                    setup_by: 777,
                    setup_at: 2,
                    birthdays: HashMap::new(),
                },
            )
            .await
            .unwrap();

        let reopened = JsonBirthdayStore::new(&path);
        assert_eq!(reopened.all_guilds().await.unwrap().len(), 3);
        assert_eq!(reopened.get_guild(8).await.unwrap().unwrap().channel_id, 444);
        assert_eq!(reopened.get_guild(7).await.unwrap(), Some(settings));
    }
}
