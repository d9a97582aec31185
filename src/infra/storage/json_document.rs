use crate::core::store_error::StoreError;
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// A whole JSON file held in memory and rewritten on every change.
///
/// A missing or unreadable file opens as `T::default()` so a corrupt
/// document never keeps the bot from starting.
pub struct JsonDocument<T> {
    path: PathBuf,
    cache: RwLock<T>,
}

impl<T> JsonDocument<T>
where
    T: Serialize + DeserializeOwned + Default + Send + Sync,
{
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let value = load_or_default(&path);
        Self {
            path,
            cache: RwLock::new(value),
        }
    }

    /// Run `f` against the current value.
    pub async fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let cache = self.cache.read().await;
        f(&cache)
    }

    /// Mutate the value and write the file. The write lock is held until the
    /// file is on disk so concurrent updates can't interleave.
    pub async fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, StoreError> {
        let mut cache = self.cache.write().await;
        let result = f(&mut cache);
        self.persist(&cache).await?;
        Ok(result)
    }

    async fn persist(&self, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(value)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return T::default(),
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                "Failed to read data file, starting empty: {}",
                e
            );
            return T::default();
        }
    };

    serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), "Failed to parse data file, starting empty: {}", e);
        T::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_file_opens_empty() {
        let dir = tempdir().unwrap();
        let doc: JsonDocument<HashMap<String, u32>> = JsonDocument::open(dir.path().join("a.json"));
        assert!(doc.read(|m| m.is_empty()).await);
    }

    #[tokio::test]
    async fn test_corrupt_file_opens_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let doc: JsonDocument<HashMap<String, u32>> = JsonDocument::open(&path);
        assert!(doc.read(|m| m.is_empty()).await);
    }

    #[tokio::test]
    async fn test_update_persists_and_creates_parent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("doc.json");

        let doc: JsonDocument<HashMap<String, u32>> = JsonDocument::open(&path);
        doc.update(|m| m.insert("hits".to_string(), 3)).await.unwrap();

        let reopened: JsonDocument<HashMap<String, u32>> = JsonDocument::open(&path);
        assert_eq!(reopened.read(|m| m.get("hits").copied()).await, Some(3));
    }
}
