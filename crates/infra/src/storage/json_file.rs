//! Single-file JSON store
//!
//! The whole map lives in one JSON object on disk and in memory. Every write
//! replaces the file atomically (temp file in the same directory, then
//! rename), so a crash mid-write leaves the previous contents intact. File
//! I/O runs on the blocking pool.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use gasoline_core::KeyValueStore;
use gasoline_domain::{GasolineError, Result};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

type Entries = Map<String, Value>;

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    /// Loaded lazily on first access; `None` until then
    state: Mutex<Option<Entries>>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), state: Mutex::new(None) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn loaded<'a>(&self, state: &'a mut Option<Entries>) -> Result<&'a mut Entries> {
        if state.is_none() {
            *state = Some(read_entries(self.path.clone()).await?);
        }
        Ok(state.get_or_insert_with(Entries::new))
    }

    /// Apply `change` to a copy, persist it, then commit it in memory.
    async fn update(&self, change: impl FnOnce(&mut Entries)) -> Result<()> {
        let mut state = self.state.lock().await;
        let entries = self.loaded(&mut state).await?;

        let mut next = entries.clone();
        change(&mut next);
        if next == *entries {
            return Ok(());
        }

        write_entries(self.path.clone(), next.clone()).await?;
        *entries = next;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut state = self.state.lock().await;
        let entries = self.loaded(&mut state).await?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value);
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.update(|entries| {
            entries.remove(key);
        })
        .await
    }
}

#[instrument(skip_all, fields(path = %path.display()))]
async fn read_entries(path: PathBuf) -> Result<Entries> {
    tokio::task::spawn_blocking(move || match std::fs::read_to_string(&path) {
        Ok(contents) if contents.trim().is_empty() => Ok(Entries::new()),
        Ok(contents) => match serde_json::from_str::<Entries>(&contents) {
            Ok(entries) => {
                debug!(keys = entries.len(), "store loaded");
                Ok(entries)
            }
            Err(err) => {
                warn!(error = %err, "store file is not a JSON object, starting empty");
                Ok(Entries::new())
            }
        },
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(Entries::new()),
        Err(err) => Err(GasolineError::Storage(format!("failed to read store: {err}"))),
    })
    .await
    .map_err(|e| GasolineError::Internal(format!("store read task failed: {e}")))?
}

#[instrument(skip_all, fields(path = %path.display(), keys = entries.len()))]
async fn write_entries(path: PathBuf, entries: Entries) -> Result<()> {
    tokio::task::spawn_blocking(move || {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(storage_error)?;

        let mut file = NamedTempFile::new_in(&dir).map_err(storage_error)?;
        let bytes = serde_json::to_vec_pretty(&entries)?;
        file.write_all(&bytes).map_err(storage_error)?;
        file.as_file().sync_all().map_err(storage_error)?;
        file.persist(&path).map_err(|e| storage_error(e.error))?;
        debug!("store written");
        Ok(())
    })
    .await
    .map_err(|e| GasolineError::Internal(format!("store write task failed: {e}")))?
}

fn storage_error(err: std::io::Error) -> GasolineError {
    GasolineError::Storage(format!("failed to write store: {err}"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::tempdir;

    use super::*;

    #[tokio::test]
    async fn test_missing_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("store.json"));
        assert_eq!(store.get("ai_web_pilot_enabled").await.unwrap(), None);
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let store = JsonFileStore::new(&path);
        store.set("ai_web_pilot_enabled", json!(true)).await.unwrap();
        store.set("other", json!({"n": 1})).await.unwrap();
        store.remove("other").await.unwrap();
        drop(store);

        let reopened = JsonFileStore::new(&path);
        assert_eq!(reopened.get("ai_web_pilot_enabled").await.unwrap(), Some(json!(true)));
        assert_eq!(reopened.get("other").await.unwrap(), None);

        let on_disk: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk, json!({"ai_web_pilot_enabled": true}));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_replaced_on_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = JsonFileStore::new(&path);
        assert_eq!(store.get("ai_web_pilot_enabled").await.unwrap(), None);

        store.set("ai_web_pilot_enabled", json!(false)).await.unwrap();
        let reopened = JsonFileStore::new(&path);
        assert_eq!(reopened.get("ai_web_pilot_enabled").await.unwrap(), Some(json!(false)));
    }
}
