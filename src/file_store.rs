use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::persisted_store::{KeyValueStore, StoreError};

/// A key-value store kept as one JSON object on disk, rewritten on every change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    items: RefCell<BTreeMap<String, String>>,
}

impl FileStore {
    /// Opens `path`, treating a missing or corrupt file as an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let items: BTreeMap<String, String> = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                tracing::warn!(path = %path.display(), "ignoring corrupt store file: {err}");
                BTreeMap::new()
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            path,
            items: RefCell::new(items),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(&*self.items.borrow())
            .map_err(|_| StoreError::Serialize("store"))?;
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let staging = self.path.with_extension("tmp");
        fs::write(&staging, raw)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        if self.items.borrow_mut().remove(key).is_none() {
            return Ok(());
        }
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");
        let store = FileStore::open(&path).unwrap();
        store.set_item("visibleThumbCount", "5").unwrap();
        store.set_item("puzzlePlacements", "[null]").unwrap();
        store.remove_item("puzzlePlacements").unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get_item("visibleThumbCount").as_deref(), Some("5"));
        assert_eq!(reopened.get_item("puzzlePlacements"), None);
    }

    #[test]
    fn corrupt_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "not json at all").unwrap();
        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get_item("puzzlePieces"), None);
    }
}
