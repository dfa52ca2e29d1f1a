//! Persisted client state, the equivalent of the browser's `localStorage`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

pub const THEME_KEY: &str = "theme";
pub const DIRECTION_KEY: &str = "dir";
pub const ROLE_KEY: &str = "userRole";

/// A string key/value store. Absent keys mean "use the component's default".
pub trait Storage {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&mut self, key: &str, value: &str);
    fn remove_item(&mut self, key: &str);
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    items: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.set_item(key, value);
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) {
        self.items.insert(key.to_string(), value.to_string());
    }

    fn remove_item(&mut self, key: &str) {
        self.items.remove(key);
    }
}

/// Storage backed by a JSON object on disk. Changes are kept in memory until `save` is called.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    items: MemoryStorage,
}

impl FileStorage {
    /// Opens the store, starting empty if the file doesn't exist yet.
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<FileStorage> {
        let path = path.as_ref().to_owned();
        let mut items = MemoryStorage::new();

        if path.exists() {
            let text = fs::read_to_string(&path).with_context(|| format!("Failed to read {:?}", path))?;
            let map: BTreeMap<String, String> = serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse {:?}", path))?;
            for (k, v) in map {
                items.set_item(&k, &v);
            }
        }

        Ok(FileStorage { path, items })
    }

    pub fn save(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.items.items)?;
        fs::write(&self.path, json).with_context(|| format!("Failed to write {:?}", self.path))?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) {
        self.items.set_item(key, value)
    }

    fn remove_item(&mut self, key: &str) {
        self.items.remove_item(key)
    }
}
