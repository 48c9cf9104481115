//! Key-value persistence for favorites and saved locations
//!
//! Consumers get a `KeyValueStore` passed in; nothing here is global. The
//! loader never touches the store.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::config::Config;
use crate::constants::{FAVORITES_KEY, SAVED_LOCATIONS_KEY};

/// String values under string keys
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

fn poisoned() -> anyhow::Error {
    anyhow::anyhow!("store lock poisoned")
}

/// Volatile store, mostly for tests
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.remove(key);
        Ok(())
    }
}

/// Store persisted as one JSON object file, rewritten on every change
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open `~/.loadstate/store.json`
    pub fn open_default() -> Result<Self> {
        Self::open(&Config::dir().join("store.json"))
    }

    /// Open `path`; a missing file is an empty store
    pub fn open(path: &Path) -> Result<Self> {
        let entries: BTreeMap<String, String> = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read store from {:?}", path))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse store from {:?}", path))?
        } else {
            BTreeMap::new()
        };

        Ok(FileStore {
            path: path.to_path_buf(),
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure the parent directory exists, then write the whole map
    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create store directory {:?}", parent))?;
            }
        }
        let content = serde_json::to_string_pretty(entries).context("Failed to serialize store")?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write store to {:?}", self.path))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }
}

/// Read a JSON array under `key`. Missing or corrupt values read as empty.
fn read_list<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Vec<T>> {
    let Some(raw) = store.get(key)? else {
        return Ok(Vec::new());
    };
    match serde_json::from_str::<Option<Vec<T>>>(&raw) {
        Ok(list) => Ok(list.unwrap_or_default()),
        Err(e) => {
            tracing::warn!(key, error = %e, "Ignoring corrupt store value");
            Ok(Vec::new())
        }
    }
}

fn write_list<T: Serialize>(store: &dyn KeyValueStore, key: &str, list: &[T]) -> Result<()> {
    let raw = serde_json::to_string(list).context("Failed to serialize list")?;
    store.set(key, &raw)
}

/// Favorite items kept as a JSON array under one key
pub struct Favorites<'a, T = u64> {
    store: &'a dyn KeyValueStore,
    key: &'a str,
    _item: std::marker::PhantomData<T>,
}

impl<'a> Favorites<'a, u64> {
    /// Favorite product ids under `favorites`
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self::with_key(store, FAVORITES_KEY)
    }
}

impl<'a, T> Favorites<'a, T>
where
    T: Serialize + DeserializeOwned + PartialEq,
{
    pub fn with_key(store: &'a dyn KeyValueStore, key: &'a str) -> Self {
        Favorites {
            store,
            key,
            _item: std::marker::PhantomData,
        }
    }

    pub fn list(&self) -> Result<Vec<T>> {
        read_list(self.store, self.key)
    }

    pub fn contains(&self, item: &T) -> Result<bool> {
        Ok(self.list()?.contains(item))
    }

    /// Add or remove `item`; returns whether it is a favorite afterwards
    pub fn toggle(&self, item: T) -> Result<bool> {
        let mut items = self.list()?;
        let now_favorite = if let Some(pos) = items.iter().position(|i| *i == item) {
            items.remove(pos);
            false
        } else {
            items.push(item);
            true
        };
        write_list(self.store, self.key, &items)?;
        Ok(now_favorite)
    }

    pub fn remove(&self, item: &T) -> Result<()> {
        let mut items = self.list()?;
        let before = items.len();
        items.retain(|i| i != item);
        if items.len() != before {
            write_list(self.store, self.key, &items)?;
        }
        Ok(())
    }
}

/// A place the user saved from city search
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedLocation {
    pub name: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub country: String,
    pub lat: f64,
    pub lon: f64,
}

impl SavedLocation {
    /// Weather query for this location, `lat,lon`
    pub fn query(&self) -> String {
        format!("{},{}", self.lat, self.lon)
    }

    fn same_place(&self, other: &SavedLocation) -> bool {
        self.name == other.name && self.region == other.region && self.country == other.country
    }
}

/// Saved locations under `savedLocations`
pub struct SavedLocations<'a> {
    store: &'a dyn KeyValueStore,
}

impl<'a> SavedLocations<'a> {
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        SavedLocations { store }
    }

    pub fn list(&self) -> Result<Vec<SavedLocation>> {
        read_list(self.store, SAVED_LOCATIONS_KEY)
    }

    /// Append `location`; returns false if the same place is already saved
    pub fn add(&self, location: SavedLocation) -> Result<bool> {
        let mut locations = self.list()?;
        if locations.iter().any(|l| l.same_place(&location)) {
            return Ok(false);
        }
        locations.push(location);
        write_list(self.store, SAVED_LOCATIONS_KEY, &locations)?;
        Ok(true)
    }

    /// Remove every location called `name`
    pub fn remove(&self, name: &str) -> Result<usize> {
        let mut locations = self.list()?;
        let before = locations.len();
        locations.retain(|l| l.name != name);
        let removed = before - locations.len();
        if removed > 0 {
            write_list(self.store, SAVED_LOCATIONS_KEY, &locations)?;
        }
        Ok(removed)
    }
}
