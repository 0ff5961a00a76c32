#![deny(warnings)]

//! Persistence layer: a single named snapshot slot holding the game state.
//!
//! Snapshots are JSON documents. Restoring overlays the saved top-level
//! fields onto a fresh default state, so snapshots written by older layouts
//! (for example without a `debt` field) still load.

use anyhow::{anyhow, Context, Result};
use baker_core::GameState;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Returns the default snapshot path used for local saves.
pub fn default_save_path() -> &'static str {
    "./saves/baker.json"
}

/// Serialize a state into snapshot text.
pub fn snapshot(state: &GameState) -> Result<String> {
    serde_json::to_string_pretty(state).context("serializing game state")
}

/// Rebuild a state from snapshot text.
///
/// Fields present in the snapshot replace those of `defaults`; absent or
/// `null` fields keep their default values.
pub fn restore(text: &str, defaults: &GameState) -> Result<GameState> {
    let saved: Value = serde_json::from_str(text).context("parsing snapshot")?;
    let Value::Object(saved) = saved else {
        return Err(anyhow!("snapshot is not a JSON object"));
    };
    let mut merged = match serde_json::to_value(defaults)? {
        Value::Object(map) => map,
        _ => return Err(anyhow!("default state did not serialize to an object")),
    };
    for (key, value) in saved {
        if !value.is_null() {
            merged.insert(key, value);
        }
    }
    serde_json::from_value(Value::Object(merged)).context("decoding snapshot fields")
}

/// A key-value slot that holds at most one snapshot.
pub trait SnapshotStore {
    /// Raw snapshot text, or `None` when the slot is empty.
    fn read_slot(&self) -> Result<Option<String>>;
    /// Overwrite the slot.
    fn write_slot(&mut self, text: &str) -> Result<()>;
    /// Empty the slot.
    fn clear(&mut self) -> Result<()>;

    /// Load the saved state, if any.
    fn load(&self, defaults: &GameState) -> Result<Option<GameState>> {
        match self.read_slot()? {
            Some(text) => restore(&text, defaults).map(Some),
            None => Ok(None),
        }
    }

    /// Persist the state, replacing any previous snapshot.
    fn save(&mut self, state: &GameState) -> Result<()> {
        let text = snapshot(state)?;
        self.write_slot(&text)
    }
}

/// In-memory slot, used by tests and headless runs that should not touch disk.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    slot: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-filled slot.
    pub fn with_snapshot(text: impl Into<String>) -> Self {
        Self {
            slot: Some(text.into()),
        }
    }

    pub fn contents(&self) -> Option<&str> {
        self.slot.as_deref()
    }
}

impl SnapshotStore for MemoryStore {
    fn read_slot(&self) -> Result<Option<String>> {
        Ok(self.slot.clone())
    }

    fn write_slot(&mut self, text: &str) -> Result<()> {
        self.slot = Some(text.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.slot = None;
        Ok(())
    }
}

/// Slot backed by one JSON file on disk.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new(default_save_path())
    }
}

impl SnapshotStore for FileStore {
    fn read_slot(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("reading snapshot {}", self.path.display()))?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(text))
    }

    fn write_slot(&mut self, text: &str) -> Result<()> {
        // Ensure directory exists
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, text)
            .with_context(|| format!("writing snapshot {}", self.path.display()))?;
        debug!(path = %self.path.display(), bytes = text.len(), "snapshot saved");
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
            info!(path = %self.path.display(), "snapshot cleared");
        }
        Ok(())
    }
}
