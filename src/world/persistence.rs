//! Persistence of the observer-unlock flag
//!
//! The flag is the only state that outlives a run. The world talks to it
//! through [`UnlockStore`] so hosts can back it with whatever they have.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::error::Result;

pub trait UnlockStore {
    /// Whether the observer was unlocked in a previous run
    fn load(&self) -> bool;

    fn save(&mut self, unlocked: bool) -> Result<()>;
}

/// Volatile store, the default when no host storage is wired in
#[derive(Debug, Clone, Default)]
pub struct MemoryUnlockStore {
    unlocked: bool,
}

impl MemoryUnlockStore {
    pub fn new(unlocked: bool) -> Self {
        Self { unlocked }
    }
}

impl UnlockStore for MemoryUnlockStore {
    fn load(&self) -> bool {
        self.unlocked
    }

    fn save(&mut self, unlocked: bool) -> Result<()> {
        self.unlocked = unlocked;
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct UnlockRecord {
    observer_unlocked: bool,
}

/// Small JSON file holding `{"observer_unlocked": bool}`
#[derive(Debug, Clone)]
pub struct FileUnlockStore {
    path: PathBuf,
}

impl FileUnlockStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl UnlockStore for FileUnlockStore {
    /// Missing or unreadable files count as locked
    fn load(&self) -> bool {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(_) => return false,
        };
        match serde_json::from_str::<UnlockRecord>(&content) {
            Ok(record) => record.observer_unlocked,
            Err(e) => {
                tracing::warn!("Ignoring malformed unlock file {}: {}", self.path.display(), e);
                false
            }
        }
    }

    fn save(&mut self, unlocked: bool) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&UnlockRecord {
            observer_unlocked: unlocked,
        })?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}
