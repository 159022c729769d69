// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::warn;

use crate::constants::{HISTORY_KEY_PREFIX, PROGRESS_SAVE_INTERVAL};

/// Plain string key-value persistence used for watch history.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    fn keys(&self) -> Result<Vec<String>>;
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredValue {
    key: String,
    value: String,
}

/// One JSON file per key, named by a hash of the key.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir).with_context(|| {
                format!("Failed to create history directory: {}", dir.display())
            })?;
        }
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        let hash = format!("{:x}", hasher.finalize())[..16].to_string();
        self.dir.join(format!("{}.json", hash))
    }

    fn read(&self, path: &Path) -> Result<StoredValue> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read history file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse history file: {}", path.display()))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(self.read(&path)?.value))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        let stored = StoredValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        let content = serde_json::to_string_pretty(&stored)
            .with_context(|| "Failed to serialize history value")?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write history file: {}", path.display()))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove history file: {}", path.display()))?;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read history directory: {}", self.dir.display()))?;

        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            match self.read(&path) {
                Ok(stored) => keys.push(stored.key),
                Err(e) => warn!("Skipping unreadable history entry: {:#}", e),
            }
        }

        keys.sort();
        Ok(keys)
    }
}

/// Where the viewer stopped in a title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchProgress {
    pub title: String,
    #[serde(default)]
    pub episode: Option<String>,
    #[serde(default)]
    pub server: Option<String>,
    pub position_secs: f64,
    pub duration_secs: f64,
    pub updated_at: DateTime<Utc>,
}

impl WatchProgress {
    pub fn new(title: impl Into<String>, position_secs: f64, duration_secs: f64) -> Self {
        Self {
            title: title.into(),
            episode: None,
            server: None,
            position_secs,
            duration_secs,
            updated_at: Utc::now(),
        }
    }

    pub fn fraction_watched(&self) -> f64 {
        if self.duration_secs <= 0.0 {
            return 0.0;
        }
        (self.position_secs / self.duration_secs).clamp(0.0, 1.0)
    }
}

pub fn history_key(title: &str) -> String {
    format!("{}{}", HISTORY_KEY_PREFIX, title)
}

pub struct WatchHistory<S> {
    store: S,
}

impl<S: KeyValueStore> WatchHistory<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn get(&self, title: &str) -> Result<Option<WatchProgress>> {
        match self.store.get(&history_key(title))? {
            Some(raw) => Ok(Some(
                serde_json::from_str(&raw).with_context(|| "Failed to parse watch progress")?,
            )),
            None => Ok(None),
        }
    }

    pub fn record(&self, progress: &WatchProgress) -> Result<()> {
        let raw = serde_json::to_string(progress)
            .with_context(|| "Failed to serialize watch progress")?;
        self.store.set(&history_key(&progress.title), &raw)
    }

    pub fn remove(&self, title: &str) -> Result<()> {
        self.store.remove(&history_key(title))
    }

    /// All recorded titles, most recently watched first.
    pub fn list(&self) -> Result<Vec<WatchProgress>> {
        let mut entries = Vec::new();
        for key in self.store.keys()? {
            let Some(title) = key.strip_prefix(HISTORY_KEY_PREFIX) else {
                continue;
            };
            match self.get(title) {
                Ok(Some(progress)) => entries.push(progress),
                Ok(None) => {}
                Err(e) => warn!("Skipping history for {}: {:#}", title, e),
            }
        }
        entries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(entries)
    }
}

/// Gates progress saves so the player callback can fire freely.
#[derive(Debug, Clone)]
pub struct ProgressThrottle {
    interval: Duration,
    last_saved: Option<Instant>,
}

impl Default for ProgressThrottle {
    fn default() -> Self {
        Self::new(PROGRESS_SAVE_INTERVAL)
    }
}

impl ProgressThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_saved: None,
        }
    }

    pub fn should_save(&mut self, now: Instant) -> bool {
        match self.last_saved {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last_saved = Some(now);
                true
            }
        }
    }

    /// Forget the last save, e.g. when switching episodes.
    pub fn reset(&mut self) {
        self.last_saved = None;
    }
}
