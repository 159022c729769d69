// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::{Duration, SystemTime};
use tokio::fs as async_fs;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::CacheConfig;

pub const PLAYLIST_EXTENSION: &str = "m3u8";
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

const NO_DATE_TOKEN: &str = "nodate";
const NO_PARENT_SEGMENT: &str = "playlist";

static DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+").unwrap());

/// Derive the cache key for a playlist URL.
///
/// The key is `{date}_{parent}`: the first run of exactly eight digits in the
/// path, and the path segment just before the file name. Distinct URLs that
/// share both parts map to the same key and overwrite each other.
pub fn derive_key(url: &str) -> String {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };

    let token = DIGIT_RUN
        .find_iter(&path)
        .map(|m| m.as_str())
        .find(|run| run.len() == 8)
        .unwrap_or(NO_DATE_TOKEN);

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let parent = if segments.len() >= 2 {
        segments[segments.len() - 2]
    } else {
        NO_PARENT_SEGMENT
    };

    format!("{}_{}", token, parent)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// A manifest that has been written to the cache directory.
#[derive(Debug, Clone, Serialize)]
pub struct CachedPlaylist {
    pub key: String,
    pub path: PathBuf,
    /// `file://` URI handed to the player
    pub uri: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub scanned: usize,
    pub removed: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheEntryInfo {
    pub key: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PlaylistCache {
    cache_dir: PathBuf,
    retention: Duration,
}

impl PlaylistCache {
    pub fn new(cache_dir: impl Into<PathBuf>, retention: Duration) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            retention,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        Ok(Self::new(config.resolve_dir()?, config.retention()))
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.{}", key, PLAYLIST_EXTENSION))
    }

    async fn ensure_cache_dir_exists(&self) -> Result<()> {
        async_fs::create_dir_all(&self.cache_dir)
            .await
            .with_context(|| {
                format!(
                    "Failed to create cache directory: {}",
                    self.cache_dir.display()
                )
            })
    }

    /// Store `content` under `key`, replacing any previous entry.
    ///
    /// The file is written to a unique staging file beside its final name and
    /// renamed into place, so a reader only ever sees a complete manifest.
    pub async fn write(&self, key: &str, content: &str) -> Result<CachedPlaylist> {
        self.ensure_cache_dir_exists().await?;

        let path = self.entry_path(key);
        let cache_dir = self.cache_dir.clone();
        let target = path.clone();
        let prefix = format!(".{}.", key);
        let content = content.to_owned();

        // Each writer stages into its own file, so concurrent writes of one
        // key never share a half-written file.
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut staging = tempfile::Builder::new()
                .prefix(&prefix)
                .suffix(".tmp")
                .tempfile_in(&cache_dir)
                .with_context(|| {
                    format!("Failed to create staging file in {}", cache_dir.display())
                })?;
            staging
                .write_all(content.as_bytes())
                .with_context(|| format!("Failed to write cache file: {}", target.display()))?;
            staging.persist(&target).with_context(|| {
                format!("Failed to move cache file into place: {}", target.display())
            })?;
            Ok(())
        })
        .await
        .with_context(|| "Cache write task failed")??;

        let path = async_fs::canonicalize(&path)
            .await
            .with_context(|| format!("Failed to resolve cache path: {}", path.display()))?;
        let uri = Url::from_file_path(&path)
            .map_err(|_| anyhow::anyhow!("Cache path is not absolute: {}", path.display()))?
            .to_string();

        debug!("Cached playlist {} at {}", key, path.display());

        Ok(CachedPlaylist {
            key: key.to_string(),
            path,
            uri,
        })
    }

    /// Delete cached manifests older than the retention window.
    ///
    /// Never fails: per-file problems are logged, counted and skipped.
    pub async fn cleanup(&self) -> CleanupReport {
        self.cleanup_at(SystemTime::now()).await
    }

    pub async fn cleanup_at(&self, now: SystemTime) -> CleanupReport {
        let mut report = CleanupReport::default();

        let mut entries = match async_fs::read_dir(&self.cache_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Cache directory {} does not exist yet", self.cache_dir.display());
                return report;
            }
            Err(e) => {
                warn!(
                    "Failed to read cache directory {}: {}",
                    self.cache_dir.display(),
                    e
                );
                return report;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!("Stopped scanning {}: {}", self.cache_dir.display(), e);
                    break;
                }
            };

            let path = entry.path();
            if !is_playlist_file(&path) {
                continue;
            }
            report.scanned += 1;

            let modified = match entry.metadata().await.and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    warn!("Failed to stat {}: {}", path.display(), e);
                    report.failed += 1;
                    continue;
                }
            };

            // mtimes in the future count as fresh
            let age = now.duration_since(modified).unwrap_or_default();
            if age <= self.retention {
                continue;
            }

            match async_fs::remove_file(&path).await {
                Ok(()) => {
                    debug!("Removed expired playlist {}", path.display());
                    report.removed += 1;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    warn!("Failed to remove {}: {}", path.display(), e);
                    report.failed += 1;
                }
            }
        }

        if report.removed > 0 {
            info!(
                "Cache cleanup removed {} of {} playlists",
                report.removed, report.scanned
            );
        }

        report
    }

    pub async fn list(&self) -> Result<Vec<CacheEntryInfo>> {
        let mut result = Vec::new();

        let mut entries = match async_fs::read_dir(&self.cache_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(result),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!(
                        "Failed to read cache directory: {}",
                        self.cache_dir.display()
                    )
                });
            }
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .with_context(|| "Failed to read cache directory entry")?
        {
            let path = entry.path();
            if !is_playlist_file(&path) {
                continue;
            }
            let metadata = entry
                .metadata()
                .await
                .with_context(|| format!("Failed to stat {}", path.display()))?;
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            let key = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();

            result.push(CacheEntryInfo {
                key,
                path,
                size_bytes: metadata.len(),
                modified: DateTime::<Utc>::from(modified),
            });
        }

        result.sort_by(|a, b| b.modified.cmp(&a.modified));
        Ok(result)
    }

    /// Remove every cached manifest, returning how many were deleted.
    pub async fn clear(&self) -> Result<usize> {
        let entries = self.list().await?;
        let mut removed = 0;
        for entry in entries {
            async_fs::remove_file(&entry.path)
                .await
                .with_context(|| format!("Failed to remove {}", entry.path.display()))?;
            removed += 1;
        }
        Ok(removed)
    }
}

fn is_playlist_file(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(PLAYLIST_EXTENSION)
}
