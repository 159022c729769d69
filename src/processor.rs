// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::{CachedPlaylist, CleanupReport, PlaylistCache, derive_key};
use crate::config::Config;
use crate::fetch::{HttpFetcher, PlaylistFetcher};
use crate::manifest::{is_master_playlist, resolve_uris, sanitize, select_variant};

pub const DEFAULT_MAX_VARIANT_DEPTH: usize = 5;

/// Outcome of a successful pipeline run.
#[derive(Debug, Clone)]
pub struct ProcessedPlaylist {
    pub source_url: String,
    /// The media playlist that was actually cached
    pub media_url: Url,
    /// Number of master playlists descended through
    pub variant_depth: usize,
    pub cached: CachedPlaylist,
}

struct MediaPlaylist {
    url: Url,
    body: String,
    depth: usize,
}

pub struct PlaylistProcessor<F> {
    fetcher: F,
    cache: PlaylistCache,
    max_variant_depth: usize,
}

impl PlaylistProcessor<HttpFetcher> {
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config.http)?;
        let cache = PlaylistCache::from_config(&config.cache)?;
        Ok(Self::new(fetcher, cache).with_max_variant_depth(config.playlist.max_variant_depth))
    }
}

impl<F: PlaylistFetcher> PlaylistProcessor<F> {
    pub fn new(fetcher: F, cache: PlaylistCache) -> Self {
        Self {
            fetcher,
            cache,
            max_variant_depth: DEFAULT_MAX_VARIANT_DEPTH,
        }
    }

    pub fn with_max_variant_depth(mut self, depth: usize) -> Self {
        self.max_variant_depth = depth;
        self
    }

    pub fn cache(&self) -> &PlaylistCache {
        &self.cache
    }

    /// Expire old cache entries. Safe to schedule on its own.
    pub async fn cleanup(&self) -> CleanupReport {
        self.cache.cleanup().await
    }

    /// Turn a remote playlist URL into something the player can open.
    ///
    /// Returns the `file://` URI of the cleaned, cached media playlist, or
    /// `url` itself when any step fails.
    pub async fn process_playlist(&self, url: &str) -> String {
        match self.try_process_playlist(url).await {
            Ok(processed) => processed.cached.uri,
            Err(e) => {
                warn!(
                    "Playlist processing failed for {}, using remote URL: {:#}",
                    url, e
                );
                url.to_string()
            }
        }
    }

    pub async fn try_process_playlist(&self, url: &str) -> Result<ProcessedPlaylist> {
        let report = self.cleanup().await;
        debug!(?report, "Cache cleanup finished");

        let media = self.fetch_media_playlist(url).await?;
        let body = sanitize(&media.body);
        let key = derive_key(media.url.as_str());
        let cached = self.cache.write(&key, &body).await?;

        info!(
            "Cached {} as {} ({} bytes)",
            media.url,
            cached.key,
            body.len()
        );

        Ok(ProcessedPlaylist {
            source_url: url.to_string(),
            media_url: media.url,
            variant_depth: media.depth,
            cached,
        })
    }

    /// Like [`process_playlist`](Self::process_playlist), but yields `None`
    /// if another request was started on `tracker` while this one ran.
    pub async fn process_latest(&self, tracker: &RequestTracker, url: &str) -> Option<String> {
        let token = tracker.begin();
        let uri = self.process_playlist(url).await;
        if tracker.is_current(token) {
            Some(uri)
        } else {
            debug!("Discarding superseded playlist result for {}", url);
            None
        }
    }

    async fn fetch_media_playlist(&self, url: &str) -> Result<MediaPlaylist> {
        let mut current =
            Url::parse(url).with_context(|| format!("Invalid playlist URL: {}", url))?;
        let mut depth = 0;

        loop {
            let fetched = self.fetcher.fetch(&current).await?;
            let resolved = resolve_uris(&fetched.body, &fetched.url);

            if !is_master_playlist(&resolved) {
                return Ok(MediaPlaylist {
                    url: fetched.url,
                    body: resolved,
                    depth,
                });
            }

            if depth >= self.max_variant_depth {
                anyhow::bail!(
                    "Master playlists nested deeper than {} levels at {}",
                    self.max_variant_depth,
                    fetched.url
                );
            }

            let variant = select_variant(&resolved).ok_or_else(|| {
                anyhow::anyhow!("Master playlist {} lists no variants", fetched.url)
            })?;
            debug!("Master playlist {} -> variant {}", fetched.url, variant);

            current = Url::parse(variant)
                .with_context(|| format!("Invalid variant URL: {}", variant))?;
            depth += 1;
        }
    }
}

/// Opaque handle for one playlist request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

/// Tracks which playlist request is the latest, so results of requests the
/// user has already moved past can be dropped.
#[derive(Debug, Default)]
pub struct RequestTracker {
    generation: AtomicU64,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> RequestToken {
        RequestToken(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.generation.load(Ordering::SeqCst) == token.0
    }
}
