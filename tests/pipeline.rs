// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use async_trait::async_trait;
use hlscache::cache::DEFAULT_RETENTION;
use hlscache::fetch::FetchedPlaylist;
use hlscache::{PlaylistCache, PlaylistFetcher, PlaylistProcessor, derive_key};
use std::collections::HashMap;
use url::Url;

/// Serves fixed bodies and follows one configured redirect.
struct StaticServer {
    pages: HashMap<&'static str, &'static str>,
    redirects: HashMap<&'static str, &'static str>,
}

#[async_trait]
impl PlaylistFetcher for StaticServer {
    async fn fetch(&self, url: &Url) -> Result<FetchedPlaylist> {
        let target = self
            .redirects
            .get(url.as_str())
            .copied()
            .unwrap_or(url.as_str());
        let body = self
            .pages
            .get(target)
            .ok_or_else(|| anyhow::anyhow!("404 Not Found: {}", target))?;
        Ok(FetchedPlaylist {
            url: Url::parse(target)?,
            body: body.to_string(),
        })
    }
}

const ENTRY: &str = "https://catalog.example.com/watch/ep01.m3u8";
const MASTER: &str = "https://vod.example.com/20240611/k3J9xQ/index.m3u8";
const MEDIA: &str = "https://vod.example.com/20240611/k3J9xQ/1080p/hls/mixed.m3u8";

fn server() -> StaticServer {
    let mut pages = HashMap::new();
    pages.insert(
        MASTER,
        "#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=5000000,RESOLUTION=1920x1080\n1080p/hls/mixed.m3u8\n",
    );
    pages.insert(
        MEDIA,
        "#EXTM3U\n\
         #EXT-X-VERSION:3\n\
         #EXT-X-TARGETDURATION:8\n\
         #EXTINF:8.0,\n\
         /convertv7/20240611/k3J9xQ/1080p/hls/seg-0.ts\n\
         #EXT-X-DISCONTINUITY\n\
         #EXTINF:8.0,\n\
         seg-1.ts\n\
         \n\
         \n\
         \n\
         #EXT-X-ENDLIST\n",
    );

    let mut redirects = HashMap::new();
    redirects.insert(ENTRY, MASTER);

    StaticServer { pages, redirects }
}

#[tokio::test]
async fn redirected_master_is_cached_under_media_key() {
    let dir = tempfile::tempdir().unwrap();
    let cache = PlaylistCache::new(dir.path(), DEFAULT_RETENTION);
    let processor = PlaylistProcessor::new(server(), cache);

    let processed = processor.try_process_playlist(ENTRY).await.unwrap();

    assert_eq!(processed.source_url, ENTRY);
    assert_eq!(processed.media_url.as_str(), MEDIA);
    assert_eq!(processed.cached.key, derive_key(MEDIA));
    assert_eq!(processed.cached.key, "20240611_hls");

    let content = std::fs::read_to_string(&processed.cached.path).unwrap();
    assert_eq!(
        content,
        "#EXTM3U\n\
         #EXT-X-VERSION:3\n\
         #EXT-X-TARGETDURATION:8\n\
         #EXTINF:8.0,\n\
         https://vod.example.com/20240611/k3J9xQ/1080p/hls/seg-0.ts\n\
         #EXTINF:8.0,\n\
         https://vod.example.com/20240611/k3J9xQ/1080p/hls/seg-1.ts\n\
         \n\
         #EXT-X-ENDLIST"
    );

    let uri = processor.process_playlist(ENTRY).await;
    assert_eq!(uri, processed.cached.uri);
}

#[tokio::test]
async fn missing_variant_falls_back_to_entry_url() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = server();
    server.pages.remove(MEDIA);
    let cache = PlaylistCache::new(dir.path(), DEFAULT_RETENTION);
    let processor = PlaylistProcessor::new(server, cache);

    assert_eq!(processor.process_playlist(ENTRY).await, ENTRY);
    assert!(processor.try_process_playlist(ENTRY).await.is_err());
}
