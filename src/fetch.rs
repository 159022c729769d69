// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::config::HttpConfig;

/// A playlist body together with the URL it was finally served from.
#[derive(Debug, Clone)]
pub struct FetchedPlaylist {
    pub url: Url,
    pub body: String,
}

#[async_trait]
pub trait PlaylistFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedPlaylist>;
}

#[async_trait]
impl<T: PlaylistFetcher + ?Sized> PlaylistFetcher for Arc<T> {
    async fn fetch(&self, url: &Url) -> Result<FetchedPlaylist> {
        (**self).fetch(url).await
    }
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_bytes: usize,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .with_context(|| "Failed to build HTTP client")?;

        Ok(Self {
            client,
            max_bytes: config.max_manifest_bytes,
        })
    }
}

#[async_trait]
impl PlaylistFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPlaylist> {
        debug!("Fetching playlist: {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        if !response.status().is_success() {
            anyhow::bail!(
                "HTTP request for {} failed with status: {}",
                url,
                response.status()
            );
        }

        let final_url = response.url().clone();
        let mut body = Vec::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.with_context(|| "Failed to read response chunk")?;
            if body.len() + chunk.len() > self.max_bytes {
                anyhow::bail!(
                    "Playlist at {} exceeds {} bytes",
                    final_url,
                    self.max_bytes
                );
            }
            body.extend_from_slice(&chunk);
        }

        let body = String::from_utf8(body)
            .with_context(|| format!("Playlist at {} is not valid UTF-8", final_url))?;

        debug!("Fetched {} bytes from {}", body.len(), final_url);

        Ok(FetchedPlaylist {
            url: final_url,
            body,
        })
    }
}
