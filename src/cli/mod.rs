// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use std::path::PathBuf;

use hlscache::history::{FileStore, WatchHistory};
use hlscache::{Config, HttpFetcher, PlaylistCache, PlaylistProcessor};

pub mod cache;
pub mod config;
pub mod history;
pub mod process;

pub use cache::CacheCommand;
pub use config::ConfigCommand;
pub use history::HistoryCommand;
pub use process::{KeyCommand, ProcessCommand};

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => anyhow::bail!("Invalid format: {}. Use 'text' or 'json'", s),
        }
    }
}

/// Loaded configuration plus the place it came from
pub struct CommandContext {
    pub config: Config,
    pub config_path: PathBuf,
}

impl CommandContext {
    pub fn new(config: Config, config_path: PathBuf) -> Self {
        Self {
            config,
            config_path,
        }
    }

    pub fn processor(&self) -> Result<PlaylistProcessor<HttpFetcher>> {
        PlaylistProcessor::from_config(&self.config)
    }

    pub fn cache(&self) -> Result<PlaylistCache> {
        PlaylistCache::from_config(&self.config.cache)
    }

    pub fn history(&self) -> Result<WatchHistory<FileStore>> {
        let store = FileStore::new(self.config.history.resolve_dir()?)?;
        Ok(WatchHistory::new(store))
    }
}
