// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

pub mod cache;
pub mod config;
pub mod constants;
pub mod fetch;
pub mod history;
pub mod manifest;
pub mod processor;

pub use cache::{PlaylistCache, derive_key};
pub use config::Config;
pub use constants::{
    HISTORY_KEY_PREFIX, PROGRESS_SAVE_INTERVAL, VIDEO_ASPECT_RATIO, video_aspect_height,
};
pub use fetch::{HttpFetcher, PlaylistFetcher};
pub use history::{FileStore, KeyValueStore, WatchHistory, WatchProgress};
pub use processor::{PlaylistProcessor, RequestTracker};
