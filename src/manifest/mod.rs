// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

//! Text-level HLS manifest handling. Playlists are never parsed into an
//! object model; tags are matched as plain line prefixes.

pub mod resolve;
pub mod sanitize;
pub mod variant;

pub use resolve::resolve_uris;
pub use sanitize::sanitize;
pub use variant::{is_master_playlist, select_variant};

pub const STREAM_INF_TAG: &str = "#EXT-X-STREAM-INF";

/// A line that carries a URI reference rather than a tag or padding.
pub(crate) fn is_uri_line(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && !line.starts_with('#')
}
