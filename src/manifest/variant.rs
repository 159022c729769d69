// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use super::{STREAM_INF_TAG, is_uri_line};

pub fn is_master_playlist(body: &str) -> bool {
    body.contains(STREAM_INF_TAG)
}

/// Pick the media playlist to descend into from a master playlist.
///
/// Takes the last URI line in document order; variants are not ranked by
/// bandwidth or resolution.
pub fn select_variant(body: &str) -> Option<&str> {
    body.lines().filter(|line| is_uri_line(line)).map(str::trim).next_back()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASTER: &str = "#EXTM3U\n\
        #EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=640x360\n\
        https://example.com/A.m3u8\n\
        #EXT-X-STREAM-INF:BANDWIDTH=2000000,RESOLUTION=1280x720\n\
        https://example.com/B.m3u8\n";

    #[test]
    fn detects_master_marker() {
        assert!(is_master_playlist(MASTER));
        assert!(!is_master_playlist("#EXTM3U\n#EXTINF:4,\nseg.ts\n"));
    }

    #[test]
    fn last_listed_variant_wins() {
        assert_eq!(select_variant(MASTER), Some("https://example.com/B.m3u8"));
    }

    #[test]
    fn trailing_tags_do_not_count_as_variants() {
        let body = format!("{MASTER}\n#EXT-X-INDEPENDENT-SEGMENTS\n\n");
        assert_eq!(select_variant(&body), Some("https://example.com/B.m3u8"));
    }

    #[test]
    fn master_without_uris_has_no_selection() {
        assert_eq!(select_variant("#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=1\n"), None);
    }
}
