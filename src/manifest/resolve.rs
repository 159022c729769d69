// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use tracing::debug;
use url::Url;

use super::is_uri_line;

/// Rewrite every URI line of `body` to an absolute URL against `base`.
///
/// Tag lines and blank lines are copied through. A line that cannot be
/// joined onto `base` is also copied through untouched, so this never fails.
pub fn resolve_uris(body: &str, base: &Url) -> String {
    let mut resolved: Vec<String> = Vec::new();

    for line in body.lines() {
        if !is_uri_line(line) {
            resolved.push(line.to_string());
            continue;
        }

        match base.join(line.trim()) {
            Ok(url) => resolved.push(url.to_string()),
            Err(e) => {
                debug!("Leaving unresolvable playlist line {:?}: {}", line, e);
                resolved.push(line.to_string());
            }
        }
    }

    let mut output = resolved.join("\n");
    if body.ends_with('\n') {
        output.push('\n');
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/videos/2024/").unwrap()
    }

    #[test]
    fn relative_segment_is_joined_onto_base() {
        assert_eq!(
            resolve_uris("seg001.ts", &base()),
            "https://example.com/videos/2024/seg001.ts"
        );
    }

    #[test]
    fn tags_and_blank_lines_pass_through() {
        let body = "#EXTM3U\n#EXTINF:10.0,\nseg001.ts\n\n#EXT-X-ENDLIST\n";
        let resolved = resolve_uris(body, &base());
        assert_eq!(
            resolved,
            "#EXTM3U\n#EXTINF:10.0,\nhttps://example.com/videos/2024/seg001.ts\n\n#EXT-X-ENDLIST\n"
        );
    }

    #[test]
    fn absolute_and_root_relative_references() {
        let body = "https://cdn.example.net/a.ts\n/other/b.ts\n../c.ts";
        let resolved = resolve_uris(body, &base());
        assert_eq!(
            resolved,
            "https://cdn.example.net/a.ts\nhttps://example.com/other/b.ts\nhttps://example.com/videos/c.ts"
        );
    }

    #[test]
    fn base_with_filename_resolves_against_its_directory() {
        let base = Url::parse("https://example.com/20240101/abc/index.m3u8").unwrap();
        assert_eq!(
            resolve_uris("hls/mixed.m3u8", &base),
            "https://example.com/20240101/abc/hls/mixed.m3u8"
        );
    }

    #[test]
    fn unparseable_line_is_left_alone() {
        let body = "#EXTINF:4,\nhttp://[broken\nok.ts";
        let resolved = resolve_uris(body, &base());
        assert_eq!(
            resolved,
            "#EXTINF:4,\nhttp://[broken\nhttps://example.com/videos/2024/ok.ts"
        );
    }

    #[test]
    fn crlf_bodies_are_normalised() {
        let resolved = resolve_uris("#EXTM3U\r\nseg.ts\r\n", &base());
        assert_eq!(resolved, "#EXTM3U\nhttps://example.com/videos/2024/seg.ts\n");
    }
}
