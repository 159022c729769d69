// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use regex::Regex;
use std::sync::LazyLock;
use tracing::trace;

// A discontinuity that opens with a METHOD=NONE key, through the next
// discontinuity.
static NONE_KEY_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ms)^#EXT-X-DISCONTINUITY[ \t\r]*\n#EXT-X-KEY:METHOD=NONE.*?^#EXT-X-DISCONTINUITY[ \t\r]*$\n?",
    )
    .unwrap()
});

// 10 to 18 EXTINF/URI pairs bracketed by discontinuities.
static SHORT_SEGMENT_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^#EXT-X-DISCONTINUITY[ \t\r]*\n(?:#EXTINF:[^\n]*\n[^#\n][^\n]*\n){10,18}#EXT-X-DISCONTINUITY[ \t\r]*$\n?",
    )
    .unwrap()
});

static BARE_DISCONTINUITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#EXT-X-DISCONTINUITY[ \t\r]*$\n?").unwrap());

static BLANK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n(?:[ \t\r]*\n){2,}").unwrap());

const BROKEN_PATH_SEGMENT: &str = "/convertv7/";

/// One text-repair step of the sanitizer.
pub struct SanitizeRule {
    pub name: &'static str,
    pub apply: fn(&str) -> String,
}

/// Applied top to bottom; later rules clean up what earlier ones leave.
pub const RULES: &[SanitizeRule] = &[
    SanitizeRule {
        name: "unencrypted-key-block",
        apply: strip_unencrypted_key_blocks,
    },
    SanitizeRule {
        name: "short-segment-run",
        apply: strip_short_segment_runs,
    },
    SanitizeRule {
        name: "bare-discontinuity",
        apply: strip_discontinuities,
    },
    SanitizeRule {
        name: "broken-path-segment",
        apply: repair_broken_path_segment,
    },
    SanitizeRule {
        name: "blank-lines",
        apply: collapse_blank_lines,
    },
    SanitizeRule {
        name: "trim",
        apply: trim,
    },
];

pub fn sanitize(body: &str) -> String {
    RULES.iter().fold(body.to_string(), |text, rule| {
        let next = (rule.apply)(&text);
        if next.len() != text.len() {
            trace!(
                rule = rule.name,
                removed = text.len().saturating_sub(next.len()),
                "Sanitizer rule changed manifest"
            );
        }
        next
    })
}

pub fn strip_unencrypted_key_blocks(body: &str) -> String {
    NONE_KEY_BLOCK.replace_all(body, "").into_owned()
}

pub fn strip_short_segment_runs(body: &str) -> String {
    SHORT_SEGMENT_RUN.replace_all(body, "").into_owned()
}

pub fn strip_discontinuities(body: &str) -> String {
    BARE_DISCONTINUITY.replace_all(body, "").into_owned()
}

pub fn repair_broken_path_segment(body: &str) -> String {
    body.replace(BROKEN_PATH_SEGMENT, "/")
}

pub fn collapse_blank_lines(body: &str) -> String {
    BLANK_RUN.replace_all(body, "\n\n").into_owned()
}

pub fn trim(body: &str) -> String {
    body.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment_pairs(count: usize, prefix: &str) -> String {
        (0..count)
            .map(|i| format!("#EXTINF:1.0,\nhttps://cdn.example.com/{prefix}{i}.ts\n"))
            .collect()
    }

    #[test]
    fn unencrypted_key_block_is_removed_through_next_discontinuity() {
        let body = "#EXTM3U\n\
            #EXTINF:6.0,\nmain0.ts\n\
            #EXT-X-DISCONTINUITY\n\
            #EXT-X-KEY:METHOD=NONE\n\
            #EXTINF:2.0,\nad0.ts\n\
            #EXTINF:2.0,\nad1.ts\n\
            #EXT-X-DISCONTINUITY\n\
            #EXTINF:6.0,\nmain1.ts\n";

        let cleaned = strip_unencrypted_key_blocks(body);
        assert_eq!(
            cleaned,
            "#EXTM3U\n#EXTINF:6.0,\nmain0.ts\n#EXTINF:6.0,\nmain1.ts\n"
        );
    }

    #[test]
    fn key_block_match_is_not_greedy() {
        let body = "#EXT-X-DISCONTINUITY\n\
            #EXT-X-KEY:METHOD=NONE\nad.ts\n\
            #EXT-X-DISCONTINUITY\n\
            keep.ts\n\
            #EXT-X-DISCONTINUITY\n\
            tail.ts\n";

        let cleaned = strip_unencrypted_key_blocks(body);
        assert_eq!(cleaned, "keep.ts\n#EXT-X-DISCONTINUITY\ntail.ts\n");
    }

    #[test]
    fn short_segment_run_between_discontinuities_is_removed() {
        let body = format!(
            "#EXTINF:6.0,\nmain0.ts\n#EXT-X-DISCONTINUITY\n{}#EXT-X-DISCONTINUITY\n#EXTINF:6.0,\nmain1.ts\n",
            segment_pairs(12, "ad")
        );

        let cleaned = strip_short_segment_runs(&body);
        assert_eq!(cleaned, "#EXTINF:6.0,\nmain0.ts\n#EXTINF:6.0,\nmain1.ts\n");
    }

    #[test]
    fn runs_outside_ten_to_eighteen_pairs_survive() {
        for count in [9, 19] {
            let body = format!(
                "#EXT-X-DISCONTINUITY\n{}#EXT-X-DISCONTINUITY\n",
                segment_pairs(count, "seg")
            );
            assert_eq!(strip_short_segment_runs(&body), body, "{count} pairs");
        }
    }

    #[test]
    fn bare_discontinuities_go_but_sequence_tag_stays() {
        let body = "#EXT-X-DISCONTINUITY-SEQUENCE:3\n#EXTINF:4,\na.ts\n#EXT-X-DISCONTINUITY\n#EXTINF:4,\nb.ts\n";
        assert_eq!(
            strip_discontinuities(body),
            "#EXT-X-DISCONTINUITY-SEQUENCE:3\n#EXTINF:4,\na.ts\n#EXTINF:4,\nb.ts\n"
        );
    }

    #[test]
    fn broken_path_segment_is_repaired() {
        assert_eq!(
            repair_broken_path_segment("https://s1.example.com/convertv7/20240101/x/seg.ts"),
            "https://s1.example.com/20240101/x/seg.ts"
        );
    }

    #[test]
    fn blank_runs_collapse_to_one() {
        assert_eq!(collapse_blank_lines("a\n\nb"), "a\n\nb");
        assert_eq!(collapse_blank_lines("a\n\n\n\nb"), "a\n\nb");
        assert_eq!(collapse_blank_lines("a\n \n\t\n\nb"), "a\n\nb");
    }

    #[test]
    fn key_block_and_blank_lines_are_both_gone_after_full_pass() {
        let body = "\n#EXTM3U\n\
            #EXT-X-TARGETDURATION:6\n\
            #EXTINF:6.0,\nhttps://cdn.example.com/convertv7/main0.ts\n\
            #EXT-X-DISCONTINUITY\n\
            #EXT-X-KEY:METHOD=NONE\n\
            #EXTINF:3.0,\nhttps://cdn.example.com/ad0.ts\n\
            #EXT-X-DISCONTINUITY\n\
            \n\n\n\
            #EXTINF:6.0,\nhttps://cdn.example.com/main1.ts\n\
            #EXT-X-ENDLIST\n\n";

        let cleaned = sanitize(body);

        assert!(!cleaned.contains("METHOD=NONE"));
        assert!(!cleaned.contains("ad0.ts"));
        assert!(!cleaned.contains("#EXT-X-DISCONTINUITY"));
        assert!(!cleaned.contains("/convertv7/"));
        assert!(!cleaned.contains("\n\n\n"));
        assert!(cleaned.starts_with("#EXTM3U"));
        assert!(cleaned.ends_with("#EXT-X-ENDLIST"));
        assert!(cleaned.contains("https://cdn.example.com/main0.ts"));
    }

    #[test]
    fn clean_manifest_only_loses_outer_whitespace() {
        let body = "#EXTM3U\n#EXTINF:4,\nhttps://cdn.example.com/a.ts\n#EXT-X-ENDLIST\n";
        assert_eq!(sanitize(body), body.trim());
    }

    #[test]
    fn rules_run_in_declared_order() {
        let names: Vec<_> = RULES.iter().map(|rule| rule.name).collect();
        assert_eq!(
            names,
            [
                "unencrypted-key-block",
                "short-segment-run",
                "bare-discontinuity",
                "broken-path-segment",
                "blank-lines",
                "trim",
            ]
        );
    }
}
