// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use std::time::Duration;

/// Prefix of every watch-history key; the title follows directly.
pub const HISTORY_KEY_PREFIX: &str = "watch_history_";

/// Minimum spacing between two playback-progress saves.
pub const PROGRESS_SAVE_INTERVAL: Duration = Duration::from_millis(10_000);

/// Height over width of the video frame.
pub const VIDEO_ASPECT_RATIO: f64 = 9.0 / 16.0;

/// Height of the video surface for a screen of the given size.
///
/// In landscape the player takes half the screen width; in portrait it spans
/// the full width.
pub fn video_aspect_height(screen_width: f64, screen_height: f64) -> f64 {
    if screen_width > screen_height {
        screen_width / 2.0 * VIDEO_ASPECT_RATIO
    } else {
        screen_width * VIDEO_ASPECT_RATIO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn portrait_uses_full_width() {
        assert_eq!(video_aspect_height(1080.0, 1920.0), 607.5);
    }

    #[test]
    fn landscape_uses_half_width() {
        assert_eq!(video_aspect_height(1920.0, 1080.0), 540.0);
    }

    #[test]
    fn square_screen_counts_as_portrait() {
        assert_eq!(video_aspect_height(800.0, 800.0), 450.0);
    }
}
