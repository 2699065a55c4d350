/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

//! Decoding policy.
//!
//! Streams in the wild disagree on a few details, such as whether a composition that declares
//! more objects than its payload holds should be rejected, or how long the last subtitle of an
//! epoch should remain on screen. [`DecodeOptions`] collects those decisions in one place.

/// Number of milliseconds a display set stays on screen when nothing later in the stream
/// closes it.
pub const DEFAULT_FALLBACK_DURATION_MS: u32 = 5_000;

/// Dimensions of a video frame in pixels.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ScreenSize {
    pub width: u16,
    pub height: u16,
}

impl ScreenSize {

    /// Full HD, assumed until a composition states otherwise.
    pub const HD: ScreenSize = ScreenSize { width: 1920, height: 1080 };

    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

impl Default for ScreenSize {
    fn default() -> Self { Self::HD }
}

/// What to do with a composition object list or window list that ends before its declared
/// count has been read.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TruncationPolicy {
    /// Keep the entries that could be read and report a finding.
    Degrade,
    /// Treat the segment as malformed. It is skipped like any other malformed segment.
    Reject,
}

impl Default for TruncationPolicy {
    fn default() -> Self { Self::Degrade }
}

/// Settings that control how a stream is decoded and timed.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct DecodeOptions {
    /// Added to a display set's start timestamp when no later display set ends it.
    pub fallback_duration_ms: u32,
    /// Bounds used for validation before any composition has declared its own.
    pub default_screen: ScreenSize,
    pub truncated_lists: TruncationPolicy,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            fallback_duration_ms: DEFAULT_FALLBACK_DURATION_MS,
            default_screen: ScreenSize::default(),
            truncated_lists: TruncationPolicy::default(),
        }
    }
}

impl DecodeOptions {

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fallback_duration_ms(mut self, fallback_duration_ms: u32) -> Self {
        self.fallback_duration_ms = fallback_duration_ms;
        self
    }

    pub fn with_default_screen(mut self, default_screen: ScreenSize) -> Self {
        self.default_screen = default_screen;
        self
    }

    pub fn with_truncated_lists(mut self, truncated_lists: TruncationPolicy) -> Self {
        self.truncated_lists = truncated_lists;
        self
    }
}
