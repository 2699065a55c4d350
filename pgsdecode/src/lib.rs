/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

//! Decodes Presentation Graphics Stream (PGS) subtitles.
//!
//! # Overview
//!
//! A PGS bitstream is a flat sequence of segments. Segments are grouped into display sets
//! (DS), and display sets are grouped into epochs. This crate reads the bitstream, reassembles
//! fragmented objects, decodes their run-length encoded bitmaps, and maps them through their
//! palettes into raster images. It also derives the on-screen time window of every display set
//! that starts an epoch, which is what a subtitle converter needs to produce timed text.
//!
//! The layers, from the bottom up:
//!
//! 1. [`segment`]: segment framing and per-segment payload decoding.
//! 2. [`object`]: merging of multi-part object definitions.
//! 3. [`rle`]: the run-length encoding used by object data.
//! 4. [`bitmap`]: palette mapping and raster encoding.
//! 5. [`displayset`]: the epoch engine that assembles display sets.
//! 6. [`presentation`]: timing of the decoded display sets.
//!
//! Problems that do not prevent decoding are never swallowed silently. They are collected as
//! [`finding::Finding`] values alongside the decoded output.


pub mod bitmap;
pub mod config;
pub mod displayset;
pub mod finding;
pub mod object;
pub mod presentation;
pub mod rle;
pub mod segment;

pub use config::{DecodeOptions, ScreenSize, TruncationPolicy};
pub use displayset::{Decoded, DisplaySet, EpochEngine, ReadDisplaySetExt};
pub use finding::{Finding, Issue};
pub use presentation::{Cue, Presentation};

/// Ticks of the 90 kHz stream clock per millisecond.
pub const TICKS_PER_MS: u32 = 90;

/// Converts a millisecond timestamp into the `HH:MM:SS,mmm` notation used by SubRip.
pub fn format_timestamp(ms: u32) -> String {

    let hours = ms / 3_600_000;
    let minutes = (ms / 60_000) % 60;
    let seconds = (ms / 1_000) % 60;
    let millis = ms % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}
