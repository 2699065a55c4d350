/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

//! Problems that were tolerated while decoding.
//!
//! Real-world streams are frequently slightly broken. Rather than failing an entire
//! multi-hour presentation because of one bad segment, the decoder keeps going and records
//! what it had to work around. The resulting list is returned next to the decoded data.

use super::{
    object::MergeError,
    segment::SegmentKind,
};
use thiserror::Error as ThisError;

/// A tolerated problem together with the timestamp of the segment it was found in.
#[derive(Clone, Debug, PartialEq)]
pub struct Finding {
    /// Presentation timestamp, in milliseconds, of the offending segment.
    pub pts: u32,
    pub issue: Issue,
}

impl Finding {

    pub fn new(pts: u32, issue: Issue) -> Self {
        Self { pts, issue }
    }
}

/// Describes a tolerated problem.
#[derive(ThisError, Clone, Debug, PartialEq)]
pub enum Issue {
    #[error("composition declares {expected} objects but only {read} fit in its payload")]
    TruncatedCompositionObjects {
        expected: u8,
        read: usize,
    },
    #[error("composition object {object_id} is cropped but its crop rectangle is missing")]
    TruncatedCrop {
        object_id: u16,
    },
    #[error("window definition declares {expected} windows but only {read} fit in its payload")]
    TruncatedWindows {
        expected: u8,
        read: usize,
    },
    #[error("window {id} has zero dimensions ({width}x{height})")]
    ZeroSizedWindow {
        id: u8,
        width: u16,
        height: u16,
    },
    #[error("window {id} starts at ({x}, {y}), outside the {screen_width}x{screen_height} screen")]
    WindowOutsideScreen {
        id: u8,
        x: u16,
        y: u16,
        screen_width: u16,
        screen_height: u16,
    },
    #[error("window {id} extends beyond the {screen_width}x{screen_height} screen")]
    WindowExceedsScreen {
        id: u8,
        screen_width: u16,
        screen_height: u16,
    },
    #[error("object {id} has zero dimensions ({width}x{height})")]
    ZeroSizedObject {
        id: u16,
        width: u16,
        height: u16,
    },
    #[error("object {id} ({width}x{height}) is larger than the {screen_width}x{screen_height} screen")]
    ObjectExceedsScreen {
        id: u16,
        width: u16,
        height: u16,
        screen_width: u16,
        screen_height: u16,
    },
    #[error("object {object_id} ended after {accumulated} bytes but declared {declared}")]
    ObjectLengthMismatch {
        object_id: u16,
        declared: u32,
        accumulated: u32,
    },
    #[error("skipped malformed {kind}: {reason}")]
    SegmentSkipped {
        kind: SegmentKind,
        reason: String,
    },
    #[error("object sequence could not be merged: {0}")]
    SequenceMerge(MergeError),
    #[error("object {object_id} was never ended and has been closed at end of stream")]
    IncompleteObject {
        object_id: u16,
    },
    #[error("display set ended without an end segment")]
    MissingEnd,
    #[error("end segment carries {size} unexpected payload bytes")]
    EndWithPayload {
        size: u16,
    },
    #[error("segment declares {declared} payload bytes but the stream ends after {available}")]
    TruncatedPayload {
        declared: u16,
        available: usize,
    },
    #[error("composition object {object_id} references undefined window {window_id}")]
    UnknownWindowReference {
        object_id: u16,
        window_id: u8,
    },
}
