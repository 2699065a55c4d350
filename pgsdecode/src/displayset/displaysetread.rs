/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

use super::{
    DisplaySet,
    super::{
        format_timestamp,
        config::DecodeOptions,
        finding::{Finding, Issue},
        object::Object,
        presentation::Presentation,
        segment::{
            ObjectDefinition,
            RawSegment,
            ReadError as SegmentReadError,
            ReadSegmentExt,
            Segment,
            SegmentBody,
        },
    },
};
use std::{io::Read, mem};
use thiserror::Error as ThisError;

pub type ReadResult<T> = Result<T, ReadError>;

/// The error type for [ReadDisplaySetExt] and [EpochEngine].
///
/// Only problems that make the rest of the stream unreadable are errors. Everything else is
/// reported as a [`Finding`].
#[derive(ThisError, Debug)]
pub enum ReadError {
    #[error("segment value error")]
    SegmentError {
        #[from]
        source: SegmentReadError,
    },
}

/// The outcome of decoding a whole stream.
#[derive(Clone, Debug, PartialEq)]
pub struct Decoded {
    pub presentation: Presentation,
    /// Every tolerated problem, in stream order.
    pub findings: Vec<Finding>,
}

/// Folds segments, one at a time and in stream order, into display sets.
///
/// The engine owns the display set being accumulated and any object whose fragments are still
/// arriving, so independent streams can be decoded by independent engines.
#[derive(Clone, Debug, Default)]
pub struct EpochEngine {
    options: DecodeOptions,
    current: DisplaySet,
    pending: Option<Object>,
    findings: Vec<Finding>,
}

impl EpochEngine {

    pub fn new(options: DecodeOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// The findings recorded so far.
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Processes one segment. Returns the display set it seals, if any.
    ///
    /// A malformed payload is skipped with a finding. Only a segment of unknown kind is an
    /// error, as its meaning for the display set cannot be guessed.
    pub fn push_segment(&mut self, raw: &RawSegment) -> ReadResult<Option<DisplaySet>> {

        let header = raw.header;

        if raw.is_truncated() {
            self.record(
                header.pts,
                Issue::TruncatedPayload {
                    declared: header.size,
                    available: raw.payload.len(),
                },
            );
            return Ok(None)
        }

        let screen = self.current.composition_screen();
        let mut issues = Vec::new();
        let decoded = raw.decode(screen, &self.options, &mut issues);

        let segment = match decoded {
            Ok(segment) => {
                self.record_all(header.pts, issues);
                segment
            }
            Err(err) => {
                match header.kind() {
                    Some(kind) => {
                        self.record(
                            header.pts,
                            Issue::SegmentSkipped {
                                kind,
                                reason: err.to_string(),
                            },
                        );
                        return Ok(None)
                    }
                    None => return Err(err.into()),
                }
            }
        };

        log::debug!("{} at {} ({} bytes)", segment.kind(), segment.pts, header.size);

        Ok(self.apply(segment))
    }

    fn apply(&mut self, segment: Segment) -> Option<DisplaySet> {

        if !self.current.is_populated() {
            self.current.pts = segment.pts;
            self.current.dts = segment.dts;
        }

        match segment.body {
            SegmentBody::PresentationComposition(pcs) => {
                if self.current.composition.is_some() {
                    log::debug!("composition at {} replaces an earlier one", segment.pts);
                }
                self.current.pts = segment.pts;
                self.current.dts = segment.dts;
                self.current.composition = Some(pcs);
            }
            SegmentBody::WindowDefinition(windows) => {
                self.current.windows = Some(windows);
            }
            SegmentBody::PaletteDefinition(palette) => {
                self.current.palette = Some(palette);
            }
            SegmentBody::ObjectDefinition(fragment) => {
                self.merge_fragment(segment.pts, fragment);
            }
            SegmentBody::End => {
                return Some(self.seal(Some(segment.pts)))
            }
        }

        None
    }

    fn merge_fragment(&mut self, pts: u32, fragment: ObjectDefinition) {

        let object = match self.pending.take() {
            Some(mut object) => {
                match object.merge(&fragment) {
                    Ok(()) => object,
                    Err(err) => {
                        self.record(pts, Issue::SequenceMerge(err));
                        Object::from_fragment(fragment)
                    }
                }
            }
            None => Object::from_fragment(fragment),
        };

        if object.completed {
            self.complete(pts, object);
        } else {
            self.pending = Some(object);
        }
    }

    fn complete(&mut self, pts: u32, object: Object) {

        if let Some((declared, accumulated)) = object.length_mismatch() {
            self.record(
                pts,
                Issue::ObjectLengthMismatch {
                    object_id: object.id,
                    declared,
                    accumulated,
                },
            );
        }

        self.current.objects.push(object);
    }

    fn seal(&mut self, end: Option<u32>) -> DisplaySet {

        let mut issues = Vec::new();
        let pts = self.current.pts;

        self.current.end = end;
        self.current.check_window_links(&mut issues);

        if end.is_none() {
            issues.push(Issue::MissingEnd);
        }

        self.record_all(pts, issues);

        mem::take(&mut self.current)
    }

    /// Flushes whatever the stream left behind.
    ///
    /// An object still waiting for fragments is closed and added to the current display set,
    /// which is then returned if anything in it was defined.
    pub fn finish(mut self) -> (Option<DisplaySet>, Vec<Finding>) {

        if let Some(mut object) = self.pending.take() {
            let pts = self.current.pts;
            self.record(pts, Issue::IncompleteObject { object_id: object.id });
            object.force_complete();
            self.current.objects.push(object);
        }

        let last = if self.current.is_populated() {
            Some(self.seal(None))
        } else {
            None
        };

        (last, self.findings)
    }

    fn record(&mut self, pts: u32, issue: Issue) {
        log::warn!("{}: {}", format_timestamp(pts), issue);
        self.findings.push(Finding::new(pts, issue));
    }

    fn record_all(&mut self, pts: u32, issues: Vec<Issue>) {
        for issue in issues {
            self.record(pts, issue);
        }
    }
}

/// Allows reading a whole presentation from a source.
pub trait ReadDisplaySetExt {
    /// Decodes every segment until the source is exhausted.
    fn read_presentation(&mut self, options: &DecodeOptions) -> ReadResult<Decoded>;
}

impl<T> ReadDisplaySetExt for T where
    T: Read,
{

    fn read_presentation(&mut self, options: &DecodeOptions) -> ReadResult<Decoded> {

        let mut engine = EpochEngine::new(options.clone());
        let mut display_sets = Vec::new();

        while let Some(raw) = self.read_raw_segment()? {
            if let Some(display_set) = engine.push_segment(&raw)? {
                display_sets.push(display_set);
            }
        }

        let (last, findings) = engine.finish();

        display_sets.extend(last);

        log::info!(
            "decoded {} display sets with {} findings",
            display_sets.len(),
            findings.len(),
        );

        Ok(
            Decoded {
                presentation: Presentation::new(display_sets),
                findings,
            }
        )
    }
}
