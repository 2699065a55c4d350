/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

use super::{
    CompositionObject,
    CompositionState,
    Crop,
    MAGIC_NUMBER,
    ObjectDefinition,
    Palette,
    PaletteEntry,
    PresentationComposition,
    RawSegment,
    SEGMENT_HEADER_SIZE,
    Segment,
    SegmentBody,
    SegmentHeader,
    SegmentKind,
    Sequence,
    Window,
    super::{
        TICKS_PER_MS,
        config::{DecodeOptions, ScreenSize, TruncationPolicy},
        finding::Issue,
    },
};
use std::io::{Cursor, Error as IoError, ErrorKind, Read};
use byteorder::{BigEndian, ReadBytesExt};
use thiserror::Error as ThisError;

const PCS_HEADER_SIZE: usize = 11;
const COMPOSITION_OBJECT_SIZE: usize = 8;
const CROP_SIZE: usize = 8;
const WINDOW_SIZE: usize = 9;
const PALETTE_ENTRY_SIZE: usize = 5;
const ODS_SHORT_HEADER_SIZE: usize = 4;
const ODS_FIRST_HEADER_SIZE: usize = 11;

/// A specialized [`Result`](std::result::Result) type for segment-reading operations.
pub type ReadResult<T> = Result<T, ReadError>;

/// The error type for [ReadSegmentExt] and the payload parsers.
///
/// Only I/O errors, [`ReadError::MalformedHeader`], [`ReadError::TruncatedHeader`] and
/// [`ReadError::UnsupportedSegmentType`] leave the stream in a state that cannot be recovered
/// from. The remaining variants describe a single malformed payload.
#[derive(ThisError, Debug)]
pub enum ReadError {
    /// The segment could not be read because of an underlying I/O error.
    #[error("segment IO error")]
    IoError {
        #[from]
        source: IoError,
    },
    /// The segment header does not start with `PG`.
    #[error("segment has unrecognized magic number")]
    MalformedHeader,
    /// The stream ended in the middle of a segment header.
    #[error("stream ends after {length} bytes of a segment header")]
    TruncatedHeader {
        length: usize,
    },
    /// A segment with a payload declares a kind that is not known.
    #[error("segment has unsupported kind 0x{0:02X}")]
    UnsupportedSegmentType(u8),
    #[error("presentation composition segment is {length} bytes, too short for its header")]
    TruncatedComposition {
        length: usize,
    },
    #[error("presentation composition declares {expected} objects but only {read} fit")]
    TruncatedCompositionObjects {
        expected: u8,
        read: usize,
    },
    #[error("window definition segment has no window count")]
    MissingWindowCount,
    #[error("window definition declares {expected} windows but only {read} fit")]
    TruncatedWindows {
        expected: u8,
        read: usize,
    },
    #[error("palette definition segment length {length} is not a whole number of entries")]
    TruncatedPalette {
        length: usize,
    },
    #[error("object definition segment is {length} bytes, too short for its header")]
    TruncatedObject {
        length: usize,
    },
    #[error("first fragment of object {id} is {length} bytes, too short for its header")]
    TruncatedFirstObject {
        id: u16,
        length: usize,
    },
}

/// Allows reading segments from a source.
pub trait ReadSegmentExt {
    /// Reads the next segment header. Returns `None` if the source is exhausted before the
    /// first byte of the header.
    fn read_segment_header(&mut self) -> ReadResult<Option<SegmentHeader>>;
    /// Reads the next segment header along with its undecoded payload.
    fn read_raw_segment(&mut self) -> ReadResult<Option<RawSegment>>;
}

impl<T> ReadSegmentExt for T where
    T: Read,
{

    fn read_segment_header(&mut self) -> ReadResult<Option<SegmentHeader>> {

        let mut bytes = [0u8; SEGMENT_HEADER_SIZE];
        let mut filled = 0;

        while filled < SEGMENT_HEADER_SIZE {
            match self.read(&mut bytes[filled..]) {
                Ok(0) => break,
                Ok(count) => filled += count,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }

        match filled {
            0 => Ok(None),
            SEGMENT_HEADER_SIZE => parse_header(&bytes).map(Some),
            length => Err(ReadError::TruncatedHeader { length }),
        }
    }

    fn read_raw_segment(&mut self) -> ReadResult<Option<RawSegment>> {

        let header = match self.read_segment_header()? {
            Some(header) => header,
            None => return Ok(None),
        };
        let mut payload = Vec::with_capacity(header.size as usize);

        Read::take(&mut *self, u64::from(header.size)).read_to_end(&mut payload)?;

        Ok(Some(RawSegment { header, payload }))
    }
}

/// Decodes a segment header.
pub fn parse_header(bytes: &[u8; SEGMENT_HEADER_SIZE]) -> ReadResult<SegmentHeader> {

    let mut input = Cursor::new(&bytes[..]);

    if input.read_u16::<BigEndian>()? != MAGIC_NUMBER {
        return Err(ReadError::MalformedHeader)
    }

    let pts = input.read_u32::<BigEndian>()? / TICKS_PER_MS;
    let dts = input.read_u32::<BigEndian>()? / TICKS_PER_MS;
    let code = input.read_u8()?;
    let size = input.read_u16::<BigEndian>()?;

    Ok(SegmentHeader { pts, dts, code, size })
}

impl RawSegment {

    /// Decodes the payload according to the kind declared by the header.
    ///
    /// `screen` holds the bounds declared by the composition of the enclosing display set, if
    /// one is known. Windows are validated against it or the default screen of `options`;
    /// objects only against it. Tolerated problems are appended to `issues`.
    pub fn decode(
        &self,
        screen: Option<ScreenSize>,
        options: &DecodeOptions,
        issues: &mut Vec<Issue>,
    ) -> ReadResult<Segment> {

        let policy = options.truncated_lists;

        let header = &self.header;
        let kind = header.kind().ok_or(ReadError::UnsupportedSegmentType(header.code))?;
        let body = match kind {
            SegmentKind::PresentationComposition => {
                SegmentBody::PresentationComposition(parse_pcs(&self.payload, policy, issues)?)
            }
            SegmentKind::WindowDefinition => {
                SegmentBody::WindowDefinition(parse_wds(
                    &self.payload,
                    screen.unwrap_or(options.default_screen),
                    policy,
                    issues,
                )?)
            }
            SegmentKind::PaletteDefinition => {
                SegmentBody::PaletteDefinition(parse_pds(&self.payload)?)
            }
            SegmentKind::ObjectDefinition => {
                SegmentBody::ObjectDefinition(parse_ods(&self.payload, screen, issues)?)
            }
            SegmentKind::End => {
                if header.size > 0 {
                    issues.push(Issue::EndWithPayload { size: header.size });
                }
                SegmentBody::End
            }
        };

        Ok(
            Segment {
                pts: header.pts,
                dts: header.dts,
                body,
            }
        )
    }
}

/// Decodes the payload of a presentation composition segment.
///
/// Composition objects are read until either the declared count is reached or the payload
/// runs out. What happens in the latter case is decided by `policy`.
pub fn parse_pcs(
    payload: &[u8],
    policy: TruncationPolicy,
    issues: &mut Vec<Issue>,
) -> ReadResult<PresentationComposition> {

    if payload.len() < PCS_HEADER_SIZE {
        return Err(ReadError::TruncatedComposition { length: payload.len() })
    }

    let mut input = Cursor::new(payload);
    let width = input.read_u16::<BigEndian>()?;
    let height = input.read_u16::<BigEndian>()?;
    let frame_rate = input.read_u8()?;
    let composition_number = input.read_u16::<BigEndian>()?;
    let composition_state = CompositionState::from_byte(input.read_u8()?);
    let palette_update = input.read_u8()? != 0x00;
    let palette_id = input.read_u8()?;
    let expected = input.read_u8()?;
    let mut composition_objects = Vec::with_capacity(expected as usize);
    let mut pos = PCS_HEADER_SIZE;

    while composition_objects.len() < expected as usize {

        if payload.len() - pos < COMPOSITION_OBJECT_SIZE {
            break
        }

        let object_id = input.read_u16::<BigEndian>()?;
        let window_id = input.read_u8()?;
        let cropped = input.read_u8()? != 0x00;
        let x = input.read_u16::<BigEndian>()?;
        let y = input.read_u16::<BigEndian>()?;

        pos += COMPOSITION_OBJECT_SIZE;

        let crop = if !cropped {
            None
        } else if payload.len() - pos >= CROP_SIZE {
            pos += CROP_SIZE;
            Some(
                Crop {
                    x: input.read_u16::<BigEndian>()?,
                    y: input.read_u16::<BigEndian>()?,
                    width: input.read_u16::<BigEndian>()?,
                    height: input.read_u16::<BigEndian>()?,
                }
            )
        } else {
            issues.push(Issue::TruncatedCrop { object_id });
            Some(Crop::default())
        };

        composition_objects.push(
            CompositionObject {
                object_id,
                window_id,
                x,
                y,
                crop,
            }
        );
    }

    let read = composition_objects.len();

    if read < expected as usize {
        match policy {
            TruncationPolicy::Degrade => {
                issues.push(Issue::TruncatedCompositionObjects { expected, read });
            }
            TruncationPolicy::Reject => {
                return Err(ReadError::TruncatedCompositionObjects { expected, read })
            }
        }
    }

    Ok(
        PresentationComposition {
            width,
            height,
            frame_rate,
            composition_number,
            composition_state,
            palette_update,
            palette_id,
            composition_objects,
        }
    )
}

/// Decodes the payload of a window definition segment, validating every window against
/// `screen`.
pub fn parse_wds(
    payload: &[u8],
    screen: ScreenSize,
    policy: TruncationPolicy,
    issues: &mut Vec<Issue>,
) -> ReadResult<Vec<Window>> {

    let mut input = Cursor::new(payload);
    let expected = match input.read_u8() {
        Ok(count) => count,
        Err(_) => return Err(ReadError::MissingWindowCount),
    };
    let available = (payload.len() - 1) / WINDOW_SIZE;
    let mut windows = Vec::with_capacity(expected as usize);

    for _ in 0..(expected as usize).min(available) {

        let window = Window {
            id: input.read_u8()?,
            x: input.read_u16::<BigEndian>()?,
            y: input.read_u16::<BigEndian>()?,
            width: input.read_u16::<BigEndian>()?,
            height: input.read_u16::<BigEndian>()?,
        };

        check_window(&window, screen, issues);
        windows.push(window);
    }

    let read = windows.len();

    if read < expected as usize {
        match policy {
            TruncationPolicy::Degrade => {
                issues.push(Issue::TruncatedWindows { expected, read });
            }
            TruncationPolicy::Reject => {
                return Err(ReadError::TruncatedWindows { expected, read })
            }
        }
    }

    Ok(windows)
}

/// Reports every way in which `window` does not fit on `screen`. The window itself is always
/// kept.
pub fn check_window(window: &Window, screen: ScreenSize, issues: &mut Vec<Issue>) {

    if window.width == 0 || window.height == 0 {
        issues.push(
            Issue::ZeroSizedWindow {
                id: window.id,
                width: window.width,
                height: window.height,
            }
        );
    }

    if window.x >= screen.width || window.y >= screen.height {
        issues.push(
            Issue::WindowOutsideScreen {
                id: window.id,
                x: window.x,
                y: window.y,
                screen_width: screen.width,
                screen_height: screen.height,
            }
        );
    } else if u32::from(window.x) + u32::from(window.width) > u32::from(screen.width)
        || u32::from(window.y) + u32::from(window.height) > u32::from(screen.height) {
        issues.push(
            Issue::WindowExceedsScreen {
                id: window.id,
                screen_width: screen.width,
                screen_height: screen.height,
            }
        );
    }
}

/// Decodes the payload of a palette definition segment into a full color table.
pub fn parse_pds(payload: &[u8]) -> ReadResult<Palette> {

    if payload.len() < 2 || (payload.len() - 2) % PALETTE_ENTRY_SIZE != 0 {
        return Err(ReadError::TruncatedPalette { length: payload.len() })
    }

    let mut input = Cursor::new(payload);
    let count = (payload.len() - 2) / PALETTE_ENTRY_SIZE;
    let id = input.read_u8()?;
    let version = input.read_u8()?;
    let mut palette = Palette::new(id, version);

    for _ in 0..count {

        let entry_id = input.read_u8()?;
        let y = input.read_u8()?;
        let cr = input.read_u8()?;
        let cb = input.read_u8()?;
        let alpha = input.read_u8()?;

        palette.set(entry_id, PaletteEntry { y, cr, cb, alpha });
    }

    Ok(palette)
}

/// Decodes one object definition fragment. Only first fragments declare dimensions, and only
/// those are validated against `screen` when it is known.
pub fn parse_ods(
    payload: &[u8],
    screen: Option<ScreenSize>,
    issues: &mut Vec<Issue>,
) -> ReadResult<ObjectDefinition> {

    if payload.len() < ODS_SHORT_HEADER_SIZE {
        return Err(ReadError::TruncatedObject { length: payload.len() })
    }

    let mut input = Cursor::new(payload);
    let id = input.read_u16::<BigEndian>()?;
    let version = input.read_u8()?;
    let sequence = Sequence::from_flags(input.read_u8()?);

    if !sequence.is_first() {
        return Ok(
            ObjectDefinition {
                id,
                version,
                sequence,
                length: 0,
                width: 0,
                height: 0,
                data: payload[ODS_SHORT_HEADER_SIZE..].to_vec(),
            }
        )
    }

    if payload.len() < ODS_FIRST_HEADER_SIZE {
        return Err(ReadError::TruncatedFirstObject { id, length: payload.len() })
    }

    let length = input.read_u24::<BigEndian>()?;
    let width = input.read_u16::<BigEndian>()?;
    let height = input.read_u16::<BigEndian>()?;

    if width == 0 || height == 0 {
        issues.push(Issue::ZeroSizedObject { id, width, height });
    }
    if let Some(screen) = screen {
        if width > screen.width || height > screen.height {
            issues.push(
                Issue::ObjectExceedsScreen {
                    id,
                    width,
                    height,
                    screen_width: screen.width,
                    screen_height: screen.height,
                }
            );
        }
    }

    Ok(
        ObjectDefinition {
            id,
            version,
            sequence,
            length,
            width,
            height,
            data: payload[ODS_FIRST_HEADER_SIZE..].to_vec(),
        }
    )
}
