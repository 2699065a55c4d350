/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

//! Operates on individual segments.
//!
//! # Overview
//!
//! A segment is the most fundamental data structure within a PGS bitstream. Multiple segments
//! come together in a well-defined manner to form a display set (DS).
//!
//! There are five types that typically appear in this order:
//!
//! 1. Presentation Composition Segment (PCS)
//! 2. Window Definition Segment (WDS)
//! 3. Palette Definition Segment (PDS)
//! 4. Object Definition Segment (ODS)
//! 5. End Segment (ES)
//!
//! Every segment starts with a 13-byte header: the magic number `PG`, a PTS and a DTS counted
//! in ticks of a 90 kHz clock, a one-byte kind and a two-byte payload size. Timestamps are
//! converted to milliseconds as soon as the header is read.
//!
//! ## Presentation Composition Segment (PCS)
//!
//! A PCS signals the start of a new display set (DS). It also defines properties such as the
//! role of the DS within the larger epoch, the screen resolution, and initial mappings of
//! objects to windows.
//!
//! ## Window Definition Segment (WDS)
//!
//! A WDS defines the areas of the screen that will be used to show objects during the larger
//! epoch. As a single WDS can define multiple windows, each DS should only have one.
//!
//! ## Palette Definition Segment (PDS)
//!
//! A PDS contains a list of YCbCrA values with each one having a unique ID. They are decoded
//! straight into a 256-entry [`Palette`].
//!
//! ## Object Definition Segment (ODS)
//!
//! An ODS carries run-length encoded pixel IDs. Large objects are split across several
//! consecutive ODS fragments; see [`crate::object`] for how they are merged.
//!
//! ## End Segment (ES)
//!
//! An ES signals that the current DS has come to an end. Any segment with an empty payload is
//! treated as one.

#[cfg(test)]
mod tests;

mod segmentread;
mod segmentwrite;

pub use segmentread::*;
pub use segmentwrite::*;

use std::fmt::{Display, Formatter, Result as FmtResult};

/// Size of a segment header in bytes.
pub const SEGMENT_HEADER_SIZE: usize = 13;

/// The two ASCII bytes `PG` that open every segment.
pub const MAGIC_NUMBER: u16 = 0x5047;

/// The kind of a segment, as declared by its header.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum SegmentKind {
    PaletteDefinition,
    ObjectDefinition,
    PresentationComposition,
    WindowDefinition,
    End,
}

impl SegmentKind {

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x14 => Some(Self::PaletteDefinition),
            0x15 => Some(Self::ObjectDefinition),
            0x16 => Some(Self::PresentationComposition),
            0x17 => Some(Self::WindowDefinition),
            0x80 => Some(Self::End),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::PaletteDefinition => 0x14,
            Self::ObjectDefinition => 0x15,
            Self::PresentationComposition => 0x16,
            Self::WindowDefinition => 0x17,
            Self::End => 0x80,
        }
    }
}

impl Display for SegmentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::PaletteDefinition => write!(f, "PDS"),
            Self::ObjectDefinition => write!(f, "ODS"),
            Self::PresentationComposition => write!(f, "PCS"),
            Self::WindowDefinition => write!(f, "WDS"),
            Self::End => write!(f, "ES"),
        }
    }
}

/// A decoded segment header.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct SegmentHeader {
    /// Presentation timestamp in milliseconds.
    pub pts: u32,
    /// Decoding timestamp in milliseconds.
    pub dts: u32,
    /// The raw kind byte.
    pub code: u8,
    /// The number of payload bytes following the header.
    pub size: u16,
}

impl SegmentHeader {

    /// Resolves the kind of this segment. An empty payload always denotes an end segment,
    /// whatever the kind byte says.
    pub fn kind(&self) -> Option<SegmentKind> {
        if self.size == 0 {
            Some(SegmentKind::End)
        } else {
            SegmentKind::from_code(self.code)
        }
    }
}

/// A segment header together with the payload bytes that followed it.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct RawSegment {
    pub header: SegmentHeader,
    /// Holds fewer than `header.size` bytes only if the stream ended early.
    pub payload: Vec<u8>,
}

impl RawSegment {

    pub fn is_truncated(&self) -> bool {
        self.payload.len() < self.header.size as usize
    }
}

/// Represents a decoded PGS segment.
#[derive(Clone, Debug, Hash, PartialEq)]
pub struct Segment {
    /// Presentation timestamp in milliseconds.
    pub pts: u32,
    /// Decoding timestamp in milliseconds.
    pub dts: u32,
    pub body: SegmentBody,
}

impl Segment {

    pub fn kind(&self) -> SegmentKind {
        match self.body {
            SegmentBody::PresentationComposition(_) => SegmentKind::PresentationComposition,
            SegmentBody::WindowDefinition(_) => SegmentKind::WindowDefinition,
            SegmentBody::PaletteDefinition(_) => SegmentKind::PaletteDefinition,
            SegmentBody::ObjectDefinition(_) => SegmentKind::ObjectDefinition,
            SegmentBody::End => SegmentKind::End,
        }
    }
}

/// The payload of a segment, one variant per segment kind.
#[derive(Clone, Debug, Hash, PartialEq)]
pub enum SegmentBody {
    /// Represents a Presentation Composition Segment (PCS).
    PresentationComposition(PresentationComposition),
    /// Represents a Window Definition Segment (WDS).
    WindowDefinition(Vec<Window>),
    /// Represents a Palette Definition Segment (PDS).
    PaletteDefinition(Palette),
    /// Represents one fragment of an Object Definition Segment (ODS).
    ObjectDefinition(ObjectDefinition),
    /// Represents an End Segment (ES).
    End,
}

/// Defines the role of a PCS (and thereby the associated DS) within an epoch.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum CompositionState {
    /// Indicates that the associated PCS (and the DS it belongs to) defines the start of a new
    /// epoch. As such, the associated DS should contain all other segments necessary to render
    /// a composition onto the screen.
    EpochStart,
    /// Similar to `EpochStart`, except used to refresh the screen with the current composition.
    /// This allows a player to seek past an `EpochStart` and land in the middle of an epoch,
    /// while still being able to show the relevant composition once the `AcquisitionPoint` is
    /// encountered.
    AcquisitionPoint,
    /// This updates the composition that is on the screen. This is typically used to clear the
    /// current composition from the screen by defining a PCS with no composition objects,
    /// thereby effectively closing out the current epoch.
    Normal,
    /// Any other state byte. It is kept so that state changes can still be detected.
    Reserved(u8),
}

impl CompositionState {

    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0x00 => Self::Normal,
            0x40 => Self::AcquisitionPoint,
            0x80 => Self::EpochStart,
            other => Self::Reserved(other),
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Self::Normal => 0x00,
            Self::AcquisitionPoint => 0x40,
            Self::EpochStart => 0x80,
            Self::Reserved(byte) => byte,
        }
    }
}

impl Default for CompositionState {
    fn default() -> Self { Self::EpochStart }
}

/// Defines this object's role in a possible multi-part object.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Sequence {
    /// This object is discrete and stands alone.
    Single,
    /// This object is the first portion in a multi-part object.
    First,
    /// This object is neither the first nor the last portion in a multi-part object.
    Middle,
    /// This object is the last portion in a multi-part object.
    Last,
}

impl Sequence {

    /// Interprets the sequence flags byte: `0x80` marks the first fragment, `0x40` the last.
    pub fn from_flags(flags: u8) -> Self {
        match (flags & 0x80 != 0, flags & 0x40 != 0) {
            (true, true) => Self::Single,
            (true, false) => Self::First,
            (false, false) => Self::Middle,
            (false, true) => Self::Last,
        }
    }

    pub fn flags(self) -> u8 {
        match self {
            Self::Single => 0xC0,
            Self::First => 0x80,
            Self::Middle => 0x00,
            Self::Last => 0x40,
        }
    }

    pub fn is_first(self) -> bool {
        matches!(self, Self::Single | Self::First)
    }

    pub fn is_last(self) -> bool {
        matches!(self, Self::Single | Self::Last)
    }
}

impl Default for Sequence {
    fn default() -> Self { Self::Single }
}

/// Defines the payload of a Presentation Composition Segment (PCS).
#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct PresentationComposition {
    /// The width of the display in pixels. This value should be consistent within a
    /// presentation.
    pub width: u16,
    /// The height of the display in pixels. This value should be consistent within a
    /// presentation.
    pub height: u16,
    /// This value should be set to `0x10` and can typically be ignored.
    pub frame_rate: u8,
    pub composition_number: u16,
    pub composition_state: CompositionState,
    pub palette_update: bool,
    pub palette_id: u8,
    pub composition_objects: Vec<CompositionObject>,
}

/// Places one object into one window.
#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct CompositionObject {
    pub object_id: u16,
    pub window_id: u8,
    pub x: u16,
    pub y: u16,
    pub crop: Option<Crop>,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct Crop {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct Window {
    pub id: u8,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

/// A single YCrCbA color.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct PaletteEntry {
    pub y: u8,
    pub cr: u8,
    pub cb: u8,
    pub alpha: u8,
}

/// A full 256-entry color table. IDs the stream never defines stay zeroed, which makes them
/// fully transparent.
#[derive(Clone, Debug, Hash, PartialEq)]
pub struct Palette {
    pub id: u8,
    pub version: u8,
    /// The number of entries the defining segment carried.
    pub defined: usize,
    /// Which IDs have been given an entry, zeroed or not.
    pub defined_ids: [bool; 256],
    pub entries: [PaletteEntry; 256],
}

impl Palette {

    pub fn new(id: u8, version: u8) -> Self {
        Self {
            id,
            version,
            defined: 0,
            defined_ids: [false; 256],
            entries: [PaletteEntry::default(); 256],
        }
    }

    /// Stores an entry under its ID, replacing whatever was there.
    pub fn set(&mut self, id: u8, entry: PaletteEntry) {
        self.entries[id as usize] = entry;
        self.defined_ids[id as usize] = true;
        self.defined += 1;
    }

    pub fn is_defined(&self, id: u8) -> bool {
        self.defined_ids[id as usize]
    }

    pub fn get(&self, id: u8) -> PaletteEntry {
        self.entries[id as usize]
    }
}

impl Default for Palette {
    fn default() -> Self { Self::new(0, 0) }
}

/// Defines one fragment of an Object Definition Segment (ODS).
#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct ObjectDefinition {
    pub id: u16,
    pub version: u8,
    pub sequence: Sequence,
    /// The declared size of the complete object data, including the four bytes of width and
    /// height. Only first fragments carry it; it is zero otherwise.
    pub length: u32,
    /// Zero unless this is a first fragment.
    pub width: u16,
    /// Zero unless this is a first fragment.
    pub height: u16,
    /// The run-length encoded bytes carried by this fragment.
    pub data: Vec<u8>,
}

impl ObjectDefinition {

    /// Counts the bytes this fragment contributes toward the declared length.
    pub fn contributed_length(&self) -> u32 {
        if self.sequence.is_first() {
            self.data.len() as u32 + 4
        } else {
            self.data.len() as u32
        }
    }
}
