/*
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * Copyright 2021 William Swartzendruber
 *
 * SPDX-License-Identifier: MPL-2.0
 */

use super::{
    MAGIC_NUMBER,
    ObjectDefinition,
    Palette,
    PresentationComposition,
    Segment,
    SegmentBody,
    Window,
    super::TICKS_PER_MS,
};
use std::io::{
    Error as IoError,
    Write,
};
use byteorder::{BigEndian, WriteBytesExt};
use thiserror::Error as ThisError;

/// A specialized [`Result`](std::result::Result) type for segment-writing operations.
pub type WriteResult<T> = Result<T, WriteError>;

/// The error type for [WriteSegmentExt].
///
/// Errors are caused by either invalid state or by an underlying I/O error.
#[derive(ThisError, Debug)]
pub enum WriteError {
    /// The [`Segment`] could not be written because of an underlying I/O error.
    #[error("segment IO error")]
    IoError {
        /// The underlying I/O error.
        #[from]
        source: IoError,
    },
    /// The [`PresentationComposition`] being written has more than 255 composition objects.
    #[error("too many composition objects in presentation composition segment")]
    TooManyCompositionObjects,
    /// The window definition being written has more than 255 windows.
    #[error("too many window definitions")]
    TooManyWindowDefinitions,
    /// The generated payload does not fit into the 16-bit size field of the header.
    #[error("segment payload is too large")]
    PayloadTooLarge,
}

/// Allows writing segments to a destination.
///
/// Timestamps are given in milliseconds and written as 90 kHz ticks. Palettes are written with
/// every one of their 256 entries that is not fully zeroed.
pub trait WriteSegmentExt {
    /// Writes a segment to a destination.
    fn write_segment(&mut self, segment: &Segment) -> WriteResult<()>;
}

impl<T> WriteSegmentExt for T where
    T: Write,
{

    fn write_segment(&mut self, segment: &Segment) -> WriteResult<()> {

        let payload = match &segment.body {
            SegmentBody::PresentationComposition(pcs) => generate_pcs(pcs)?,
            SegmentBody::WindowDefinition(windows) => generate_wds(windows)?,
            SegmentBody::PaletteDefinition(palette) => generate_pds(palette)?,
            SegmentBody::ObjectDefinition(ods) => generate_ods(ods)?,
            SegmentBody::End => vec![],
        };

        if payload.len() > u16::MAX as usize {
            return Err(WriteError::PayloadTooLarge)
        }

        self.write_u16::<BigEndian>(MAGIC_NUMBER)?;
        self.write_u32::<BigEndian>(segment.pts.wrapping_mul(TICKS_PER_MS))?;
        self.write_u32::<BigEndian>(segment.dts.wrapping_mul(TICKS_PER_MS))?;
        self.write_u8(segment.kind().code())?;
        self.write_u16::<BigEndian>(payload.len() as u16)?;
        self.write_all(&payload)?;

        Ok(())
    }
}

fn generate_pcs(pcs: &PresentationComposition) -> WriteResult<Vec<u8>> {

    let mut payload = vec![];

    payload.write_u16::<BigEndian>(pcs.width)?;
    payload.write_u16::<BigEndian>(pcs.height)?;
    payload.write_u8(pcs.frame_rate)?;
    payload.write_u16::<BigEndian>(pcs.composition_number)?;
    payload.write_u8(pcs.composition_state.to_byte())?;
    payload.write_u8(if pcs.palette_update { 0x80 } else { 0x00 })?;
    payload.write_u8(pcs.palette_id)?;

    if pcs.composition_objects.len() <= 255 {
        payload.write_u8(pcs.composition_objects.len() as u8)?;
    } else {
        return Err(WriteError::TooManyCompositionObjects)
    }

    for comp_obj in &pcs.composition_objects {

        payload.write_u16::<BigEndian>(comp_obj.object_id)?;
        payload.write_u8(comp_obj.window_id)?;
        payload.write_u8(if comp_obj.crop.is_some() { 0x40 } else { 0x00 })?;
        payload.write_u16::<BigEndian>(comp_obj.x)?;
        payload.write_u16::<BigEndian>(comp_obj.y)?;

        if let Some(crop) = &comp_obj.crop {
            payload.write_u16::<BigEndian>(crop.x)?;
            payload.write_u16::<BigEndian>(crop.y)?;
            payload.write_u16::<BigEndian>(crop.width)?;
            payload.write_u16::<BigEndian>(crop.height)?;
        }
    }

    Ok(payload)
}

fn generate_wds(windows: &[Window]) -> WriteResult<Vec<u8>> {

    let mut payload = vec![];

    if windows.len() <= 255 {
        payload.write_u8(windows.len() as u8)?;
    } else {
        return Err(WriteError::TooManyWindowDefinitions)
    }

    for window in windows.iter() {
        payload.write_u8(window.id)?;
        payload.write_u16::<BigEndian>(window.x)?;
        payload.write_u16::<BigEndian>(window.y)?;
        payload.write_u16::<BigEndian>(window.width)?;
        payload.write_u16::<BigEndian>(window.height)?;
    }

    Ok(payload)
}

fn generate_pds(palette: &Palette) -> WriteResult<Vec<u8>> {

    let mut payload = vec![];

    payload.write_u8(palette.id)?;
    payload.write_u8(palette.version)?;

    for (id, entry) in palette.entries.iter().enumerate() {
        if !palette.defined_ids[id] {
            continue
        }
        payload.write_u8(id as u8)?;
        payload.write_u8(entry.y)?;
        payload.write_u8(entry.cr)?;
        payload.write_u8(entry.cb)?;
        payload.write_u8(entry.alpha)?;
    }

    Ok(payload)
}

fn generate_ods(ods: &ObjectDefinition) -> WriteResult<Vec<u8>> {

    let mut payload = vec![];

    payload.write_u16::<BigEndian>(ods.id)?;
    payload.write_u8(ods.version)?;
    payload.write_u8(ods.sequence.flags())?;

    if ods.sequence.is_first() {
        if ods.length > 0xFF_FFFF {
            return Err(WriteError::PayloadTooLarge)
        }
        payload.write_u24::<BigEndian>(ods.length)?;
        payload.write_u16::<BigEndian>(ods.width)?;
        payload.write_u16::<BigEndian>(ods.height)?;
    }

    payload.write_all(&ods.data)?;

    Ok(payload)
}
