/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

//! Groups segments into display sets.
//!
//! # Overview
//!
//! A display set (DS) is everything a decoder needs to change what is on the screen: a
//! composition, the windows it draws into, a palette, and the objects it places. The segments
//! of a DS are terminated by an end segment.
//!
//! Display sets are grouped into epochs. A DS whose composition state is `EpochStart` or
//! `AcquisitionPoint` opens one. A `Normal` DS that places no objects clears the screen and
//! thereby closes it.


mod displaysetread;

pub use displaysetread::*;

use super::{
    bitmap::{self, RasterError, RasterResult},
    config::ScreenSize,
    finding::Issue,
    object::Object,
    segment::{CompositionState, Palette, PresentationComposition, Window},
};
use image::RgbaImage;

/// A display set as assembled by the [`EpochEngine`].
///
/// Every part is optional because broken streams omit them; a DS is only ever produced if at
/// least one of them is present.
#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct DisplaySet {
    /// The PTS of the composition in milliseconds, or of the first segment if there is no
    /// composition.
    pub pts: u32,
    /// The DTS that goes along with `pts`.
    pub dts: u32,
    pub composition: Option<PresentationComposition>,
    pub windows: Option<Vec<Window>>,
    pub palette: Option<Palette>,
    /// Completed objects, in the order they were completed.
    pub objects: Vec<Object>,
    /// The PTS of the end segment, if one was read.
    pub end: Option<u32>,
}

/// A raster image rendered from one object of a display set.
#[derive(Debug)]
pub struct RenderedObject {
    pub object_id: u16,
    pub image: RasterResult<RgbaImage>,
}

impl DisplaySet {

    /// Tells whether any part of the display set has been defined.
    pub fn is_populated(&self) -> bool {
        self.composition.is_some()
            || self.windows.is_some()
            || self.palette.is_some()
            || !self.objects.is_empty()
    }

    pub fn composition_state(&self) -> Option<CompositionState> {
        self.composition.as_ref().map(|pcs| pcs.composition_state)
    }

    /// Tells whether this display set opens an epoch.
    pub fn is_epoch_start(&self) -> bool {
        matches!(
            self.composition_state(),
            Some(CompositionState::EpochStart) | Some(CompositionState::AcquisitionPoint)
        )
    }

    /// Tells whether this display set clears the screen.
    pub fn is_epoch_end(&self) -> bool {
        match &self.composition {
            Some(pcs) => {
                pcs.composition_state == CompositionState::Normal
                    && pcs.composition_objects.is_empty()
            }
            None => false,
        }
    }

    /// The screen dimensions declared by the composition, or `default` if there is no
    /// composition or it declares a zero dimension.
    pub fn screen_size(&self, default: ScreenSize) -> ScreenSize {
        self.composition_screen().unwrap_or(default)
    }

    /// The screen dimensions declared by the composition, if it declares non-zero ones.
    pub fn composition_screen(&self) -> Option<ScreenSize> {
        match &self.composition {
            Some(pcs) if pcs.width > 0 && pcs.height > 0 => {
                Some(ScreenSize::new(pcs.width, pcs.height))
            }
            _ => None,
        }
    }

    /// Reports every composition object that places its object into a window this display set
    /// does not define. Nothing is checked unless both a composition and windows are present.
    pub fn check_window_links(&self, issues: &mut Vec<Issue>) {

        let (pcs, windows) = match (&self.composition, &self.windows) {
            (Some(pcs), Some(windows)) => (pcs, windows),
            _ => return,
        };

        for co in pcs.composition_objects.iter() {
            if !windows.iter().any(|window| window.id == co.window_id) {
                issues.push(
                    Issue::UnknownWindowReference {
                        object_id: co.object_id,
                        window_id: co.window_id,
                    }
                );
            }
        }
    }

    /// Selects the objects worth rendering: completed, with non-zero dimensions, and placed
    /// by the composition. If the composition places nothing, every completed object counts.
    pub fn active_objects(&self) -> Vec<&Object> {

        let placed = self.composition.as_ref()
            .map(|pcs| &pcs.composition_objects[..])
            .unwrap_or(&[]);

        if placed.is_empty() && !self.objects.is_empty() {
            log::debug!(
                "display set at {} places no objects, considering all {} of them",
                self.pts,
                self.objects.len(),
            );
        }

        self.objects.iter()
            .filter(|object| object.completed)
            .filter(|object| object.width > 0 && object.height > 0)
            .filter(|object| {
                placed.is_empty() || placed.iter().any(|co| co.object_id == object.id)
            })
            .collect()
    }

    /// Renders every active object through the palette of this display set.
    pub fn render(&self) -> Vec<RenderedObject> {
        self.active_objects()
            .into_iter()
            .map(|object| {
                RenderedObject {
                    object_id: object.id,
                    image: match &self.palette {
                        Some(palette) => bitmap::render_object(object, palette),
                        None => Err(RasterError::MissingPalette),
                    },
                }
            })
            .collect()
    }
}
