/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

//! Derives on-screen time spans from a sequence of display sets.
//!
//! The stream never states when a subtitle disappears. It is inferred instead from the next
//! display set that opens an epoch, clears the screen, or changes the composition state.


use super::displayset::DisplaySet;

/// Every display set of a stream, in stream order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Presentation {
    pub display_sets: Vec<DisplaySet>,
}

/// A display set worth showing on its own, with the time span it is shown for.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Cue {
    /// One-based position among all cues.
    pub index: usize,
    /// Position of the display set within [`Presentation::display_sets`].
    pub display_set: usize,
    /// Start in milliseconds.
    pub start: u32,
    /// End in milliseconds.
    pub end: u32,
}

impl Presentation {

    pub fn new(display_sets: Vec<DisplaySet>) -> Self {
        Self { display_sets }
    }

    /// Computes when the display set at `index` leaves the screen.
    ///
    /// Later display sets without a composition carry no state and are passed over. If no later
    /// display set ends this one, it stays for `fallback_ms` after its start. Returns `None` if
    /// `index` is out of range.
    pub fn end_timestamp(&self, index: usize, fallback_ms: u32) -> Option<u32> {

        let display_set = self.display_sets.get(index)?;
        let state = display_set.composition_state();

        for later in self.display_sets[index + 1..].iter() {

            let later_state = match later.composition_state() {
                Some(later_state) => later_state,
                None => continue,
            };

            if later.is_epoch_start() || later.is_epoch_end() || Some(later_state) != state {
                return Some(later.pts)
            }
        }

        Some(display_set.pts.saturating_add(fallback_ms))
    }

    /// Lists every display set that opens an epoch, along with its time span.
    pub fn cues(&self, fallback_ms: u32) -> Vec<Cue> {

        let mut cues = Vec::new();

        for (position, display_set) in self.display_sets.iter().enumerate() {

            if !display_set.is_epoch_start() {
                continue
            }

            let end = self.end_timestamp(position, fallback_ms)
                .unwrap_or_else(|| display_set.pts.saturating_add(fallback_ms));

            cues.push(
                Cue {
                    index: cues.len() + 1,
                    display_set: position,
                    start: display_set.pts,
                    end,
                }
            );
        }

        cues
    }
}
