/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

//! Reassembles objects from their fragments.
//!
//! A single ODS payload cannot hold more than 64 KiB, so large objects are split. The first
//! fragment declares the object's dimensions and the total length of its data; the
//! continuations that follow carry nothing but more data. The fragment flagged as last
//! completes the object.


use super::segment::ObjectDefinition;
use thiserror::Error as ThisError;

/// A specialized [`Result`](std::result::Result) type for merging fragments.
pub type MergeResult<T> = Result<T, MergeError>;

/// The ways in which a fragment can fail to continue an object.
#[derive(ThisError, Clone, Debug, Eq, Hash, PartialEq)]
pub enum MergeError {
    /// The object has already received its last fragment.
    #[error("object {id} has already ended")]
    MergeOnEnded {
        id: u16,
    },
    /// The fragment claims to start an object of its own.
    #[error("fragment of object {id} starts a new sequence")]
    MergeOnFirst {
        id: u16,
    },
    /// The fragment belongs to a different object.
    #[error("fragment of object {found} cannot continue object {expected}")]
    MismatchedId {
        expected: u16,
        found: u16,
    },
}

/// An object, complete or still being assembled.
#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct Object {
    pub id: u16,
    pub version: u8,
    pub width: u16,
    pub height: u16,
    /// The data length declared by the first fragment, including the four bytes of width and
    /// height.
    pub length: u32,
    /// The number of bytes received so far, counted the same way as `length`.
    pub accumulated: u32,
    /// Set once the last fragment has been received, or once the object has been given up on.
    pub completed: bool,
    /// Run-length encoded pixel data.
    pub data: Vec<u8>,
}

impl Object {

    /// Starts a new object from a fragment.
    pub fn from_fragment(fragment: ObjectDefinition) -> Self {

        let accumulated = fragment.contributed_length();

        Self {
            id: fragment.id,
            version: fragment.version,
            width: fragment.width,
            height: fragment.height,
            length: fragment.length,
            accumulated,
            completed: fragment.sequence.is_last(),
            data: fragment.data,
        }
    }

    /// Appends a continuation fragment.
    ///
    /// The object is completed by a fragment flagged as last, even when the number of bytes
    /// received differs from the declared length; see [`Object::length_mismatch`].
    pub fn merge(&mut self, fragment: &ObjectDefinition) -> MergeResult<()> {

        if self.completed {
            return Err(MergeError::MergeOnEnded { id: self.id })
        }
        if fragment.sequence.is_first() {
            return Err(MergeError::MergeOnFirst { id: fragment.id })
        }
        if fragment.id != self.id {
            return Err(MergeError::MismatchedId { expected: self.id, found: fragment.id })
        }

        self.accumulated += fragment.contributed_length();
        self.completed = fragment.sequence.is_last();
        self.data.extend_from_slice(&fragment.data);

        Ok(())
    }

    /// Marks the object as complete without waiting for its last fragment.
    pub fn force_complete(&mut self) {
        self.completed = true;
    }

    /// Returns the declared and accumulated lengths of a completed object if they disagree.
    pub fn length_mismatch(&self) -> Option<(u32, u32)> {
        if self.completed && self.accumulated != self.length {
            Some((self.length, self.accumulated))
        } else {
            None
        }
    }
}
