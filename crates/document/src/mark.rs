// Chunk: docs/chunks/mark_vector - Position-tracking document core

//! Mark handles and their flags.
//!
//! A mark is a [`MarkId`] into the arena of a [`MarkVector`]. The vector is the
//! only authority over a mark's offset; the handle is a plain copyable index with
//! a generation so that a handle outliving its slot is detected instead of
//! silently reading a recycled mark.

use std::fmt;

use bitflags::bitflags;

use crate::error::Result;
use crate::mark_vector::MarkVector;

bitflags! {
    /// Lifecycle and edit-behaviour flags of a mark.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MarkFlags: u8 {
        /// Stays put when text is inserted exactly at the mark.
        const BACKWARD_BIAS = 1 << 0;
        /// Not yet disposed.
        const VALID = 1 << 1;
        /// Disposed; the storage slot may not be reclaimed yet.
        const REMOVED = 1 << 2;
        /// Legacy position semantics: sticks at offset 0 once it gets there.
        const COMPATIBLE = 1 << 3;
        /// A compatible mark that reached offset 0.
        const ZERO = 1 << 4;
    }
}

impl MarkFlags {
    /// Storage order among marks at one offset: marks that do not move on an
    /// insert at their offset sort before the ones that do.
    pub(crate) fn rank(self) -> u8 {
        if self.intersects(MarkFlags::BACKWARD_BIAS | MarkFlags::ZERO) {
            0
        } else {
            1
        }
    }
}

/// Which side of an insertion at its exact offset a mark ends up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Bias {
    /// Moves with text inserted at its offset.
    #[default]
    Forward,
    /// Stays before text inserted at its offset.
    Backward,
}

/// Copyable handle to a mark owned by a [`MarkVector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkId {
    index: u32,
    generation: u32,
}

impl MarkId {
    pub(crate) fn new(index: usize, generation: u32) -> Self {
        Self {
            index: index as u32,
            generation,
        }
    }

    pub(crate) fn index(self) -> usize {
        self.index as usize
    }

    pub(crate) fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for MarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mark#{}.{}", self.index, self.generation)
    }
}

/// Read-only view of one mark, resolving through its vector.
#[derive(Debug, Clone, Copy)]
pub struct MarkRef<'a> {
    marks: &'a MarkVector,
    id: MarkId,
}

impl<'a> MarkRef<'a> {
    pub(crate) fn new(marks: &'a MarkVector, id: MarkId) -> Self {
        Self { marks, id }
    }

    pub fn id(&self) -> MarkId {
        self.id
    }

    /// Current document offset. Fails with `InvalidState` once disposed.
    pub fn offset(&self) -> Result<usize> {
        self.marks.offset(self.id)
    }

    pub fn bias(&self) -> Result<Bias> {
        self.marks.bias(self.id)
    }

    pub fn flags(&self) -> Result<MarkFlags> {
        self.marks.flags(self.id)
    }

    pub fn is_valid(&self) -> bool {
        self.marks.is_valid(self.id)
    }
}
