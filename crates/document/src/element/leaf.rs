// Chunk: docs/chunks/element_tree - Line, leaf and branch element views

use crate::error::{DocumentError, Result};
use crate::mark::{Bias, MarkId};
use crate::mark_vector::MarkVector;

/// An element with an explicit `[start, end)` range.
///
/// Both boundaries are forward-biased so they never cross: text inserted at the
/// start goes before the element, text inserted at the end extends it. The start
/// uses a compatible mark, so an element starting at offset 0 keeps starting
/// there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafElement {
    start: MarkId,
    end: MarkId,
    bol: bool,
    eol: bool,
}

impl LeafElement {
    /// Creates a leaf over `start..end`. `bol`/`eol` record whether the range
    /// begins at a line start and ends at a line end.
    pub fn new(
        marks: &mut MarkVector,
        start: usize,
        end: usize,
        bol: bool,
        eol: bool,
    ) -> Result<Self> {
        if start > end {
            return Err(DocumentError::OutOfRange {
                offset: start,
                len: end,
            });
        }
        let start = marks.insert_compatible_mark(start)?;
        let end = match marks.insert_mark(end, Bias::Forward) {
            Ok(end) => end,
            Err(err) => {
                marks.dispose(start)?;
                return Err(err);
            }
        };
        Ok(Self {
            start,
            end,
            bol,
            eol,
        })
    }

    pub fn start_mark(&self) -> MarkId {
        self.start
    }

    pub fn end_mark(&self) -> MarkId {
        self.end
    }

    pub fn start_offset(&self, marks: &MarkVector) -> Result<usize> {
        marks.offset(self.start)
    }

    pub fn end_offset(&self, marks: &MarkVector) -> Result<usize> {
        marks.offset(self.end)
    }

    pub fn is_bol(&self) -> bool {
        self.bol
    }

    pub fn is_eol(&self) -> bool {
        self.eol
    }
}
