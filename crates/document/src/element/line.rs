// Chunk: docs/chunks/element_tree - Line, leaf and branch element views

use crate::error::Result;
use crate::mark::{Bias, MarkId};
use crate::mark_vector::MarkVector;

/// A line of the document, tracked by a single backward-biased start mark.
///
/// The end of a line is not stored: it is the start of the following line, or
/// the end of the document for the last line. Text typed at a line start
/// therefore stays on that line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineElement {
    start: MarkId,
}

impl LineElement {
    pub fn new(marks: &mut MarkVector, start: usize) -> Result<Self> {
        Ok(Self {
            start: marks.insert_mark(start, Bias::Backward)?,
        })
    }

    pub fn start_mark(&self) -> MarkId {
        self.start
    }

    pub fn start_offset(&self, marks: &MarkVector) -> Result<usize> {
        marks.offset(self.start)
    }
}
