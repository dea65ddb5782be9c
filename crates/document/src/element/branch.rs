// Chunk: docs/chunks/element_tree - Line, leaf and branch element views

use std::ops::Range;

use lite_edit_buffer::GapArray;

use super::{Element, ElementEdit};
use crate::error::{DocumentError, Result};
use crate::mark_vector::MarkVector;

/// Interior node of the element tree holding its children in a gap array.
///
/// Children are contiguous and ordered by start offset. `replace` is the only
/// structural mutation and hands back the delta needed to reverse it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchElement {
    children: GapArray<Element>,
}

impl BranchElement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_children(children: Vec<Element>) -> Self {
        Self {
            children: GapArray::from(children),
        }
    }

    pub fn element_count(&self) -> usize {
        self.children.len()
    }

    pub fn element(&self, index: usize) -> Option<&Element> {
        self.children.get(index)
    }

    pub fn children(&self) -> impl Iterator<Item = &Element> + '_ {
        self.children.iter()
    }

    fn child_start(&self, marks: &MarkVector, index: usize) -> Result<usize> {
        match self.children.get(index) {
            Some(child) => child.start_offset(marks),
            None => Err(DocumentError::OutOfRange {
                offset: index,
                len: self.children.len(),
            }),
        }
    }

    /// Index of the child containing `offset`.
    ///
    /// Binary search for the last child starting at or before `offset`; an
    /// offset before the first child maps to 0. `None` only when there are no
    /// children.
    pub fn element_index(&self, marks: &MarkVector, offset: usize) -> Result<Option<usize>> {
        let count = self.children.len();
        if count == 0 {
            return Ok(None);
        }
        let (mut low, mut high) = (0, count);
        while low < high {
            let mid = (low + high) / 2;
            if self.child_start(marks, mid)? <= offset {
                low = mid + 1;
            } else {
                high = mid;
            }
        }
        Ok(Some(low.saturating_sub(1)))
    }

    pub fn start_offset(&self, marks: &MarkVector) -> Result<usize> {
        match self.children.get(0) {
            Some(first) => first.start_offset(marks),
            None => Ok(0),
        }
    }

    /// End offset of the branch. `end_hint` is where the next element after
    /// this branch starts (or the document length); lines take their end from it.
    pub fn end_offset(&self, marks: &MarkVector, end_hint: usize) -> Result<usize> {
        match self.children.len() {
            0 => self.start_offset(marks),
            count => Ok(self.child_range(marks, count - 1, end_hint)?.end),
        }
    }

    /// Offset range covered by child `index`.
    pub fn child_range(
        &self,
        marks: &MarkVector,
        index: usize,
        end_hint: usize,
    ) -> Result<Range<usize>> {
        let child = self.children.get(index).ok_or(DocumentError::OutOfRange {
            offset: index,
            len: self.children.len(),
        })?;
        let next_start = match self.children.get(index + 1) {
            Some(next) => next.start_offset(marks)?,
            None => end_hint,
        };
        let start = child.start_offset(marks)?;
        let end = match child {
            Element::Line(_) => next_start,
            Element::Leaf(leaf) => leaf.end_offset(marks)?,
            Element::Branch(branch) => branch.end_offset(marks, next_start)?,
        };
        Ok(start..end)
    }

    /// Removes `remove_count` children at `index` and inserts `added` there.
    ///
    /// Returns the delta describing the change. Removed children keep their
    /// marks; they are owned by the returned edit until it is disposed.
    pub fn replace(
        &mut self,
        index: usize,
        remove_count: usize,
        added: Vec<Element>,
    ) -> Result<ElementEdit> {
        let removed = self.children.replace(index, remove_count, added.clone())?;
        Ok(ElementEdit::new(index, removed, added))
    }

    /// Swaps `expected` at `index` for `replacement`, verifying that the tree
    /// still holds exactly `expected` there.
    pub(crate) fn swap_run(
        &mut self,
        index: usize,
        expected: &[Element],
        replacement: Vec<Element>,
    ) -> Result<()> {
        let matches = expected
            .iter()
            .enumerate()
            .all(|(k, element)| self.children.get(index + k) == Some(element));
        if !matches {
            tracing::error!(index, count = expected.len(), "element delta does not match tree");
            return Err(DocumentError::InternalInconsistency(format!(
                "children at {} do not match the recorded delta",
                index
            )));
        }
        self.children.replace(index, expected.len(), replacement)?;
        Ok(())
    }

    /// Verifies that children are ordered by start offset and that no child
    /// range is inverted.
    pub fn check_integrity(&self, marks: &MarkVector, end_hint: usize) -> Result<()> {
        let mut previous = None;
        for index in 0..self.children.len() {
            let range = self.child_range(marks, index, end_hint)?;
            if range.start > range.end || previous.is_some_and(|p| p > range.start) {
                return Err(DocumentError::InternalInconsistency(format!(
                    "child {} spans {:?} after start {:?}",
                    index, range, previous
                )));
            }
            if let Some(Element::Branch(branch)) = self.children.get(index) {
                branch.check_integrity(marks, range.end)?;
            }
            previous = Some(range.start);
        }
        Ok(())
    }

    /// Disposes the marks of every descendant.
    pub fn dispose_marks(&self, marks: &mut MarkVector) -> Result<()> {
        for child in self.children.iter() {
            child.dispose_marks(marks)?;
        }
        Ok(())
    }
}
