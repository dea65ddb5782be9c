// Chunk: docs/chunks/element_tree - Line, leaf and branch element views

//! Element tree: thin views over marks.
//!
//! Elements never store offsets. A line holds one start mark, a leaf holds a
//! start and an end mark, and a branch holds child elements. Offsets are
//! resolved through the document's [`MarkVector`] on every query, so the tree is
//! always consistent with the marks after an edit.

mod branch;
mod leaf;
mod line;

pub use branch::BranchElement;
pub use leaf::LeafElement;
pub use line::LineElement;

use crate::error::{DocumentError, Result};
use crate::mark_vector::MarkVector;

/// A node of the element tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Line(LineElement),
    Leaf(LeafElement),
    Branch(BranchElement),
}

impl Element {
    pub fn start_offset(&self, marks: &MarkVector) -> Result<usize> {
        match self {
            Element::Line(line) => line.start_offset(marks),
            Element::Leaf(leaf) => leaf.start_offset(marks),
            Element::Branch(branch) => branch.start_offset(marks),
        }
    }

    pub fn is_leaf(&self) -> bool {
        !matches!(self, Element::Branch(_))
    }

    /// Disposes every mark this element (and its descendants) owns.
    pub fn dispose_marks(&self, marks: &mut MarkVector) -> Result<()> {
        match self {
            Element::Line(line) => marks.dispose(line.start_mark()),
            Element::Leaf(leaf) => {
                marks.dispose(leaf.start_mark())?;
                marks.dispose(leaf.end_mark())
            }
            Element::Branch(branch) => branch.dispose_marks(marks),
        }
    }
}

/// Reversible record of one [`BranchElement::replace`].
///
/// While the edit is applied, `removed` holds children that are detached from
/// the tree; after [`undo`](Self::undo) it is `added` that is detached. Detached
/// children still own live marks, released with
/// [`dispose_detached`](Self::dispose_detached) when the edit is dropped from
/// history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementEdit {
    pub index: usize,
    pub removed: Vec<Element>,
    pub added: Vec<Element>,
    undone: bool,
}

impl ElementEdit {
    pub(crate) fn new(index: usize, removed: Vec<Element>, added: Vec<Element>) -> Self {
        Self {
            index,
            removed,
            added,
            undone: false,
        }
    }

    pub fn is_undone(&self) -> bool {
        self.undone
    }

    /// Restores the children that were present before the edit.
    pub fn undo(&mut self, branch: &mut BranchElement) -> Result<()> {
        if self.undone {
            return Err(DocumentError::InvalidState("element edit already undone".into()));
        }
        branch.swap_run(self.index, &self.added, self.removed.clone())?;
        self.undone = true;
        Ok(())
    }

    /// Reapplies an undone edit.
    pub fn redo(&mut self, branch: &mut BranchElement) -> Result<()> {
        if !self.undone {
            return Err(DocumentError::InvalidState("element edit not undone".into()));
        }
        branch.swap_run(self.index, &self.removed, self.added.clone())?;
        self.undone = false;
        Ok(())
    }

    /// Disposes the marks of the children that are not in the tree.
    pub fn dispose_detached(self, marks: &mut MarkVector) -> Result<()> {
        let detached = if self.undone { self.added } else { self.removed };
        for element in &detached {
            element.dispose_marks(marks)?;
        }
        Ok(())
    }
}
