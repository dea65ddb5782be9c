// Chunk: docs/chunks/document_host - Text, marks, lines and history in one place

//! The document host.
//!
//! A [`Document`] owns the character buffer and everything that tracks
//! positions in it: the mark vector, the line tree and the guarded blocks.
//! Every edit goes through [`Document::insert_string`] or
//! [`Document::remove`], which mutate the buffer, notify the marks before
//! returning, keep one [`LineElement`] per line and record an undo step.

use std::ops::Range;

use lite_edit_buffer::GapBuffer;

use crate::config::DocumentConfig;
use crate::element::{BranchElement, Element, ElementEdit, LineElement};
use crate::error::{DocumentError, Result};
use crate::guarded::GuardedBlocks;
use crate::mark::{Bias, MarkId};
use crate::mark_vector::{MarkRestore, MarkVector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditKind {
    Insert,
    Remove,
}

/// One step of history.
///
/// `restores` holds the marks the last removal of `text` collapsed: for a
/// `Remove` that is the edit itself, for an undone `Insert` it is the undo.
#[derive(Debug, Clone)]
struct DocumentEdit {
    kind: EditKind,
    offset: usize,
    text: String,
    restores: Vec<MarkRestore>,
    line_edit: Option<ElementEdit>,
}

impl DocumentEdit {
    fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    fn discard(self, marks: &mut MarkVector) -> Result<()> {
        match self.line_edit {
            Some(edit) => edit.dispose_detached(marks),
            None => Ok(()),
        }
    }
}

/// A text document with marks, lines, guarded blocks and undo history.
#[derive(Debug, Clone)]
pub struct Document {
    config: DocumentConfig,
    text: GapBuffer,
    marks: MarkVector,
    lines: BranchElement,
    guarded: GuardedBlocks,
    undo_stack: Vec<DocumentEdit>,
    redo_stack: Vec<DocumentEdit>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self::with_config(DocumentConfig::default())
    }

    pub fn with_config(config: DocumentConfig) -> Self {
        Self::from_str_with_config("", config)
    }

    /// Creates a document holding `content`, with an empty history.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Self {
        Self::from_str_with_config(content, DocumentConfig::default())
    }

    /// Creates a document holding `content` with the given settings.
    pub fn from_str_with_config(content: &str, config: DocumentConfig) -> Self {
        let mut marks = MarkVector::with_compaction_min(config.mark_compaction_min);
        let lines = Self::build_lines(&mut marks, content);
        Self {
            text: GapBuffer::from_str_with_gap_size(content, config.initial_gap_size),
            marks,
            lines,
            guarded: GuardedBlocks::new(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            config,
        }
    }

    fn build_lines(marks: &mut MarkVector, content: &str) -> BranchElement {
        let starts = std::iter::once(0).chain(
            content
                .chars()
                .enumerate()
                .filter(|(_, ch)| *ch == '\n')
                .map(|(i, _)| i + 1),
        );
        let mut children = Vec::new();
        for start in starts {
            // A fresh mark vector cannot fail to create a mark.
            if let Ok(line) = LineElement::new(marks, start) {
                children.push(Element::Line(line));
            }
        }
        BranchElement::from_children(children)
    }

    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn text(&self) -> String {
        self.text.to_string()
    }

    /// Characters in `start..end`.
    pub fn chars(&self, start: usize, end: usize) -> Result<String> {
        Ok(self.text.slice(start, end)?)
    }

    fn check_offset(&self, offset: usize) -> Result<()> {
        if offset > self.len() {
            return Err(DocumentError::OutOfRange {
                offset,
                len: self.len(),
            });
        }
        Ok(())
    }

    // ==================== Editing ====================

    /// Inserts `text` at `offset`.
    ///
    /// Fails with [`DocumentError::Guarded`] when `offset` lies strictly inside
    /// a guarded block; inserting at a block edge is allowed.
    pub fn insert_string(&mut self, offset: usize, text: &str) -> Result<()> {
        self.check_offset(offset)?;
        if self.guarded.overlaps(&self.marks, offset, offset)? {
            return Err(DocumentError::Guarded { offset });
        }
        if text.is_empty() {
            return Ok(());
        }

        let line_edit = self.apply_insert(offset, text)?;
        tracing::debug!(offset, len = text.chars().count(), "insert");
        self.record(DocumentEdit {
            kind: EditKind::Insert,
            offset,
            text: text.to_string(),
            restores: Vec::new(),
            line_edit,
        })
    }

    /// Removes `len` characters at `offset` and returns them.
    ///
    /// Fails with [`DocumentError::Guarded`] when the range intersects a guarded
    /// block.
    pub fn remove(&mut self, offset: usize, len: usize) -> Result<String> {
        let end = offset.checked_add(len).ok_or(DocumentError::OutOfRange {
            offset,
            len: self.len(),
        })?;
        self.check_offset(end)?;
        if len == 0 {
            return Ok(String::new());
        }
        if self.guarded.overlaps(&self.marks, offset, end)? {
            return Err(DocumentError::Guarded { offset });
        }

        let (text, restores, line_edit) = self.apply_remove(offset, len)?;
        self.guarded.settle(&mut self.marks)?;
        tracing::debug!(offset, len, "remove");
        self.record(DocumentEdit {
            kind: EditKind::Remove,
            offset,
            text: text.clone(),
            restores,
            line_edit,
        })?;
        Ok(text)
    }

    /// Buffer insert, mark notification and new line elements.
    fn apply_insert(&mut self, offset: usize, text: &str) -> Result<Option<ElementEdit>> {
        let len = self.text.insert_str(offset, text)?;
        self.marks.notify_insert(offset, len)?;

        let mut added = Vec::new();
        for (i, ch) in text.chars().enumerate() {
            if ch == '\n' {
                added.push(Element::Line(LineElement::new(&mut self.marks, offset + i + 1)?));
            }
        }
        if added.is_empty() {
            return Ok(None);
        }
        let index = self.lines.element_index(&self.marks, offset)?.map_or(0, |i| i + 1);
        Ok(Some(self.lines.replace(index, 0, added)?))
    }

    /// Buffer remove, mark notification and removal of lines whose newline was
    /// removed.
    fn apply_remove(
        &mut self,
        offset: usize,
        len: usize,
    ) -> Result<(String, Vec<MarkRestore>, Option<ElementEdit>)> {
        // Lines starting in (offset, offset + len] lose their newline.
        let first = self.lines.element_index(&self.marks, offset)?.map_or(0, |i| i + 1);
        let mut count = 0;
        while let Some(line) = self.lines.element(first + count) {
            if line.start_offset(&self.marks)? > offset + len {
                break;
            }
            count += 1;
        }

        let text = self.text.remove(offset, len)?;
        let restores = self.marks.notify_remove(offset, len)?;
        let line_edit = if count > 0 {
            Some(self.lines.replace(first, count, Vec::new())?)
        } else {
            None
        };
        Ok((text, restores, line_edit))
    }

    fn record(&mut self, edit: DocumentEdit) -> Result<()> {
        for discarded in std::mem::take(&mut self.redo_stack) {
            discarded.discard(&mut self.marks)?;
        }
        self.undo_stack.push(edit);
        let limit = self.config.undo_limit;
        while limit > 0 && self.undo_stack.len() > limit {
            self.undo_stack.remove(0).discard(&mut self.marks)?;
        }
        Ok(())
    }

    // ==================== History ====================

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Reverts the most recent edit. Returns `false` when there is none.
    ///
    /// History replays ignore guarded blocks; blocks an undo collapses are
    /// dropped.
    pub fn undo(&mut self) -> Result<bool> {
        let Some(mut edit) = self.undo_stack.pop() else {
            return Ok(false);
        };
        let len = edit.char_len();
        match edit.kind {
            EditKind::Insert => {
                self.text.remove(edit.offset, len)?;
                edit.restores = self.marks.notify_remove(edit.offset, len)?;
                if let Some(line_edit) = edit.line_edit.as_mut() {
                    line_edit.undo(&mut self.lines)?;
                }
            }
            EditKind::Remove => {
                self.text.insert_str(edit.offset, &edit.text)?;
                self.marks.notify_insert(edit.offset, len)?;
                self.marks.restore_marks(edit.offset, len, &edit.restores)?;
                if let Some(line_edit) = edit.line_edit.as_mut() {
                    line_edit.undo(&mut self.lines)?;
                }
            }
        }
        self.guarded.settle(&mut self.marks)?;
        tracing::debug!(offset = edit.offset, kind = ?edit.kind, "undo");
        self.redo_stack.push(edit);
        Ok(true)
    }

    /// Reapplies the most recently undone edit. Returns `false` when there is
    /// none.
    pub fn redo(&mut self) -> Result<bool> {
        let Some(mut edit) = self.redo_stack.pop() else {
            return Ok(false);
        };
        let len = edit.char_len();
        match edit.kind {
            EditKind::Insert => {
                self.text.insert_str(edit.offset, &edit.text)?;
                self.marks.notify_insert(edit.offset, len)?;
                self.marks.restore_marks(edit.offset, len, &edit.restores)?;
                edit.restores.clear();
                if let Some(line_edit) = edit.line_edit.as_mut() {
                    line_edit.redo(&mut self.lines)?;
                }
            }
            EditKind::Remove => {
                self.text.remove(edit.offset, len)?;
                edit.restores = self.marks.notify_remove(edit.offset, len)?;
                if let Some(line_edit) = edit.line_edit.as_mut() {
                    line_edit.redo(&mut self.lines)?;
                }
            }
        }
        self.guarded.settle(&mut self.marks)?;
        tracing::debug!(offset = edit.offset, kind = ?edit.kind, "redo");
        self.undo_stack.push(edit);
        Ok(true)
    }

    /// Drops all history, disposing marks held only by history.
    pub fn clear_history(&mut self) -> Result<()> {
        for edit in std::mem::take(&mut self.redo_stack) {
            edit.discard(&mut self.marks)?;
        }
        for edit in std::mem::take(&mut self.undo_stack) {
            edit.discard(&mut self.marks)?;
        }
        Ok(())
    }

    // ==================== Marks ====================

    pub fn create_mark(&mut self, offset: usize, bias: Bias) -> Result<MarkId> {
        self.check_offset(offset)?;
        self.marks.insert_mark(offset, bias)
    }

    /// Creates a forward mark that sticks at offset 0 once it reaches it.
    pub fn create_compatible_mark(&mut self, offset: usize) -> Result<MarkId> {
        self.check_offset(offset)?;
        self.marks.insert_compatible_mark(offset)
    }

    pub fn mark_offset(&self, mark: MarkId) -> Result<usize> {
        self.marks.offset(mark)
    }

    pub fn dispose_mark(&mut self, mark: MarkId) -> Result<()> {
        self.marks.dispose(mark)
    }

    pub fn marks(&self) -> &MarkVector {
        &self.marks
    }

    // ==================== Lines ====================

    pub fn line_count(&self) -> usize {
        self.lines.element_count()
    }

    /// The line root: one [`LineElement`] per line.
    pub fn lines(&self) -> &BranchElement {
        &self.lines
    }

    /// Line containing `offset`.
    pub fn line_index(&self, offset: usize) -> Result<usize> {
        self.check_offset(offset)?;
        Ok(self.lines.element_index(&self.marks, offset)?.unwrap_or(0))
    }

    fn line_range(&self, line: usize) -> Result<Range<usize>> {
        if line >= self.line_count() {
            return Err(DocumentError::OutOfRange {
                offset: line,
                len: self.line_count(),
            });
        }
        self.lines.child_range(&self.marks, line, self.len())
    }

    pub fn line_start(&self, line: usize) -> Result<usize> {
        Ok(self.line_range(line)?.start)
    }

    /// End of `line`, excluding its newline.
    pub fn line_end(&self, line: usize) -> Result<usize> {
        let range = self.line_range(line)?;
        if line + 1 < self.line_count() {
            Ok(range.end - 1)
        } else {
            Ok(range.end)
        }
    }

    /// Text of `line` without its newline.
    pub fn line_content(&self, line: usize) -> Result<String> {
        self.chars(self.line_start(line)?, self.line_end(line)?)
    }

    // ==================== Guarded blocks ====================

    pub fn add_guarded_block(&mut self, start: usize, end: usize) -> Result<()> {
        self.check_offset(end)?;
        if start > end {
            return Err(DocumentError::OutOfRange {
                offset: start,
                len: end,
            });
        }
        self.guarded.add_block(&mut self.marks, start, end)
    }

    pub fn remove_guarded_block(&mut self, start: usize, end: usize) -> Result<()> {
        self.guarded.remove_block(&mut self.marks, start, end)
    }

    /// Whether the character at `offset` is guarded.
    pub fn is_guarded(&mut self, offset: usize) -> Result<bool> {
        self.check_offset(offset)?;
        self.guarded.is_guarded(&self.marks, offset)
    }

    pub fn guarded_blocks(&self) -> Result<Vec<Range<usize>>> {
        self.guarded.blocks(&self.marks)
    }

    /// Verifies mark storage and the line tree against the text.
    pub fn check_integrity(&self) -> Result<()> {
        self.marks.check_integrity()?;
        self.lines.check_integrity(&self.marks, self.len())?;
        self.guarded.check_integrity(&self.marks)?;
        if self.line_start(0)? != 0 {
            return Err(DocumentError::InternalInconsistency(
                "first line does not start at 0".into(),
            ));
        }
        for line in 1..self.line_count() {
            let start = self.line_start(line)?;
            if start == 0 || self.text.char_at(start - 1) != Some('\n') {
                tracing::error!(line, start, "line start does not follow a newline");
                return Err(DocumentError::InternalInconsistency(format!(
                    "line {} starts at {} without a preceding newline",
                    line, start
                )));
            }
        }
        Ok(())
    }
}
