// Chunk: docs/chunks/guarded_blocks - Read-only ranges built on a mark chain

//! Guarded blocks: document ranges that edits may not touch.
//!
//! Blocks live in a [`MarkChain`] as alternating start and end boundaries. A
//! start mark is forward-biased and activating, an end mark backward-biased and
//! deactivating, so text inserted at either edge lands outside the block.
//!
//! Removing the text between two blocks leaves them touching. They stay two
//! blocks: the end of the first and the start of the second share an offset,
//! end first, and an insert there separates them again.

use std::ops::Range;

use crate::error::{DocumentError, Result};
use crate::mark::{Bias, MarkId};
use crate::mark_chain::MarkChain;
use crate::mark_vector::MarkVector;

struct Block {
    start: MarkId,
    end: MarkId,
    range: Range<usize>,
}

/// Set of disjoint guarded ranges in document order.
///
/// [`add_block`](Self::add_block) merges touching blocks; only edits to the
/// text between two blocks can make them touch.
#[derive(Debug, Clone, Default)]
pub struct GuardedBlocks {
    chain: MarkChain,
}

impl GuardedBlocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    fn block_marks(&self, marks: &MarkVector) -> Result<Vec<Block>> {
        let entries: Vec<_> = self.chain.iter().collect();
        if entries.len() % 2 != 0 {
            return Err(DocumentError::InternalInconsistency(format!(
                "guarded chain has {} boundaries",
                entries.len()
            )));
        }
        let offsets = self.chain.offsets(marks)?;
        entries
            .chunks(2)
            .zip(offsets.chunks(2))
            .map(|(pair, range)| {
                if !pair[0].activate || pair[1].activate {
                    return Err(DocumentError::InternalInconsistency(
                        "guarded chain boundaries do not alternate".into(),
                    ));
                }
                Ok(Block {
                    start: pair[0].mark,
                    end: pair[1].mark,
                    range: range[0]..range[1],
                })
            })
            .collect()
    }

    /// Current block ranges in document order.
    pub fn blocks(&self, marks: &MarkVector) -> Result<Vec<Range<usize>>> {
        Ok(self
            .block_marks(marks)?
            .into_iter()
            .map(|block| block.range)
            .collect())
    }

    fn insert_block(&mut self, marks: &mut MarkVector, range: Range<usize>) -> Result<()> {
        self.chain
            .add_mark_with(marks, range.start, Bias::Forward, true)?;
        self.chain
            .add_mark_with(marks, range.end, Bias::Backward, false)?;
        Ok(())
    }

    fn drop_block(&mut self, marks: &mut MarkVector, block: &Block) -> Result<()> {
        self.chain.remove_mark_id(marks, block.start)?;
        self.chain.remove_mark_id(marks, block.end)?;
        Ok(())
    }

    /// Guards `start..end`, merging with overlapping or touching blocks.
    /// An empty range is ignored.
    pub fn add_block(&mut self, marks: &mut MarkVector, start: usize, end: usize) -> Result<()> {
        if start >= end {
            return Ok(());
        }
        let mut merged = start..end;
        for block in self.block_marks(marks)? {
            if block.range.start <= end && block.range.end >= start {
                merged.start = merged.start.min(block.range.start);
                merged.end = merged.end.max(block.range.end);
                self.drop_block(marks, &block)?;
            }
        }
        tracing::debug!(start = merged.start, end = merged.end, "guarded block added");
        self.insert_block(marks, merged)
    }

    /// Unguards `start..end`, splitting blocks that extend past it.
    pub fn remove_block(&mut self, marks: &mut MarkVector, start: usize, end: usize) -> Result<()> {
        if start >= end {
            return Ok(());
        }
        for block in self.block_marks(marks)? {
            if block.range.start < end && block.range.end > start {
                self.drop_block(marks, &block)?;
                if block.range.start < start {
                    self.insert_block(marks, block.range.start..start)?;
                }
                if end < block.range.end {
                    self.insert_block(marks, end..block.range.end)?;
                }
            }
        }
        Ok(())
    }

    /// Whether the character at `pos` is guarded.
    pub fn is_guarded(&mut self, marks: &MarkVector, pos: usize) -> Result<bool> {
        if let Some(activate) = self.chain.last_activation_at(marks, pos)? {
            return Ok(activate);
        }
        // `last_activation_at` left the cursor on a neighbour of `pos`.
        Ok(match (self.chain.compare_mark(marks, pos)?, self.chain.current()) {
            (Some(std::cmp::Ordering::Less), Some(entry)) => entry.activate,
            (Some(std::cmp::Ordering::Greater), Some(entry)) => !entry.activate,
            _ => false,
        })
    }

    /// Whether `start..end` intersects a guarded block. An empty range checks
    /// whether `start` lies strictly inside a block.
    pub fn overlaps(&self, marks: &MarkVector, start: usize, end: usize) -> Result<bool> {
        Ok(self.blocks(marks)?.iter().any(|block| {
            if start == end {
                block.start < start && start < block.end
            } else {
                block.start < end && block.end > start
            }
        }))
    }

    /// Brings the chain back in line after text was removed or restored:
    /// drops collapsed blocks, then reorders boundaries that moved past each
    /// other.
    pub fn settle(&mut self, marks: &mut MarkVector) -> Result<()> {
        self.prune_empty(marks)?;
        self.chain.normalize(marks)?;
        Ok(())
    }

    /// Drops blocks that edits collapsed to nothing.
    pub fn prune_empty(&mut self, marks: &mut MarkVector) -> Result<()> {
        for block in self.block_marks(marks)? {
            if block.range.start >= block.range.end {
                tracing::debug!(offset = block.range.start, "pruning collapsed guarded block");
                self.drop_block(marks, &block)?;
            }
        }
        Ok(())
    }

    /// Verifies boundary alternation and that blocks are non-empty, ordered
    /// and disjoint.
    pub fn check_integrity(&self, marks: &MarkVector) -> Result<()> {
        let blocks = self.blocks(marks)?;
        for block in &blocks {
            if block.start >= block.end {
                tracing::error!(start = block.start, end = block.end, "empty guarded block");
                return Err(DocumentError::InternalInconsistency(format!(
                    "empty guarded block {}..{}",
                    block.start, block.end
                )));
            }
        }
        if let Some(pair) = blocks.windows(2).find(|pair| pair[0].end > pair[1].start) {
            tracing::error!(first = ?pair[0], second = ?pair[1], "guarded blocks overlap");
            return Err(DocumentError::InternalInconsistency(format!(
                "guarded blocks {:?} and {:?} overlap",
                pair[0], pair[1]
            )));
        }
        Ok(())
    }

    /// Disposes all block marks.
    pub fn clear(&mut self, marks: &mut MarkVector) -> Result<()> {
        self.chain.clear(marks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_query() {
        let mut marks = MarkVector::new();
        let mut guarded = GuardedBlocks::new();
        guarded.add_block(&mut marks, 3, 6).unwrap();
        guarded.add_block(&mut marks, 10, 12).unwrap();
        assert_eq!(guarded.blocks(&marks).unwrap(), vec![3..6, 10..12]);

        let inside: Vec<usize> = (0..14)
            .filter(|p| guarded.is_guarded(&marks, *p).unwrap())
            .collect();
        assert_eq!(inside, vec![3, 4, 5, 10, 11]);
    }

    #[test]
    fn overlapping_and_touching_blocks_merge() {
        let mut marks = MarkVector::new();
        let mut guarded = GuardedBlocks::new();
        guarded.add_block(&mut marks, 2, 4).unwrap();
        guarded.add_block(&mut marks, 8, 9).unwrap();
        guarded.add_block(&mut marks, 4, 8).unwrap();
        assert_eq!(guarded.blocks(&marks).unwrap(), vec![2..9]);
        assert_eq!(marks.live_mark_count(), 2);
    }

    #[test]
    fn remove_splits_block() {
        let mut marks = MarkVector::new();
        let mut guarded = GuardedBlocks::new();
        guarded.add_block(&mut marks, 0, 10).unwrap();
        guarded.remove_block(&mut marks, 3, 5).unwrap();
        assert_eq!(guarded.blocks(&marks).unwrap(), vec![0..3, 5..10]);
        guarded.remove_block(&mut marks, 0, 20).unwrap();
        assert!(guarded.is_empty());
        assert_eq!(marks.live_mark_count(), 0);
    }

    #[test]
    fn inserts_at_edges_stay_outside() {
        let mut marks = MarkVector::new();
        let mut guarded = GuardedBlocks::new();
        guarded.add_block(&mut marks, 4, 8).unwrap();
        marks.notify_insert(8, 2).unwrap();
        marks.notify_insert(4, 3).unwrap();
        assert_eq!(guarded.blocks(&marks).unwrap(), vec![7..11]);
    }

    #[test]
    fn overlaps_checks_interior() {
        let mut marks = MarkVector::new();
        let mut guarded = GuardedBlocks::new();
        guarded.add_block(&mut marks, 4, 8).unwrap();
        assert!(guarded.overlaps(&marks, 2, 5).unwrap());
        assert!(!guarded.overlaps(&marks, 0, 4).unwrap());
        assert!(!guarded.overlaps(&marks, 4, 4).unwrap());
        assert!(guarded.overlaps(&marks, 5, 5).unwrap());
    }

    #[test]
    fn touching_blocks_keep_their_own_boundaries() {
        let mut marks = MarkVector::new();
        let mut guarded = GuardedBlocks::new();
        guarded.add_block(&mut marks, 0, 2).unwrap();
        guarded.add_block(&mut marks, 4, 6).unwrap();
        marks.notify_remove(2, 2).unwrap();
        guarded.settle(&mut marks).unwrap();
        assert_eq!(guarded.blocks(&marks).unwrap(), vec![0..2, 2..4]);

        let inside: Vec<usize> = (0..5)
            .filter(|p| guarded.is_guarded(&marks, *p).unwrap())
            .collect();
        assert_eq!(inside, vec![0, 1, 2, 3]);
        assert!(!guarded.overlaps(&marks, 2, 2).unwrap());

        guarded.remove_block(&mut marks, 3, 4).unwrap();
        assert_eq!(guarded.blocks(&marks).unwrap(), vec![0..2, 2..3]);
        assert_eq!(marks.live_mark_count(), 4);

        marks.notify_insert(2, 1).unwrap();
        assert_eq!(guarded.blocks(&marks).unwrap(), vec![0..2, 3..4]);
    }

    #[test]
    fn collapsed_block_is_pruned() {
        let mut marks = MarkVector::new();
        let mut guarded = GuardedBlocks::new();
        guarded.add_block(&mut marks, 4, 8).unwrap();
        marks.notify_remove(2, 10).unwrap();
        guarded.prune_empty(&mut marks).unwrap();
        assert!(guarded.blocks(&marks).unwrap().is_empty());
        assert_eq!(marks.live_mark_count(), 0);
    }
}
