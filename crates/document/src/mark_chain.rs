// Chunk: docs/chunks/mark_chain - Ordered boundary marks with cursor search

//! Ordered chain of boundary marks.
//!
//! A [`MarkChain`] links marks of one boundary set (guarded-block edges, draw
//! layer activation points) in document order. Each node also carries an
//! `activate` flag telling whether the boundary opens or closes a range.
//!
//! Lookups start from a cursor left at the node visited last, so sequential
//! queries (painting, scanning) walk only the distance between two positions.

use std::cmp::Ordering;

use crate::error::{DocumentError, Result};
use crate::mark::{Bias, MarkId};
use crate::mark_vector::MarkVector;

#[derive(Debug, Clone)]
struct ChainNode {
    mark: MarkId,
    activate: bool,
    prev: Option<usize>,
    next: Option<usize>,
}

/// One boundary of a chain, in chain order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainEntry {
    pub mark: MarkId,
    pub activate: bool,
}

/// Doubly linked chain of marks kept in ascending offset order.
#[derive(Debug, Clone)]
pub struct MarkChain {
    nodes: Vec<Option<ChainNode>>,
    free: Vec<usize>,
    head: Option<usize>,
    cursor: Option<usize>,
    bias: Bias,
    len: usize,
}

impl MarkChain {
    /// Creates an empty chain whose [`add_mark`](Self::add_mark) uses `bias`.
    pub fn new(bias: Bias) -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            head: None,
            cursor: None,
            bias,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Mark under the cursor, if the chain has been searched.
    pub fn current(&self) -> Option<ChainEntry> {
        self.cursor
            .and_then(|i| self.nodes.get(i))
            .and_then(Option::as_ref)
            .map(|node| ChainEntry {
                mark: node.mark,
                activate: node.activate,
            })
    }

    fn node(&self, index: usize) -> Result<&ChainNode> {
        match self.nodes.get(index) {
            Some(Some(node)) => Ok(node),
            _ => {
                tracing::error!(index, "chain link to a freed node");
                Err(DocumentError::InternalInconsistency(format!(
                    "chain link to freed node {}",
                    index
                )))
            }
        }
    }

    fn node_mut(&mut self, index: usize) -> Result<&mut ChainNode> {
        match self.nodes.get_mut(index) {
            Some(Some(node)) => Ok(node),
            _ => Err(DocumentError::InternalInconsistency(format!(
                "chain link to freed node {}",
                index
            ))),
        }
    }

    fn node_offset(&self, marks: &MarkVector, index: usize) -> Result<usize> {
        let mark = self.node(index)?.mark;
        marks.offset(mark).map_err(|_| {
            tracing::error!(%mark, "chain links a disposed mark");
            DocumentError::InternalInconsistency(format!("chain links disposed {}", mark))
        })
    }

    /// Compares the mark nearest to `pos` with `pos`.
    ///
    /// Walks from the cursor towards `pos` and leaves the cursor on the node
    /// where the walk stopped: the mark at `pos` (`Equal`), the last mark
    /// before it (`Less`) or the first mark after it (`Greater`), except at
    /// the chain ends. Returns `None` for an empty chain.
    pub fn compare_mark(&mut self, marks: &MarkVector, pos: usize) -> Result<Option<Ordering>> {
        let Some(mut cur) = self.cursor.or(self.head) else {
            return Ok(None);
        };

        let mut before = false;
        let mut after = false;
        let relation = loop {
            let relation = self.node_offset(marks, cur)?.cmp(&pos);
            let node = self.node(cur)?;
            match relation {
                Ordering::Equal => break Ordering::Equal,
                Ordering::Greater => match node.prev {
                    Some(prev) if !before => {
                        after = true;
                        cur = prev;
                    }
                    _ => break Ordering::Greater,
                },
                Ordering::Less => match node.next {
                    Some(next) if !after => {
                        before = true;
                        cur = next;
                    }
                    _ => break Ordering::Less,
                },
            }
        };

        self.cursor = Some(cur);
        Ok(Some(relation))
    }

    fn alloc(&mut self, node: ChainNode) -> usize {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            self.nodes[index] = Some(node);
            index
        } else {
            self.nodes.push(Some(node));
            self.nodes.len() - 1
        }
    }

    /// Adds a mark at `pos` using the chain bias.
    ///
    /// Returns `(false, existing)` when a mark with the chain bias is already
    /// at `pos`.
    pub fn add_mark(&mut self, marks: &mut MarkVector, pos: usize) -> Result<(bool, MarkId)> {
        self.add_mark_with(marks, pos, self.bias, true)
    }

    /// Adds a mark at `pos` with an explicit bias and activation flag.
    ///
    /// A node at `pos` with the same bias and flag is reused. Otherwise the new
    /// node joins the run at `pos` after the nodes that stay put on an insert
    /// there when it moves, and before them when it does not.
    pub fn add_mark_with(
        &mut self,
        marks: &mut MarkVector,
        pos: usize,
        bias: Bias,
        activate: bool,
    ) -> Result<(bool, MarkId)> {
        let relation = self.compare_mark(marks, pos)?;
        let rank = match bias {
            Bias::Backward => 0,
            Bias::Forward => 1,
        };

        let (prev, next) = match (relation, self.cursor) {
            (Some(Ordering::Equal), Some(cur)) => {
                let first = self.run_start(marks, cur, pos)?;
                if let Some(existing) = self.find_in_run(marks, first, pos, bias, activate)? {
                    self.cursor = Some(existing);
                    return Ok((false, self.node(existing)?.mark));
                }
                self.slot_in_run(marks, first, pos, rank)?
            }
            (Some(Ordering::Greater), Some(cur)) => (self.node(cur)?.prev, Some(cur)),
            (Some(Ordering::Less), Some(cur)) => (Some(cur), self.node(cur)?.next),
            _ => (None, None),
        };

        let mark = marks.insert_mark(pos, bias)?;
        let index = self.alloc(ChainNode {
            mark,
            activate,
            prev,
            next,
        });
        match prev {
            Some(prev) => self.node_mut(prev)?.next = Some(index),
            None => self.head = Some(index),
        }
        if let Some(next) = next {
            self.node_mut(next)?.prev = Some(index);
        }
        self.cursor = Some(index);

        tracing::trace!(pos, %mark, "chain mark added");
        Ok((true, mark))
    }

    fn node_rank(&self, marks: &MarkVector, index: usize) -> Result<u8> {
        let mark = self.node(index)?.mark;
        Ok(marks.flags(mark)?.rank())
    }

    /// First node of the run at `pos` that contains `cur`.
    fn run_start(&self, marks: &MarkVector, mut cur: usize, pos: usize) -> Result<usize> {
        while let Some(prev) = self.node(cur)?.prev {
            if self.node_offset(marks, prev)? != pos {
                break;
            }
            cur = prev;
        }
        Ok(cur)
    }

    fn find_in_run(
        &self,
        marks: &MarkVector,
        first: usize,
        pos: usize,
        bias: Bias,
        activate: bool,
    ) -> Result<Option<usize>> {
        let mut cur = Some(first);
        while let Some(index) = cur {
            if self.node_offset(marks, index)? != pos {
                break;
            }
            let node = self.node(index)?;
            if node.activate == activate && marks.bias(node.mark)? == bias {
                return Ok(Some(index));
            }
            cur = node.next;
        }
        Ok(None)
    }

    /// Links between which a node of `rank` belongs in the run at `pos`.
    fn slot_in_run(
        &self,
        marks: &MarkVector,
        first: usize,
        pos: usize,
        rank: u8,
    ) -> Result<(Option<usize>, Option<usize>)> {
        let mut prev = self.node(first)?.prev;
        let mut next = Some(first);
        while let Some(index) = next {
            if self.node_offset(marks, index)? != pos || self.node_rank(marks, index)? > rank {
                break;
            }
            prev = Some(index);
            next = self.node(index)?.next;
        }
        Ok((prev, next))
    }

    /// Reorders the chain after a removal or an undo moved its marks.
    ///
    /// A removal can collapse a moving node onto a stationary one that follows
    /// it, and restoring collapsed marks can spread a run out of order. Links
    /// are sorted by offset, stationary nodes first within an offset, keeping
    /// the existing order among equals. Returns whether anything moved.
    pub fn normalize(&mut self, marks: &MarkVector) -> Result<bool> {
        let mut slots = Vec::with_capacity(self.len);
        let mut cur = self.head;
        while let Some(index) = cur {
            let key = (self.node_offset(marks, index)?, self.node_rank(marks, index)?);
            let node = self.node(index)?;
            slots.push((index, key, node.mark, node.activate));
            cur = node.next;
        }
        if slots.windows(2).all(|pair| pair[0].1 <= pair[1].1) {
            return Ok(false);
        }

        let mut payloads: Vec<_> = slots
            .iter()
            .map(|&(_, key, mark, activate)| (key, mark, activate))
            .collect();
        payloads.sort_by_key(|&(key, _, _)| key);
        for (&(index, ..), (_, mark, activate)) in slots.iter().zip(payloads) {
            let node = self.node_mut(index)?;
            node.mark = mark;
            node.activate = activate;
        }
        tracing::debug!(len = self.len, "chain reordered");
        Ok(true)
    }

    /// Unlinks node `index`, disposes its mark and moves the cursor to a
    /// neighbour.
    fn unlink(&mut self, marks: &mut MarkVector, index: usize) -> Result<()> {
        let node = self.node(index)?.clone();
        match node.prev {
            Some(prev) => self.node_mut(prev)?.next = node.next,
            None => self.head = node.next,
        }
        if let Some(next) = node.next {
            self.node_mut(next)?.prev = node.prev;
        }
        self.nodes[index] = None;
        self.free.push(index);
        self.len -= 1;
        self.cursor = node.next.or(node.prev);
        marks.dispose(node.mark)
    }

    /// Removes the mark at `pos`. Returns `false` if there is none.
    pub fn remove_mark(&mut self, marks: &mut MarkVector, pos: usize) -> Result<bool> {
        if self.compare_mark(marks, pos)? != Some(Ordering::Equal) {
            return Ok(false);
        }
        match self.cursor {
            Some(cur) => {
                self.unlink(marks, cur)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Removes the node holding `mark`. Returns `false` if the chain does not
    /// contain it.
    pub fn remove_mark_id(&mut self, marks: &mut MarkVector, mark: MarkId) -> Result<bool> {
        let Ok(pos) = marks.offset(mark) else {
            return Ok(false);
        };
        if self.compare_mark(marks, pos)? != Some(Ordering::Equal) {
            return Ok(false);
        }
        let Some(cur) = self.cursor else {
            return Ok(false);
        };

        let mut cur = self.run_start(marks, cur, pos)?;
        loop {
            if self.node(cur)?.mark == mark {
                self.unlink(marks, cur)?;
                return Ok(true);
            }
            match self.node(cur)?.next {
                Some(next) if self.node_offset(marks, next)? == pos => cur = next,
                _ => return Ok(false),
            }
        }
    }

    pub fn is_mark(&mut self, marks: &MarkVector, pos: usize) -> Result<bool> {
        Ok(self.compare_mark(marks, pos)? == Some(Ordering::Equal))
    }

    /// Removes the mark at `pos` if there is one, otherwise adds one.
    ///
    /// Returns `true` when a mark was added.
    pub fn toggle_mark(&mut self, marks: &mut MarkVector, pos: usize) -> Result<bool> {
        if self.is_mark(marks, pos)? {
            self.remove_mark(marks, pos)?;
            Ok(false)
        } else {
            self.add_mark(marks, pos)?;
            Ok(true)
        }
    }

    /// Whether the last mark at `pos` (in chain order) activates a range.
    /// `None` when no mark sits at `pos`.
    pub(crate) fn last_activation_at(&mut self, marks: &MarkVector, pos: usize) -> Result<Option<bool>> {
        if self.compare_mark(marks, pos)? != Some(Ordering::Equal) {
            return Ok(None);
        }
        let Some(mut cur) = self.cursor else {
            return Ok(None);
        };
        while let Some(next) = self.node(cur)?.next {
            if self.node_offset(marks, next)? != pos {
                break;
            }
            cur = next;
        }
        Ok(Some(self.node(cur)?.activate))
    }

    /// Iterates the chain from head to tail.
    pub fn iter(&self) -> impl Iterator<Item = ChainEntry> + '_ {
        std::iter::successors(self.head, move |i| {
            self.nodes.get(*i).and_then(Option::as_ref).and_then(|n| n.next)
        })
        .filter_map(move |i| self.nodes.get(i).and_then(Option::as_ref))
        .map(|node| ChainEntry {
            mark: node.mark,
            activate: node.activate,
        })
    }

    /// Offsets of all chain marks from head to tail.
    pub fn offsets(&self, marks: &MarkVector) -> Result<Vec<usize>> {
        self.iter()
            .map(|entry| {
                marks.offset(entry.mark).map_err(|_| {
                    DocumentError::InternalInconsistency(format!(
                        "chain links disposed {}",
                        entry.mark
                    ))
                })
            })
            .collect()
    }

    /// Disposes every mark of the chain and empties it.
    pub fn clear(&mut self, marks: &mut MarkVector) -> Result<()> {
        let entries: Vec<ChainEntry> = self.iter().collect();
        self.nodes.clear();
        self.free.clear();
        self.head = None;
        self.cursor = None;
        self.len = 0;
        for entry in entries {
            marks.dispose(entry.mark)?;
        }
        Ok(())
    }
}

impl Default for MarkChain {
    fn default() -> Self {
        Self::new(Bias::Forward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_chain_compares_none() {
        let marks = MarkVector::new();
        let mut chain = MarkChain::default();
        assert_eq!(chain.compare_mark(&marks, 5).unwrap(), None);
        assert!(!chain.is_mark(&marks, 5).unwrap());
    }

    #[test]
    fn add_keeps_chain_sorted() {
        let mut marks = MarkVector::new();
        let mut chain = MarkChain::default();
        for pos in [10, 2, 7, 0, 15, 8] {
            assert!(chain.add_mark(&mut marks, pos).unwrap().0);
        }
        assert_eq!(chain.offsets(&marks).unwrap(), vec![0, 2, 7, 8, 10, 15]);
        assert_eq!(chain.len(), 6);
    }

    #[test]
    fn add_existing_returns_existing_mark() {
        let mut marks = MarkVector::new();
        let mut chain = MarkChain::default();
        let (created, first) = chain.add_mark(&mut marks, 4).unwrap();
        assert!(created);
        chain.add_mark(&mut marks, 9).unwrap();
        let (created, again) = chain.add_mark(&mut marks, 4).unwrap();
        assert!(!created);
        assert_eq!(first, again);
        assert_eq!(marks.live_mark_count(), 2);
    }

    #[test]
    fn compare_leaves_cursor_on_neighbour() {
        let mut marks = MarkVector::new();
        let mut chain = MarkChain::default();
        for pos in [2, 6, 10] {
            chain.add_mark(&mut marks, pos).unwrap();
        }
        assert_eq!(chain.compare_mark(&marks, 7).unwrap(), Some(Ordering::Greater));
        let cur = chain.current().unwrap();
        assert_eq!(marks.offset(cur.mark).unwrap(), 10);

        assert_eq!(chain.compare_mark(&marks, 3).unwrap(), Some(Ordering::Less));
        let cur = chain.current().unwrap();
        assert_eq!(marks.offset(cur.mark).unwrap(), 2);

        assert_eq!(chain.compare_mark(&marks, 1).unwrap(), Some(Ordering::Greater));
        assert_eq!(chain.compare_mark(&marks, 20).unwrap(), Some(Ordering::Less));
        assert_eq!(chain.compare_mark(&marks, 6).unwrap(), Some(Ordering::Equal));
    }

    #[test]
    fn remove_missing_is_noop() {
        let mut marks = MarkVector::new();
        let mut chain = MarkChain::default();
        chain.add_mark(&mut marks, 3).unwrap();
        assert!(!chain.remove_mark(&mut marks, 4).unwrap());
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn remove_head_and_tail() {
        let mut marks = MarkVector::new();
        let mut chain = MarkChain::default();
        for pos in [1, 5, 9] {
            chain.add_mark(&mut marks, pos).unwrap();
        }
        assert!(chain.remove_mark(&mut marks, 1).unwrap());
        assert!(chain.remove_mark(&mut marks, 9).unwrap());
        assert_eq!(chain.offsets(&marks).unwrap(), vec![5]);
        assert_eq!(marks.live_mark_count(), 1);
    }

    #[test]
    fn toggle_twice_restores_absence() {
        let mut marks = MarkVector::new();
        let mut chain = MarkChain::default();
        assert!(chain.toggle_mark(&mut marks, 5).unwrap());
        assert!(!chain.toggle_mark(&mut marks, 5).unwrap());
        assert!(!chain.is_mark(&marks, 5).unwrap());
        assert!(chain.is_empty());
    }

    #[test]
    fn chain_follows_edits() {
        let mut marks = MarkVector::new();
        let mut chain = MarkChain::default();
        for pos in [2, 4, 8] {
            chain.add_mark(&mut marks, pos).unwrap();
        }
        marks.notify_insert(3, 10).unwrap();
        assert!(chain.is_mark(&marks, 14).unwrap());
        assert!(!chain.is_mark(&marks, 4).unwrap());
        marks.notify_remove(0, 3).unwrap();
        assert_eq!(chain.offsets(&marks).unwrap(), vec![0, 11, 15]);
    }

    #[test]
    fn disposed_chain_mark_is_inconsistency() {
        let mut marks = MarkVector::new();
        let mut chain = MarkChain::default();
        let (_, mark) = chain.add_mark(&mut marks, 3).unwrap();
        marks.dispose(mark).unwrap();
        assert!(matches!(
            chain.compare_mark(&marks, 3),
            Err(DocumentError::InternalInconsistency(_))
        ));
    }

    #[test]
    fn remove_mark_id_picks_exact_node() {
        let mut marks = MarkVector::new();
        let mut chain = MarkChain::default();
        chain.add_mark(&mut marks, 2).unwrap();
        let (_, target) = chain.add_mark_with(&mut marks, 6, Bias::Backward, false).unwrap();
        chain.add_mark(&mut marks, 9).unwrap();
        // Collapse 6 and 9 onto 5.
        marks.notify_remove(5, 4).unwrap();
        assert!(chain.remove_mark_id(&mut marks, target).unwrap());
        assert_eq!(chain.offsets(&marks).unwrap(), vec![2, 5]);
        assert!(chain.iter().all(|e| e.activate));
    }

    #[test]
    fn differing_bias_at_one_offset_adds_a_node() {
        let mut marks = MarkVector::new();
        let mut chain = MarkChain::default();
        let (_, start) = chain.add_mark_with(&mut marks, 4, Bias::Forward, true).unwrap();
        let (created, end) = chain.add_mark_with(&mut marks, 4, Bias::Backward, false).unwrap();
        assert!(created);
        assert_ne!(start, end);
        // Stationary nodes come first within an offset.
        let order: Vec<MarkId> = chain.iter().map(|e| e.mark).collect();
        assert_eq!(order, vec![end, start]);

        let (created, again) = chain.add_mark_with(&mut marks, 4, Bias::Forward, true).unwrap();
        assert!(!created);
        assert_eq!(again, start);
        let (created, _) = chain.add_mark_with(&mut marks, 4, Bias::Forward, false).unwrap();
        assert!(created);
        assert_eq!(chain.len(), 3);

        marks.notify_insert(4, 2).unwrap();
        assert_eq!(chain.offsets(&marks).unwrap(), vec![4, 6, 6]);
    }

    #[test]
    fn collapsed_mixed_run_is_reordered() {
        let mut marks = MarkVector::new();
        let mut chain = MarkChain::default();
        chain.add_mark_with(&mut marks, 2, Bias::Forward, true).unwrap();
        chain.add_mark_with(&mut marks, 6, Bias::Backward, true).unwrap();

        marks.notify_remove(2, 4).unwrap();
        assert!(chain.normalize(&marks).unwrap());
        assert!(!chain.normalize(&marks).unwrap());
        marks.notify_insert(2, 3).unwrap();
        assert_eq!(chain.offsets(&marks).unwrap(), vec![2, 5]);
        assert!(chain.is_mark(&marks, 5).unwrap());
    }

    #[test]
    fn restored_run_is_reordered() {
        let mut marks = MarkVector::new();
        let mut chain = MarkChain::default();
        let (_, forward) = chain.add_mark_with(&mut marks, 2, Bias::Forward, true).unwrap();
        let (_, backward) = chain.add_mark_with(&mut marks, 6, Bias::Backward, false).unwrap();

        let restores = marks.notify_remove(2, 4).unwrap();
        chain.normalize(&marks).unwrap();
        marks.notify_insert(2, 4).unwrap();
        marks.restore_marks(2, 4, &restores).unwrap();
        assert_eq!(chain.offsets(&marks).unwrap(), vec![6, 2]);

        assert!(chain.normalize(&marks).unwrap());
        assert_eq!(chain.offsets(&marks).unwrap(), vec![2, 6]);
        let entries: Vec<ChainEntry> = chain.iter().collect();
        assert_eq!(
            entries,
            vec![
                ChainEntry { mark: forward, activate: true },
                ChainEntry { mark: backward, activate: false },
            ]
        );
    }

    #[test]
    fn clear_disposes_marks() {
        let mut marks = MarkVector::new();
        let mut chain = MarkChain::default();
        for pos in [1, 2, 3] {
            chain.add_mark(&mut marks, pos).unwrap();
        }
        chain.clear(&mut marks).unwrap();
        assert!(chain.is_empty());
        assert_eq!(marks.live_mark_count(), 0);
    }
}
