// Chunk: docs/chunks/mark_vector - Position-tracking document core

//! Mark storage with edit-time offset maintenance.
//!
//! Marks are kept in a [`GapArray`] sorted by `(offset, rank)`, where rank puts
//! marks that stay put on an insert at their offset (backward bias, sticky zero)
//! before marks that move. Each mark stores a *raw* offset:
//!
//! ```text
//! storage:  [m0 m1 m2 | gap | m3 m4]
//! raw:       o0 o1 o2          o3+G o4+G      G = offset_gap_len
//! ```
//!
//! Marks below the storage gap store their offset, marks above it store the
//! offset plus the offset gap length. An edit moves the storage gap to the first
//! affected mark and then adjusts the single offset gap length, so every later
//! mark shifts at once. The cost is the distance the gap moves plus the marks
//! that collapse into a removed range, independent of the total mark count.

use lite_edit_buffer::GapArray;

use crate::error::{DocumentError, Result};
use crate::mark::{Bias, MarkFlags, MarkId, MarkRef};

/// Offset gap length after construction or compaction. Any document offset is
/// far below it, which keeps raw offsets of marks above the gap distinguishable.
const INITIAL_OFFSET_GAP: usize = 1 << (usize::BITS - 2);

/// Disposed slots tolerated before a compaction pass is considered.
pub const DEFAULT_COMPACTION_MIN: usize = 32;

#[derive(Debug, Clone)]
struct MarkSlot {
    raw: usize,
    flags: MarkFlags,
    generation: u32,
}

/// Position of a mark before a removal collapsed it, relative to the removal
/// offset. Returned by [`MarkVector::notify_remove`] and consumed by
/// [`MarkVector::restore_marks`] when the removal is undone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkRestore {
    pub mark: MarkId,
    pub delta: usize,
    /// The removal gave this compatible mark its ZERO flag.
    pub zeroed: bool,
}

/// Owner of all marks of one document.
#[derive(Debug, Clone)]
pub struct MarkVector {
    arena: Vec<MarkSlot>,
    free: Vec<usize>,
    storage: GapArray<MarkId>,
    /// Raw offsets below this value belong to marks below the storage gap.
    offset_gap_start: usize,
    offset_gap_len: usize,
    disposed: usize,
    compaction_min: usize,
}

impl MarkVector {
    pub fn new() -> Self {
        Self::with_compaction_min(DEFAULT_COMPACTION_MIN)
    }

    /// Creates a vector that defers compaction until at least `compaction_min`
    /// disposed marks have accumulated.
    pub fn with_compaction_min(compaction_min: usize) -> Self {
        Self {
            arena: Vec::new(),
            free: Vec::new(),
            storage: GapArray::new(),
            offset_gap_start: 0,
            offset_gap_len: INITIAL_OFFSET_GAP,
            disposed: 0,
            compaction_min,
        }
    }

    // ==================== Handles ====================

    fn slot(&self, id: MarkId) -> Result<&MarkSlot> {
        match self.arena.get(id.index()) {
            Some(slot) if slot.generation == id.generation() => Ok(slot),
            _ => Err(DocumentError::InvalidState(format!("stale handle {}", id))),
        }
    }

    fn valid_slot(&self, id: MarkId) -> Result<&MarkSlot> {
        let slot = self.slot(id)?;
        if !slot.flags.contains(MarkFlags::VALID) {
            return Err(DocumentError::InvalidState(format!("{} was disposed", id)));
        }
        Ok(slot)
    }

    fn raw_to_offset(&self, raw: usize) -> usize {
        if raw < self.offset_gap_start {
            raw
        } else {
            raw - self.offset_gap_len
        }
    }

    /// Returns the current offset of a live mark.
    pub fn offset(&self, id: MarkId) -> Result<usize> {
        let slot = self.valid_slot(id)?;
        Ok(self.raw_to_offset(slot.raw))
    }

    pub fn bias(&self, id: MarkId) -> Result<Bias> {
        let slot = self.valid_slot(id)?;
        Ok(if slot.flags.contains(MarkFlags::BACKWARD_BIAS) {
            Bias::Backward
        } else {
            Bias::Forward
        })
    }

    /// Flags of a mark, including disposed ones whose slot was not recycled.
    pub fn flags(&self, id: MarkId) -> Result<MarkFlags> {
        Ok(self.slot(id)?.flags)
    }

    pub fn is_valid(&self, id: MarkId) -> bool {
        self.valid_slot(id).is_ok()
    }

    pub fn mark(&self, id: MarkId) -> MarkRef<'_> {
        MarkRef::new(self, id)
    }

    /// Marks held in storage, including disposed ones awaiting compaction.
    pub fn mark_count(&self) -> usize {
        self.storage.len()
    }

    pub fn live_mark_count(&self) -> usize {
        self.storage.len() - self.disposed
    }

    /// Offsets of the live marks in storage order.
    pub fn offsets(&self) -> Vec<usize> {
        self.storage
            .iter()
            .filter_map(|id| self.offset(*id).ok())
            .collect()
    }

    // ==================== Storage search ====================

    fn id_at(&self, index: usize) -> Option<MarkId> {
        self.storage.get(index).copied()
    }

    fn key_of(&self, id: MarkId) -> (usize, u8) {
        let slot = &self.arena[id.index()];
        (self.raw_to_offset(slot.raw), slot.flags.rank())
    }

    fn key_at(&self, index: usize) -> Option<(usize, u8)> {
        self.id_at(index).map(|id| self.key_of(id))
    }

    /// First storage index whose key is not less than `key`.
    fn lower_bound(&self, key: (usize, u8)) -> usize {
        let (mut low, mut high) = (0, self.storage.len());
        while low < high {
            let mid = (low + high) / 2;
            match self.key_at(mid) {
                Some(k) if k < key => low = mid + 1,
                _ => high = mid,
            }
        }
        low
    }

    /// First storage index whose key is greater than `key`.
    fn upper_bound(&self, key: (usize, u8)) -> usize {
        let (mut low, mut high) = (0, self.storage.len());
        while low < high {
            let mid = (low + high) / 2;
            match self.key_at(mid) {
                Some(k) if k <= key => low = mid + 1,
                _ => high = mid,
            }
        }
        low
    }

    /// Moves the storage gap to `index`, converting the raw offsets of every
    /// mark that crosses it.
    fn move_boundary(&mut self, index: usize) -> Result<()> {
        let gap = self.storage.gap_start();
        if index < gap {
            for i in index..gap {
                if let Some(id) = self.id_at(i) {
                    self.arena[id.index()].raw += self.offset_gap_len;
                }
            }
        } else {
            for i in gap..index {
                if let Some(id) = self.id_at(i) {
                    self.arena[id.index()].raw -= self.offset_gap_len;
                }
            }
        }
        self.storage.move_gap(index)?;

        self.offset_gap_start = match index.checked_sub(1).and_then(|i| self.id_at(i)) {
            Some(id) => self.arena[id.index()].raw + 1,
            None => 0,
        };
        Ok(())
    }

    // ==================== Mark lifecycle ====================

    fn alloc(&mut self, raw: usize, flags: MarkFlags) -> MarkId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.arena[index];
            slot.generation = slot.generation.wrapping_add(1);
            slot.raw = raw;
            slot.flags = flags;
            MarkId::new(index, slot.generation)
        } else {
            self.arena.push(MarkSlot {
                raw,
                flags,
                generation: 0,
            });
            MarkId::new(self.arena.len() - 1, 0)
        }
    }

    fn insert_with_flags(&mut self, offset: usize, flags: MarkFlags) -> Result<MarkId> {
        let index = self.upper_bound((offset, flags.rank()));
        self.move_boundary(index)?;
        let id = self.alloc(offset, flags);
        self.storage.insert(index, [id])?;
        // The new mark is now the last one below the gap.
        self.offset_gap_start = offset + 1;
        Ok(id)
    }

    /// Creates a mark at `offset`. The caller guarantees `offset` lies within
    /// the document.
    ///
    /// Among marks with the same offset and rank the new mark sorts last.
    pub fn insert_mark(&mut self, offset: usize, bias: Bias) -> Result<MarkId> {
        let mut flags = MarkFlags::VALID;
        if bias == Bias::Backward {
            flags |= MarkFlags::BACKWARD_BIAS;
        }
        self.insert_with_flags(offset, flags)
    }

    /// Creates a forward mark with legacy semantics: once at offset 0 it never
    /// moves again, even when text is inserted at 0.
    pub fn insert_compatible_mark(&mut self, offset: usize) -> Result<MarkId> {
        let mut flags = MarkFlags::VALID | MarkFlags::COMPATIBLE;
        if offset == 0 {
            flags |= MarkFlags::ZERO;
        }
        self.insert_with_flags(offset, flags)
    }

    /// Disposes a live mark. Its storage slot is reclaimed lazily.
    pub fn dispose(&mut self, id: MarkId) -> Result<()> {
        self.valid_slot(id)?;
        let slot = &mut self.arena[id.index()];
        slot.flags.remove(MarkFlags::VALID);
        slot.flags.insert(MarkFlags::REMOVED);
        self.disposed += 1;

        if self.disposed > self.compaction_min && self.disposed > self.live_mark_count() {
            self.compact();
        }
        Ok(())
    }

    /// Drops disposed marks from storage and recycles their arena slots.
    fn compact(&mut self) {
        let mut live = Vec::with_capacity(self.live_mark_count());
        for id in self.storage.iter().copied() {
            let slot = &self.arena[id.index()];
            if slot.flags.contains(MarkFlags::VALID) {
                live.push((id, self.raw_to_offset(slot.raw)));
            } else {
                self.free.push(id.index());
            }
        }

        tracing::debug!(
            live = live.len(),
            reclaimed = self.disposed,
            "compacting mark storage"
        );

        for (id, offset) in &live {
            self.arena[id.index()].raw = *offset;
        }
        self.offset_gap_start = live.last().map_or(0, |(_, offset)| offset + 1);
        self.offset_gap_len = INITIAL_OFFSET_GAP;
        self.storage = live.into_iter().map(|(id, _)| id).collect();
        self.disposed = 0;
    }

    // ==================== Edit notifications ====================

    /// Shifts marks for `len` characters inserted at `at`.
    ///
    /// Marks after `at` move by `len`. Marks exactly at `at` move only when they
    /// are forward-biased and not stuck at zero.
    pub fn notify_insert(&mut self, at: usize, len: usize) -> Result<()> {
        if len == 0 {
            return Ok(());
        }
        let index = self.lower_bound((at, 1));
        self.move_boundary(index)?;
        debug_assert!(self.offset_gap_len > len, "offset gap exhausted");
        self.offset_gap_len -= len;

        tracing::trace!(at, len, shifted = self.storage.len() - index, "marks shifted by insert");
        Ok(())
    }

    /// Updates marks for `len` characters removed at `at`.
    ///
    /// Marks inside `(at, at + len]` collapse to `at`, later marks shift back by
    /// `len`. A compatible mark that lands on 0 gains the ZERO flag. The
    /// returned records describe the collapsed marks (plus forward marks that
    /// sat exactly at `at`) so an undo can put them back.
    pub fn notify_remove(&mut self, at: usize, len: usize) -> Result<Vec<MarkRestore>> {
        if len == 0 {
            return Ok(Vec::new());
        }
        let end = at + len;
        let index = self.lower_bound((at, 0));
        self.move_boundary(index)?;

        let old_gap_len = self.offset_gap_len;
        self.offset_gap_len += len;
        let collapsed_raw = at + self.offset_gap_len;

        let mut restores = Vec::new();
        let mut run_end = index;
        while let Some(id) = self.id_at(run_end) {
            let slot = &mut self.arena[id.index()];
            let offset = slot.raw - old_gap_len;
            if offset > end {
                break;
            }
            slot.raw = collapsed_raw;

            if slot.flags.contains(MarkFlags::VALID) {
                let mut zeroed = false;
                if at == 0 && slot.flags.contains(MarkFlags::COMPATIBLE)
                    && !slot.flags.contains(MarkFlags::ZERO)
                {
                    slot.flags.insert(MarkFlags::ZERO);
                    zeroed = true;
                }
                if offset > at || slot.flags.rank() == 1 || zeroed {
                    restores.push(MarkRestore {
                        mark: id,
                        delta: offset - at,
                        zeroed,
                    });
                }
            }
            run_end += 1;
        }

        self.sort_run(index, run_end);
        tracing::trace!(at, len, collapsed = restores.len(), "marks shifted by remove");
        Ok(restores)
    }

    /// Puts marks back where they were before a removal, once the removed text
    /// of length `len` has been reinserted at `at`.
    ///
    /// Records for marks disposed in the meantime are skipped.
    pub fn restore_marks(&mut self, at: usize, len: usize, restores: &[MarkRestore]) -> Result<()> {
        let live: Vec<&MarkRestore> = restores.iter().filter(|r| self.is_valid(r.mark)).collect();
        if live.is_empty() {
            return Ok(());
        }
        for restore in &live {
            let offset = self.offset(restore.mark)?;
            if offset < at || offset > at + len || restore.delta > len {
                tracing::error!(mark = %restore.mark, offset, at, len, "restore outside reinserted range");
                return Err(DocumentError::InternalInconsistency(format!(
                    "{} at {} cannot be restored into {}..{}",
                    restore.mark,
                    offset,
                    at,
                    at + len
                )));
            }
        }

        let index = self.lower_bound((at, 0));
        self.move_boundary(index)?;
        for restore in live {
            let slot = &mut self.arena[restore.mark.index()];
            slot.raw = at + restore.delta + self.offset_gap_len;
            if restore.zeroed {
                slot.flags.remove(MarkFlags::ZERO);
            }
        }

        let mut run_end = index;
        while let Some(id) = self.id_at(run_end) {
            if self.key_of(id).0 > at + len {
                break;
            }
            run_end += 1;
        }
        self.sort_run(index, run_end);
        Ok(())
    }

    /// Stable-sorts storage `[start, end)` by key. All indices lie above the gap.
    fn sort_run(&mut self, start: usize, end: usize) {
        if end - start < 2 {
            return;
        }
        let mut run: Vec<MarkId> = (start..end).filter_map(|i| self.id_at(i)).collect();
        run.sort_by_key(|id| self.key_of(*id));
        for (i, id) in (start..end).zip(run) {
            if let Some(slot) = self.storage.get_mut(i) {
                *slot = id;
            }
        }
    }

    /// Verifies storage order and the raw offset split around the gap.
    pub fn check_integrity(&self) -> Result<()> {
        let gap = self.storage.gap_start();
        let mut previous: Option<(usize, u8)> = None;
        let mut disposed = 0;
        for (i, id) in self.storage.iter().enumerate() {
            let slot = &self.arena[id.index()];
            let below = slot.raw < self.offset_gap_start;
            if below != (i < gap) {
                return Err(DocumentError::InternalInconsistency(format!(
                    "{} at storage index {} is on the wrong side of the offset gap",
                    id, i
                )));
            }
            let key = self.key_of(*id);
            if previous.is_some_and(|p| p > key) {
                return Err(DocumentError::InternalInconsistency(format!(
                    "{} at storage index {} is out of order",
                    id, i
                )));
            }
            previous = Some(key);
            if !slot.flags.contains(MarkFlags::VALID) {
                disposed += 1;
            }
        }
        if disposed != self.disposed {
            return Err(DocumentError::InternalInconsistency(format!(
                "disposed count {} does not match storage ({})",
                self.disposed, disposed
            )));
        }
        Ok(())
    }
}

impl Default for MarkVector {
    fn default() -> Self {
        Self::new()
    }
}
