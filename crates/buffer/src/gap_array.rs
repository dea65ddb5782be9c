// Chunk: docs/chunks/gap_array - Generic gap array for ordered object storage

//! Gap array: an ordered container with a movable gap.
//!
//! This is the object counterpart of [`GapBuffer`](crate::GapBuffer). Items are
//! stored as `[items before gap | gap | items after gap]`. Every insert or remove
//! first moves the gap to the edit index, which costs O(distance) and makes runs
//! of nearby edits cheap. Gap slots hold `None`, so `T` needs no placeholder value.

use std::ops::Range;

use crate::error::BufferError;

const INITIAL_GAP_SIZE: usize = 16;

/// An ordered sequence of `T` backed by a vector with a relocatable gap.
#[derive(Debug, Clone)]
pub struct GapArray<T> {
    /// Physical storage: `[0, gap_start)` and `[gap_end, len)` are occupied.
    slots: Vec<Option<T>>,
    /// Physical index of the first gap slot. Equal to the logical index of the
    /// first item after the gap.
    gap_start: usize,
    /// Physical index of the first occupied slot after the gap.
    gap_end: usize,
}

impl<T> GapArray<T> {
    /// Creates an empty array without allocating.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            gap_start: 0,
            gap_end: 0,
        }
    }

    /// Creates an empty array whose gap can hold `capacity` items.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            gap_start: 0,
            gap_end: capacity,
        }
    }

    /// Number of items (gap excluded).
    pub fn len(&self) -> usize {
        self.slots.len() - self.gap_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn gap_len(&self) -> usize {
        self.gap_end - self.gap_start
    }

    /// Logical index at which the gap currently sits.
    ///
    /// Items `[0, gap_start)` are below the gap, the rest above it.
    pub fn gap_start(&self) -> usize {
        self.gap_start
    }

    /// Total slot count including the gap.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn physical(&self, index: usize) -> usize {
        if index < self.gap_start {
            index
        } else {
            index + self.gap_len()
        }
    }

    /// Returns the item at `index`, or `None` past the end.
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len() {
            return None;
        }
        self.slots[self.physical(index)].as_ref()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index >= self.len() {
            return None;
        }
        let physical = self.physical(index);
        self.slots[physical].as_mut()
    }

    /// Moves the gap so that it starts at logical `index`.
    ///
    /// O(|index - gap_start|). Item order is unaffected.
    pub fn move_gap(&mut self, index: usize) -> Result<(), BufferError> {
        let len = self.len();
        if index > len {
            return Err(BufferError::IndexOutOfRange { index, len });
        }
        self.move_gap_to(index);
        Ok(())
    }

    fn move_gap_to(&mut self, index: usize) {
        let gap_len = self.gap_len();
        if index < self.gap_start {
            // Items [index, gap_start) slide up to end right at gap_end.
            for src in (index..self.gap_start).rev() {
                self.slots.swap(src, src + gap_len);
            }
            self.gap_end -= self.gap_start - index;
            self.gap_start = index;
        } else if index > self.gap_start {
            // Items [gap_end, gap_end + shift) slide down to gap_start.
            let shift = index - self.gap_start;
            for k in 0..shift {
                self.slots.swap(self.gap_start + k, self.gap_end + k);
            }
            self.gap_start += shift;
            self.gap_end += shift;
        }
    }

    /// Grows the gap in place to hold at least `min_size` slots.
    fn ensure_gap(&mut self, min_size: usize) {
        if self.gap_len() >= min_size {
            return;
        }

        let needed = min_size - self.gap_len();
        let growth = needed.max(self.slots.len()).max(INITIAL_GAP_SIZE);
        let old_len = self.slots.len();
        let post_gap_len = old_len - self.gap_end;
        let new_len = old_len + growth;

        self.slots.resize_with(new_len, || None);
        let new_gap_end = new_len - post_gap_len;
        for k in (0..post_gap_len).rev() {
            self.slots.swap(self.gap_end + k, new_gap_end + k);
        }
        self.gap_end = new_gap_end;

        tracing::trace!(old_capacity = old_len, new_capacity = new_len, "gap array grown");
    }

    /// Inserts `items` so that the first of them ends up at `index`.
    ///
    /// `index` may equal `len()` (append). Leaves the gap right after the
    /// inserted run, so consecutive inserts at the following index are O(1).
    pub fn insert<I>(&mut self, index: usize, items: I) -> Result<(), BufferError>
    where
        I: IntoIterator<Item = T>,
    {
        let len = self.len();
        if index > len {
            return Err(BufferError::IndexOutOfRange { index, len });
        }
        let items: Vec<T> = items.into_iter().collect();
        if items.is_empty() {
            return Ok(());
        }

        self.move_gap_to(index);
        self.ensure_gap(items.len());
        for item in items {
            self.slots[self.gap_start] = Some(item);
            self.gap_start += 1;
        }
        Ok(())
    }

    /// Appends a single item.
    pub fn push(&mut self, item: T) {
        let len = self.len();
        self.move_gap_to(len);
        self.ensure_gap(1);
        self.slots[self.gap_start] = Some(item);
        self.gap_start += 1;
    }

    fn check_run(&self, index: usize, count: usize) -> Result<(), BufferError> {
        let len = self.len();
        match index.checked_add(count) {
            Some(end) if end <= len => Ok(()),
            _ => Err(BufferError::RangeOutOfBounds {
                start: index,
                end: index.saturating_add(count),
                len,
            }),
        }
    }

    /// Removes `count` items starting at `index` and returns them in order.
    pub fn remove(&mut self, index: usize, count: usize) -> Result<Vec<T>, BufferError> {
        self.check_run(index, count)?;
        self.move_gap_to(index);
        let removed = self.slots[self.gap_end..self.gap_end + count]
            .iter_mut()
            .filter_map(Option::take)
            .collect();
        self.gap_end += count;
        Ok(removed)
    }

    /// Removes `remove_count` items at `index` and inserts `items` in their place.
    ///
    /// Either the whole replacement happens or, on error, nothing does.
    pub fn replace<I>(
        &mut self,
        index: usize,
        remove_count: usize,
        items: I,
    ) -> Result<Vec<T>, BufferError>
    where
        I: IntoIterator<Item = T>,
    {
        self.check_run(index, remove_count)?;
        let removed = self.remove(index, remove_count)?;
        self.insert(index, items)?;
        Ok(removed)
    }

    /// Iterates over the items in logical order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.slots[..self.gap_start]
            .iter()
            .chain(self.slots[self.gap_end..].iter())
            .filter_map(Option::as_ref)
    }

    /// Drops every item and releases the storage.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.gap_start = 0;
        self.gap_end = 0;
    }
}

impl<T: Clone> GapArray<T> {
    /// Clones items `src` into `dst[dst_begin..]`.
    ///
    /// A range that straddles the gap is copied as two contiguous runs, the part
    /// below the gap first and then the part above it.
    pub fn copy_range(
        &self,
        src: Range<usize>,
        dst: &mut [T],
        dst_begin: usize,
    ) -> Result<(), BufferError> {
        let len = self.len();
        if src.start > src.end || src.end > len {
            return Err(BufferError::RangeOutOfBounds {
                start: src.start,
                end: src.end,
                len,
            });
        }
        let count = src.end - src.start;
        if dst_begin.saturating_add(count) > dst.len() {
            return Err(BufferError::RangeOutOfBounds {
                start: dst_begin,
                end: dst_begin.saturating_add(count),
                len: dst.len(),
            });
        }

        let below_end = src.end.min(self.gap_start);
        let mut out = dst_begin;
        if src.start < below_end {
            for slot in &self.slots[src.start..below_end] {
                if let Some(item) = slot {
                    dst[out] = item.clone();
                    out += 1;
                }
            }
        }
        let above_start = src.start.max(self.gap_start);
        if above_start < src.end {
            let gap_len = self.gap_len();
            for slot in &self.slots[above_start + gap_len..src.end + gap_len] {
                if let Some(item) = slot {
                    dst[out] = item.clone();
                    out += 1;
                }
            }
        }
        Ok(())
    }

    /// Clones the items into a plain vector.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

impl<T> Default for GapArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<Vec<T>> for GapArray<T> {
    /// Builds an array holding `items` with the gap at the end.
    fn from(items: Vec<T>) -> Self {
        let len = items.len();
        let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
        slots.resize_with(len + INITIAL_GAP_SIZE, || None);
        Self {
            gap_start: len,
            gap_end: slots.len(),
            slots,
        }
    }
}

impl<T: PartialEq> PartialEq for GapArray<T> {
    /// Arrays are equal when their items are, wherever their gaps sit.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for GapArray<T> {}

impl<T> FromIterator<T> for GapArray<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}
