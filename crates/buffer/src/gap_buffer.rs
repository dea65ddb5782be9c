// Chunk: docs/chunks/text_buffer - Text buffer data structure with gap buffer backing

//! Gap buffer implementation for document character storage.
//!
//! A gap buffer is a character array with a movable gap at the edit position.
//! Insertions and deletions at the gap are O(1); moving the gap is O(gap_distance)
//! but amortizes well for typical editing patterns (locality of edits).
//!
//! Offsets are character offsets. Marks tracking positions in this buffer are
//! maintained separately; the buffer only stores text.

use crate::error::BufferError;

pub const DEFAULT_GAP_SIZE: usize = 64;
const GAP_GROWTH_FACTOR: usize = 2;

/// A gap buffer for efficient text storage and manipulation.
#[derive(Debug, Clone)]
pub struct GapBuffer {
    /// The underlying storage. Contains [pre-gap content | gap | post-gap content].
    data: Vec<char>,
    /// Index where the gap starts (first unused position).
    gap_start: usize,
    /// Index where the gap ends (first used position after gap).
    gap_end: usize,
    /// Minimum gap size used when growing.
    min_gap: usize,
}

impl GapBuffer {
    /// Creates a new empty gap buffer.
    pub fn new() -> Self {
        Self::with_gap_size(DEFAULT_GAP_SIZE)
    }

    /// Creates an empty buffer with the given initial gap size.
    pub fn with_gap_size(gap_size: usize) -> Self {
        let gap_size = gap_size.max(1);
        Self {
            data: vec!['\0'; gap_size],
            gap_start: 0,
            gap_end: gap_size,
            min_gap: gap_size,
        }
    }

    /// Creates a gap buffer initialized with the given text.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &str) -> Self {
        Self::from_str_with_gap_size(text, DEFAULT_GAP_SIZE)
    }

    /// Creates a buffer holding `text` whose gap grows by at least `gap_size`.
    pub fn from_str_with_gap_size(text: &str, gap_size: usize) -> Self {
        let mut buffer = Self::with_gap_size(gap_size);
        buffer.ensure_gap(text.chars().count());
        for ch in text.chars() {
            buffer.data[buffer.gap_start] = ch;
            buffer.gap_start += 1;
        }
        buffer
    }

    /// Returns the logical length of the buffer (excluding the gap).
    pub fn len(&self) -> usize {
        self.data.len() - self.gap_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn gap_len(&self) -> usize {
        self.gap_end - self.gap_start
    }

    /// Logical offset where the gap currently sits.
    ///
    /// Characters below this offset are stored contiguously at the front of the
    /// storage, characters at or above it contiguously after the gap.
    pub fn gap_start(&self) -> usize {
        self.gap_start
    }

    /// Moves the gap to the specified logical position.
    fn move_gap_to(&mut self, pos: usize) {
        if pos < self.gap_start {
            let shift = self.gap_start - pos;
            self.data.copy_within(pos..self.gap_start, self.gap_end - shift);
            self.gap_start = pos;
            self.gap_end -= shift;
        } else if pos > self.gap_start {
            let shift = pos - self.gap_start;
            self.data
                .copy_within(self.gap_end..self.gap_end + shift, self.gap_start);
            self.gap_start += shift;
            self.gap_end += shift;
        }
    }

    /// Grows the gap in place to hold at least `min_size` characters.
    ///
    /// The gap position is preserved; `insert_str` relies on the gap staying
    /// where `move_gap_to` left it.
    fn ensure_gap(&mut self, min_size: usize) {
        if self.gap_len() >= min_size {
            return;
        }

        let needed = min_size - self.gap_len();
        let growth = needed
            .max(self.data.len() * GAP_GROWTH_FACTOR)
            .max(self.min_gap);

        let old_gap_end = self.gap_end;
        let old_len = self.data.len();
        let post_gap_len = old_len - old_gap_end;
        let new_size = old_len + growth;
        self.data.resize(new_size, '\0');

        if post_gap_len > 0 {
            let new_post_gap_start = new_size - post_gap_len;
            self.data.copy_within(old_gap_end..old_len, new_post_gap_start);
        }
        self.gap_end = new_size - post_gap_len;

        tracing::trace!(old_len, new_size, "character gap grown");
    }

    fn check_offset(&self, offset: usize) -> Result<(), BufferError> {
        let len = self.len();
        if offset > len {
            return Err(BufferError::IndexOutOfRange { index: offset, len });
        }
        Ok(())
    }

    fn check_range(&self, start: usize, end: usize) -> Result<(), BufferError> {
        let len = self.len();
        if start > end || end > len {
            return Err(BufferError::RangeOutOfBounds { start, end, len });
        }
        Ok(())
    }

    /// Inserts `text` at `offset`, returning the number of characters inserted.
    pub fn insert_str(&mut self, offset: usize, text: &str) -> Result<usize, BufferError> {
        self.check_offset(offset)?;
        let count = text.chars().count();
        if count == 0 {
            return Ok(0);
        }
        self.move_gap_to(offset);
        self.ensure_gap(count);
        for ch in text.chars() {
            self.data[self.gap_start] = ch;
            self.gap_start += 1;
        }
        Ok(count)
    }

    /// Removes `len` characters starting at `offset` and returns them.
    pub fn remove(&mut self, offset: usize, len: usize) -> Result<String, BufferError> {
        let end = offset.saturating_add(len);
        self.check_range(offset, end)?;
        self.move_gap_to(offset);
        let removed: String = self.data[self.gap_end..self.gap_end + len].iter().collect();
        self.gap_end += len;
        Ok(removed)
    }

    /// Returns the character at the given logical position.
    pub fn char_at(&self, pos: usize) -> Option<char> {
        if pos >= self.len() {
            return None;
        }
        let physical = if pos < self.gap_start {
            pos
        } else {
            pos + self.gap_len()
        };
        Some(self.data[physical])
    }

    /// Returns an iterator over all characters in the buffer.
    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.data[..self.gap_start]
            .iter()
            .chain(self.data[self.gap_end..].iter())
            .copied()
    }

    /// Appends the characters in `start..end` to `dst`.
    ///
    /// When the gap lies inside the requested range the copy is split into the
    /// run below the gap and the run above it.
    pub fn copy_chars(&self, start: usize, end: usize, dst: &mut String) -> Result<(), BufferError> {
        self.check_range(start, end)?;
        if start == end {
            return Ok(());
        }

        if end <= self.gap_start {
            dst.extend(&self.data[start..end]);
        } else if start >= self.gap_start {
            let gap_len = self.gap_len();
            dst.extend(&self.data[start + gap_len..end + gap_len]);
        } else {
            dst.extend(&self.data[start..self.gap_start]);
            dst.extend(&self.data[self.gap_end..self.gap_end + (end - self.gap_start)]);
        }
        Ok(())
    }

    /// Returns the content of a range as a String.
    pub fn slice(&self, start: usize, end: usize) -> Result<String, BufferError> {
        self.check_range(start, end)?;
        let mut result = String::with_capacity(end - start);
        self.copy_chars(start, end, &mut result)?;
        Ok(result)
    }
}

impl Default for GapBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for GapBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for ch in self.chars() {
            write!(f, "{}", ch)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_empty() {
        let buf = GapBuffer::new();
        assert!(buf.is_empty());
        assert_eq!(buf.len(), 0);
    }

    #[test]
    fn test_from_str() {
        let buf = GapBuffer::from_str("hello");
        assert_eq!(buf.len(), 5);
        assert_eq!(buf.to_string(), "hello");
        assert_eq!(buf.gap_start(), 5);
    }

    #[test]
    fn test_from_str_with_gap_size() {
        let mut buf = GapBuffer::from_str_with_gap_size("abc", 2);
        assert_eq!(buf.to_string(), "abc");
        assert_eq!(buf.insert_str(3, "defgh"), Ok(5));
        assert_eq!(buf.to_string(), "abcdefgh");
    }

    #[test]
    fn test_insert_at_middle() {
        let mut buf = GapBuffer::from_str("ac");
        assert_eq!(buf.insert_str(1, "b"), Ok(1));
        assert_eq!(buf.to_string(), "abc");
        assert_eq!(buf.gap_start(), 2);
    }

    #[test]
    fn test_insert_past_end_is_error() {
        let mut buf = GapBuffer::from_str("abc");
        assert_eq!(
            buf.insert_str(4, "x"),
            Err(BufferError::IndexOutOfRange { index: 4, len: 3 })
        );
        assert_eq!(buf.to_string(), "abc");
    }

    #[test]
    fn test_remove_returns_text() {
        let mut buf = GapBuffer::from_str("abcdef");
        assert_eq!(buf.remove(1, 3).unwrap(), "bcd");
        assert_eq!(buf.to_string(), "aef");
        assert_eq!(buf.gap_start(), 1);
    }

    #[test]
    fn test_remove_overrun_is_error() {
        let mut buf = GapBuffer::from_str("abc");
        assert!(buf.remove(2, 2).is_err());
        assert_eq!(buf.to_string(), "abc");
    }

    #[test]
    fn test_char_at_with_gap_in_middle() {
        let mut buf = GapBuffer::from_str("hllo");
        buf.insert_str(1, "e").unwrap();
        assert_eq!(buf.char_at(0), Some('h'));
        assert_eq!(buf.char_at(1), Some('e'));
        assert_eq!(buf.char_at(2), Some('l'));
        assert_eq!(buf.char_at(4), Some('o'));
        assert_eq!(buf.char_at(5), None);
    }

    #[test]
    fn test_copy_chars_split_at_gap() {
        let mut buf = GapBuffer::from_str("hello world");
        buf.insert_str(5, ",").unwrap();
        assert_eq!(buf.gap_start(), 6);

        let mut out = String::new();
        buf.copy_chars(3, 9, &mut out).unwrap();
        assert_eq!(out, "lo, wo");

        // Entirely below and entirely above the gap.
        assert_eq!(buf.slice(0, 5).unwrap(), "hello");
        assert_eq!(buf.slice(7, 12).unwrap(), "world");
    }

    #[test]
    fn test_slice_invalid_range() {
        let buf = GapBuffer::from_str("abc");
        assert!(buf.slice(2, 1).is_err());
        assert!(buf.slice(0, 4).is_err());
        assert_eq!(buf.slice(3, 3).unwrap(), "");
    }

    #[test]
    fn test_large_insert() {
        let mut buf = GapBuffer::with_gap_size(4);
        for i in 0..1000 {
            let ch = char::from_u32('a' as u32 + (i % 26) as u32).unwrap();
            let len = buf.len();
            buf.insert_str(len, &ch.to_string()).unwrap();
        }
        assert_eq!(buf.len(), 1000);
        assert_eq!(buf.char_at(27), Some('b'));
    }
}
