// Chunk: docs/chunks/gap_array - Generic gap array for ordered object storage

//! Errors reported by the gap-backed storage types.

/// Failure of a [`GapArray`](crate::GapArray) or [`GapBuffer`](crate::GapBuffer)
/// operation. The storage is left unmodified whenever one of these is returned.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// A single index was outside the valid bounds.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// A range was inverted or extended past the end of the storage.
    #[error("range {start}..{end} out of bounds for length {len}")]
    RangeOutOfBounds { start: usize, end: usize, len: usize },
}
