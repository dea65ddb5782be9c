// Chunk: docs/chunks/mark_vector - Position-tracking document core

//! Error type shared by marks, chains, elements and the document.

use lite_edit_buffer::BufferError;

/// Failure of a document-core operation.
///
/// Mutating operations validate before they change anything, so the structure
/// that returned the error is still in its pre-call state.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// A disposed or stale mark was used, or a mark was disposed twice.
    #[error("invalid mark state: {0}")]
    InvalidState(String),

    /// An offset outside `[0, len]`.
    #[error("offset {offset} out of range for document length {len}")]
    OutOfRange { offset: usize, len: usize },

    /// A broken internal invariant (chain link to a disposed mark, children out
    /// of order, undo delta not matching the tree).
    #[error("internal inconsistency: {0}")]
    InternalInconsistency(String),

    /// The edit would modify text inside a guarded block.
    #[error("offset {offset} is inside a guarded block")]
    Guarded { offset: usize },

    /// A writer panicked while holding a shared document, which may be left
    /// half-edited.
    #[error("shared document poisoned by a panicking writer")]
    Poisoned,

    #[error(transparent)]
    Buffer(#[from] BufferError),
}

pub type Result<T> = std::result::Result<T, DocumentError>;
