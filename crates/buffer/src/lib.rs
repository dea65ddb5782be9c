// Chunk: docs/chunks/text_buffer - Text buffer data structure with gap buffer backing
// Chunk: docs/chunks/gap_array - Generic gap array for ordered object storage

//! lite-edit-buffer: gap-backed storage for the lite-edit document model.
//!
//! This crate provides the two containers the document core is built on:
//!
//! - [`GapArray`], an ordered container of arbitrary items with a relocatable
//!   gap. Mark storage and element children use it.
//! - [`GapBuffer`], the character buffer holding document text.
//!
//! Both move their gap to the edit point before inserting or removing, so a run
//! of nearby edits costs O(1) each while a scattered edit pays one gap move.
//!
//! # Example
//!
//! ```
//! use lite_edit_buffer::{GapArray, GapBuffer};
//!
//! let mut text = GapBuffer::from_str("Hello world");
//! text.insert_str(5, ",").unwrap();
//! assert_eq!(text.to_string(), "Hello, world");
//!
//! let mut items: GapArray<u32> = (0..4).collect();
//! items.replace(1, 2, [10, 20, 30]).unwrap();
//! assert_eq!(items.to_vec(), vec![0, 10, 20, 30, 3]);
//! ```

mod error;
mod gap_array;
mod gap_buffer;

pub use error::BufferError;
pub use gap_array::GapArray;
pub use gap_buffer::{GapBuffer, DEFAULT_GAP_SIZE};
