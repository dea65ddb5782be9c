// Chunk: docs/chunks/mark_vector - Position-tracking document core
// Chunk: docs/chunks/document_host - Text, marks, lines and history in one place

//! lite-edit-document: positions that survive edits.
//!
//! A *mark* is a position in a document that follows the text around it as
//! the document is edited. This crate keeps marks, the structures built from
//! them and the document that drives them:
//!
//! - [`MarkVector`] owns every mark of a document and updates all of them on
//!   each insert or remove.
//! - [`MarkChain`] links marks of one kind (block boundaries) in order, with a
//!   cursor for fast sequential lookups.
//! - [`GuardedBlocks`] marks read-only ranges on top of a chain.
//! - The element tree ([`Element`], [`LineElement`], [`LeafElement`],
//!   [`BranchElement`]) describes document structure with marks instead of
//!   offsets; [`BranchElement::replace`] returns an [`ElementEdit`] that can be
//!   undone.
//! - [`Document`] ties text, marks, lines and undo history together.
//!
//! # Example
//!
//! ```
//! use lite_edit_document::{Bias, Document};
//!
//! let mut doc = Document::from_str("ABCDEFGHIJ");
//! let stay = doc.create_mark(3, Bias::Backward).unwrap();
//! let follow = doc.create_mark(3, Bias::Forward).unwrap();
//!
//! doc.insert_string(3, "XYZ").unwrap();
//! assert_eq!(doc.mark_offset(stay).unwrap(), 3);
//! assert_eq!(doc.mark_offset(follow).unwrap(), 6);
//!
//! doc.undo().unwrap();
//! assert_eq!(doc.text(), "ABCDEFGHIJ");
//! ```

mod config;
mod document;
pub mod element;
mod error;
mod guarded;
mod mark;
mod mark_chain;
mod mark_vector;
mod shared;

pub use config::DocumentConfig;
pub use document::Document;
pub use element::{BranchElement, Element, ElementEdit, LeafElement, LineElement};
pub use error::{DocumentError, Result};
pub use guarded::GuardedBlocks;
pub use mark::{Bias, MarkFlags, MarkId, MarkRef};
pub use mark_chain::{ChainEntry, MarkChain};
pub use mark_vector::{MarkRestore, MarkVector, DEFAULT_COMPACTION_MIN};
pub use shared::SharedDocument;
