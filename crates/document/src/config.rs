// Chunk: docs/chunks/document_config - Tunables for a document instance

use serde::{Deserialize, Serialize};

use lite_edit_buffer::DEFAULT_GAP_SIZE;

use crate::mark_vector::DEFAULT_COMPACTION_MIN;

/// Per-document tunables.
///
/// Missing fields deserialize to their defaults, so a partial table such as
/// `{"undo_limit": 10}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Free slots reserved in the character buffer's gap on creation.
    pub initial_gap_size: usize,
    /// Disposed marks tolerated before the mark vector compacts.
    pub mark_compaction_min: usize,
    /// Undo steps retained; `0` keeps every step.
    pub undo_limit: usize,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            initial_gap_size: DEFAULT_GAP_SIZE,
            mark_compaction_min: DEFAULT_COMPACTION_MIN,
            undo_limit: 100,
        }
    }
}
