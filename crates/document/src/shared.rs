// Chunk: docs/chunks/document_host - Text, marks, lines and history in one place

use std::sync::{Arc, RwLock};

use crate::document::Document;
use crate::error::{DocumentError, Result};

/// A [`Document`] shared between threads.
///
/// Mark offsets are only meaningful against the text they were computed for,
/// so all access goes through a closure holding the lock: readers see a
/// consistent snapshot and writers apply an edit and its mark updates in one
/// critical section.
///
/// A writer that panics mid-edit can leave text and marks out of step, so once
/// the lock is poisoned every later access fails with
/// [`DocumentError::Poisoned`].
#[derive(Debug, Clone, Default)]
pub struct SharedDocument {
    inner: Arc<RwLock<Document>>,
}

impl SharedDocument {
    pub fn new(document: Document) -> Self {
        Self {
            inner: Arc::new(RwLock::new(document)),
        }
    }

    /// Runs `f` with shared access.
    pub fn read<R>(&self, f: impl FnOnce(&Document) -> R) -> Result<R> {
        let guard = self.inner.read().map_err(|_| {
            tracing::error!("read of a poisoned shared document");
            DocumentError::Poisoned
        })?;
        Ok(f(&guard))
    }

    /// Runs `f` with exclusive access.
    pub fn write<R>(&self, f: impl FnOnce(&mut Document) -> R) -> Result<R> {
        let mut guard = self.inner.write().map_err(|_| {
            tracing::error!("write to a poisoned shared document");
            DocumentError::Poisoned
        })?;
        Ok(f(&mut guard))
    }

    /// Whether a writer panicked while holding the lock.
    pub fn is_poisoned(&self) -> bool {
        self.inner.is_poisoned()
    }
}

impl From<Document> for SharedDocument {
    fn from(document: Document) -> Self {
        Self::new(document)
    }
}
