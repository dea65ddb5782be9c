//! Shared helpers for the document integration tests.

#![allow(dead_code)]

use lite_edit_document::Document;
use tracing_subscriber::EnvFilter;

/// Routes `tracing` output to the test harness, filtered by `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs the subscriber.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Document text of every line, without newlines.
pub fn line_texts(doc: &Document) -> Vec<String> {
    (0..doc.line_count())
        .map(|line| doc.line_content(line).unwrap())
        .collect()
}
