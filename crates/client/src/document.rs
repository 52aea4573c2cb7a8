//! Page title / meta description side effect seam.
//!
//! The store cache derives a document title and meta description from
//! [`bloomery_core::StoreSettings`] and pushes them through a
//! [`DocumentSink`]; the renderer that actually owns `document.title` (or a
//! window title, or nothing) lives outside this crate.

/// Receiver for derived document metadata. Object-safe.
pub trait DocumentSink: Send + Sync {
    fn set_meta(&self, title: &str, description: Option<&str>);
}

/// Ignores all metadata; the default for headless use.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDocumentSink;

impl DocumentSink for NullDocumentSink {
    fn set_meta(&self, _title: &str, _description: Option<&str>) {}
}
