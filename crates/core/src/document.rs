//! Loaded document state
//!
//! A [`Document`] is created once from raw PDF bytes and then treated as
//! immutable: a new upload replaces it wholesale, and baking always reads
//! the pristine original bytes. Page sizes are captured at load time so
//! canvases and the coordinate transformer never reopen the PDF just to
//! size a page.

use pdf_annotator_render::{PageSize, PageSource, PdfDocument};
use std::sync::Arc;

/// Document load failure
///
/// The input bytes are not usable; no document state is created and the
/// user is re-prompted.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    #[error("not a valid PDF: {0}")]
    InvalidPdf(String),

    #[error("document has no pages")]
    EmptyDocument,
}

/// An immutable loaded document
#[derive(Debug, Clone)]
pub struct Document {
    bytes: Arc<Vec<u8>>,
    page_count: u16,
    base_page_sizes: Vec<PageSize>,
}

impl Document {
    /// Load a document from raw PDF bytes
    ///
    /// Opens the bytes once to read the page count and per-page base
    /// sizes, then drops the parse handle; rendering and baking open
    /// their own handles from the retained bytes.
    pub fn load(bytes: Vec<u8>) -> Result<Self, LoadError> {
        let bytes = Arc::new(bytes);

        let pdf = PdfDocument::from_bytes(bytes.as_ref().clone())
            .map_err(|e| LoadError::InvalidPdf(e.to_string()))?;

        let page_count = pdf.page_count();
        if page_count == 0 {
            return Err(LoadError::EmptyDocument);
        }

        let base_page_sizes = pdf
            .page_sizes()
            .map_err(|e| LoadError::InvalidPdf(e.to_string()))?;

        log::info!(
            "loaded document: {} pages, {} bytes",
            page_count,
            bytes.len()
        );

        Ok(Self {
            bytes,
            page_count,
            base_page_sizes,
        })
    }

    /// The original PDF bytes, never mutated
    pub fn bytes(&self) -> &Arc<Vec<u8>> {
        &self.bytes
    }

    /// Number of pages
    pub fn page_count(&self) -> u16 {
        self.page_count
    }

    /// Base page sizes in points at scale 1.0, in page order
    pub fn base_page_sizes(&self) -> &[PageSize] {
        &self.base_page_sizes
    }

    /// Base size of one page, `None` when the index is out of range
    pub fn page_size(&self, page_index: u16) -> Option<PageSize> {
        self.base_page_sizes.get(page_index as usize).copied()
    }
}

#[cfg(test)]
impl Document {
    /// Build a document without touching pdfium, for state machine tests
    pub(crate) fn test_fixture(bytes: Vec<u8>, base_page_sizes: Vec<PageSize>) -> Self {
        Self {
            bytes: Arc::new(bytes),
            page_count: base_page_sizes.len() as u16,
            base_page_sizes,
        }
    }
}
