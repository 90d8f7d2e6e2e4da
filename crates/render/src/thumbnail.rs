//! Low-resolution page thumbnail generation
//!
//! Thumbnails are rendered once per document load at a fixed low scale,
//! scheduled after the first full-size page render so they never block
//! initial interactivity. They show page content only; annotation
//! overlays are never included and thumbnails are not regenerated as
//! annotations change.

use crate::frame::Frame;
use crate::pdf::{PageSource, PdfDocument, PdfResult};
use pdf_annotator_scheduler::CancellationToken;
use std::sync::{Arc, Mutex};

/// Fixed render scale for thumbnails (fraction of base page size)
pub const THUMBNAIL_SCALE: f32 = 0.2;

/// One rendered page thumbnail
#[derive(Debug, Clone)]
pub struct Thumbnail {
    /// Page index this thumbnail belongs to (0-based)
    pub page_index: u16,

    /// The rendered frame at thumbnail scale
    pub frame: Frame,
}

/// Thumbnail generator
///
/// Renders every page of a document at the fixed thumbnail scale.
pub struct ThumbnailGenerator {
    scale: f32,
}

impl ThumbnailGenerator {
    /// Create a generator at the default thumbnail scale
    pub fn new() -> Self {
        Self {
            scale: THUMBNAIL_SCALE,
        }
    }

    /// Create a generator at a custom scale
    pub fn with_scale(scale: f32) -> Self {
        Self { scale }
    }

    /// The render scale this generator uses
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Render a thumbnail for every page, in page order
    pub fn generate<S: PageSource>(&self, source: &S) -> PdfResult<Vec<Thumbnail>> {
        self.generate_with_cancel(source, &CancellationToken::new())
    }

    /// Render thumbnails, checking the token between pages
    ///
    /// Cancellation returns the prefix rendered so far; the caller decides
    /// whether a partial strip is still useful (it is not after the
    /// document has been replaced, so the session discards it).
    pub fn generate_with_cancel<S: PageSource>(
        &self,
        source: &S,
        token: &CancellationToken,
    ) -> PdfResult<Vec<Thumbnail>> {
        let count = source.page_count();
        let mut thumbnails = Vec::with_capacity(count as usize);

        for page_index in 0..count {
            if token.is_cancelled() {
                log::debug!(
                    "thumbnail generation cancelled after {} of {} pages",
                    thumbnails.len(),
                    count
                );
                break;
            }
            let frame = source.render_page(page_index, self.scale)?;
            thumbnails.push(Thumbnail { page_index, frame });
        }

        Ok(thumbnails)
    }
}

impl Default for ThumbnailGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Background-thread thumbnail generation
///
/// Loads its own document from the bytes inside the worker thread, so
/// the UI-side document handle is never shared across threads.
pub struct AsyncThumbnailGenerator {
    generator: Arc<ThumbnailGenerator>,
}

impl AsyncThumbnailGenerator {
    /// Create a new async generator wrapping the given sync generator
    pub fn new(generator: ThumbnailGenerator) -> Self {
        Self {
            generator: Arc::new(generator),
        }
    }

    /// Generate thumbnails for a document on a background thread
    ///
    /// `bytes` is a copy of the document bytes; the worker loads its own
    /// document handle from them. The returned handle exposes the result
    /// and a cancellation token checked between pages.
    pub fn generate_async(&self, bytes: Vec<u8>) -> ThumbnailHandle {
        let generator = Arc::clone(&self.generator);
        let token = CancellationToken::new();
        let worker_token = token.clone();
        let result = Arc::new(Mutex::new(None));
        let result_slot = Arc::clone(&result);

        let thread = std::thread::spawn(move || {
            let outcome = PdfDocument::from_bytes(bytes)
                .and_then(|doc| generator.generate_with_cancel(&doc, &worker_token));
            *result_slot.lock().unwrap() = Some(outcome);
        });

        ThumbnailHandle {
            thread: Some(thread),
            result,
            token,
        }
    }
}

impl Default for AsyncThumbnailGenerator {
    fn default() -> Self {
        Self::new(ThumbnailGenerator::new())
    }
}

/// Handle to an in-flight thumbnail generation
pub struct ThumbnailHandle {
    thread: Option<std::thread::JoinHandle<()>>,
    result: Arc<Mutex<Option<PdfResult<Vec<Thumbnail>>>>>,
    token: CancellationToken,
}

impl ThumbnailHandle {
    /// Check if generation has finished
    pub fn is_complete(&self) -> bool {
        self.result.lock().unwrap().is_some()
    }

    /// Try to take the result without blocking
    ///
    /// Returns `Some(result)` once complete, `None` while still rendering.
    pub fn try_take(&mut self) -> Option<PdfResult<Vec<Thumbnail>>> {
        self.result.lock().unwrap().take()
    }

    /// Request cancellation; the worker stops at the next page boundary
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Block until generation finishes and return the result
    pub fn wait(mut self) -> PdfResult<Vec<Thumbnail>> {
        if let Some(thread) = self.thread.take() {
            thread.join().expect("Thumbnail thread panicked");
        }
        self.result
            .lock()
            .unwrap()
            .take()
            .expect("No thumbnail result available")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::{PageSize, PdfError};

    /// Synthetic page source: solid-color pages, no pdfium required
    struct FakeSource {
        pages: Vec<PageSize>,
    }

    impl PageSource for FakeSource {
        fn page_count(&self) -> u16 {
            self.pages.len() as u16
        }

        fn page_size(&self, page_index: u16) -> PdfResult<PageSize> {
            self.pages
                .get(page_index as usize)
                .copied()
                .ok_or(PdfError::InvalidPageIndex(page_index))
        }

        fn render_page(&self, page_index: u16, scale: f32) -> PdfResult<Frame> {
            let size = self.page_size(page_index)?;
            let width = ((size.width * scale).round() as u32).max(1);
            let height = ((size.height * scale).round() as u32).max(1);
            Ok(Frame::new(width, height))
        }
    }

    fn letter_pages(count: usize) -> FakeSource {
        FakeSource {
            pages: vec![
                PageSize {
                    width: 612.0,
                    height: 792.0
                };
                count
            ],
        }
    }

    #[test]
    fn test_generates_one_thumbnail_per_page() {
        let source = letter_pages(3);
        let thumbnails = ThumbnailGenerator::new().generate(&source).unwrap();

        assert_eq!(thumbnails.len(), 3);
        for (index, thumbnail) in thumbnails.iter().enumerate() {
            assert_eq!(thumbnail.page_index, index as u16);
        }
    }

    #[test]
    fn test_thumbnail_uses_fixed_scale() {
        let source = letter_pages(1);
        let thumbnails = ThumbnailGenerator::new().generate(&source).unwrap();

        // 612 x 0.2 = 122.4 -> 122, 792 x 0.2 = 158.4 -> 158
        assert_eq!(thumbnails[0].frame.width(), 122);
        assert_eq!(thumbnails[0].frame.height(), 158);
    }

    #[test]
    fn test_cancelled_before_start_yields_empty() {
        let source = letter_pages(5);
        let token = CancellationToken::new();
        token.cancel();

        let thumbnails = ThumbnailGenerator::new()
            .generate_with_cancel(&source, &token)
            .unwrap();
        assert!(thumbnails.is_empty());
    }

    #[test]
    fn test_empty_document_yields_no_thumbnails() {
        let source = letter_pages(0);
        let thumbnails = ThumbnailGenerator::new().generate(&source).unwrap();
        assert!(thumbnails.is_empty());
    }

    #[test]
    fn test_custom_scale() {
        let generator = ThumbnailGenerator::with_scale(0.5);
        assert_eq!(generator.scale(), 0.5);

        let source = letter_pages(1);
        let thumbnails = generator.generate(&source).unwrap();
        assert_eq!(thumbnails[0].frame.width(), 306);
        assert_eq!(thumbnails[0].frame.height(), 396);
    }

    #[test]
    fn test_async_generator_invalid_bytes_reports_load_error() {
        let mut handle =
            AsyncThumbnailGenerator::default().generate_async(b"not a pdf".to_vec());

        // Wait for the worker to finish, then take the result.
        while !handle.is_complete() {
            std::thread::yield_now();
        }
        let result = handle.try_take().unwrap();
        assert!(result.is_err());
    }
}
