//! PDF document abstraction layer
//!
//! Provides a high-level interface to PDF documents using PDFium.
//! Documents are loaded from in-memory bytes (file uploads and fetched
//! URLs both arrive as byte buffers); rendering produces RGBA [`Frame`]s.

use crate::frame::Frame;
use pdfium_render::prelude::*;
use std::sync::OnceLock;

/// Errors that can occur during PDF operations
#[derive(Debug, Clone)]
pub enum PdfError {
    /// Failed to initialize PDFium library
    InitializationError(String),

    /// Failed to load PDF document (bytes are not a valid PDF)
    LoadError(String),

    /// Invalid page index
    InvalidPageIndex(u16),

    /// Rendering error
    RenderError(String),
}

impl std::fmt::Display for PdfError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PdfError::InitializationError(msg) => write!(f, "PDFium initialization error: {}", msg),
            PdfError::LoadError(msg) => write!(f, "PDF load error: {}", msg),
            PdfError::InvalidPageIndex(idx) => write!(f, "Invalid page index: {}", idx),
            PdfError::RenderError(msg) => write!(f, "PDF render error: {}", msg),
        }
    }
}

impl std::error::Error for PdfError {}

/// Result type for PDF operations
pub type PdfResult<T> = Result<T, PdfError>;

/// Page dimensions in points (1/72 inch), measured at scale 1.0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

/// Source of rasterized pages
///
/// The seam between the canvas logic and pdfium: the page canvas and the
/// thumbnail generator work against this trait so their supersede/cancel
/// behavior can be exercised with a synthetic source in tests.
pub trait PageSource {
    /// Number of pages in the document
    fn page_count(&self) -> u16;

    /// Base size of a page in points at scale 1.0
    fn page_size(&self, page_index: u16) -> PdfResult<PageSize>;

    /// Render one page at the given scale factor
    ///
    /// The frame is `round(base_size * scale)` pixels on each axis.
    fn render_page(&self, page_index: u16, scale: f32) -> PdfResult<Frame>;
}

/// Process-wide PDFium binding, created on first use
///
/// The library is bound once and shared by every document; an
/// initialization failure is cached and reported on every later call.
static PDFIUM: OnceLock<PdfResult<Pdfium>> = OnceLock::new();

/// PDF document handle
///
/// Wraps a PDFium document loaded from bytes and provides page sizing
/// and rasterization. The original bytes are never mutated; baking opens
/// its own mutable handle. Documents share one process-wide PDFium
/// binding and release their backing memory on drop, so sessions that
/// replace documents repeatedly do not accumulate buffers.
pub struct PdfDocument {
    document: pdfium_render::prelude::PdfDocument<'static>,
}

impl PdfDocument {
    /// Initialize PDFium library (helper function)
    ///
    /// Search order:
    /// 1. Executable's directory (for app bundles)
    /// 2. Current working directory
    /// 3. System library paths
    fn init_pdfium() -> PdfResult<Pdfium> {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()));

        if let Some(ref dir) = exe_dir {
            if let Ok(bindings) =
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
            {
                return Ok(Pdfium::new(bindings));
            }
        }

        Ok(Pdfium::new(
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library())
                .map_err(|e| PdfError::InitializationError(e.to_string()))?,
        ))
    }

    /// The shared PDFium binding
    fn pdfium() -> PdfResult<&'static Pdfium> {
        PDFIUM
            .get_or_init(Self::init_pdfium)
            .as_ref()
            .map_err(|e| e.clone())
    }

    /// Load a PDF document from byte data (owned)
    ///
    /// The document takes ownership of the bytes and frees them on drop.
    /// Fails with `LoadError` when the bytes are not a valid PDF, in which
    /// case no document state is created.
    pub fn from_bytes(data: Vec<u8>) -> PdfResult<Self> {
        let pdfium = Self::pdfium()?;

        let document = pdfium
            .load_pdf_from_byte_vec(data, None)
            .map_err(|e| PdfError::LoadError(e.to_string()))?;

        Ok(Self { document })
    }

    /// Get a page by index (0-based)
    fn get_page(&self, index: u16) -> PdfResult<PdfPage<'_>> {
        self.document
            .pages()
            .get(index)
            .map_err(|_| PdfError::InvalidPageIndex(index))
    }

    /// Base sizes of every page in points, in page order
    ///
    /// Computed once at load time so callers never reopen the document
    /// just to size a canvas.
    pub fn page_sizes(&self) -> PdfResult<Vec<PageSize>> {
        let count = self.page_count();
        let mut sizes = Vec::with_capacity(count as usize);
        for index in 0..count {
            sizes.push(self.page_size(index)?);
        }
        Ok(sizes)
    }
}

impl PageSource for PdfDocument {
    fn page_count(&self) -> u16 {
        self.document.pages().len()
    }

    fn page_size(&self, page_index: u16) -> PdfResult<PageSize> {
        let page = self.get_page(page_index)?;
        Ok(PageSize {
            width: page.width().value,
            height: page.height().value,
        })
    }

    fn render_page(&self, page_index: u16, scale: f32) -> PdfResult<Frame> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(PdfError::RenderError(format!(
                "Invalid render scale: {}",
                scale
            )));
        }

        let page = self.get_page(page_index)?;
        let width = ((page.width().value * scale).round() as u32).max(1);
        let height = ((page.height().value * scale).round() as u32).max(1);

        let config = PdfRenderConfig::new()
            .set_target_width(width as i32)
            .set_target_height(height as i32);

        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| PdfError::RenderError(e.to_string()))?;

        Frame::from_rgba(width, height, bitmap.as_rgba_bytes().to_vec()).ok_or_else(|| {
            PdfError::RenderError(format!(
                "Bitmap size mismatch for page {} at scale {}",
                page_index, scale
            ))
        })
    }
}
