//! PDF Annotator Render Library
//!
//! Page rasterization pipeline: pdfium-backed document loading, per-page
//! RGBA frame rendering at arbitrary scale, and the low-resolution
//! thumbnail generator.

pub mod frame;
pub mod pdf;
pub mod thumbnail;

pub use frame::Frame;
pub use pdf::{PageSize, PageSource, PdfDocument, PdfError, PdfResult};
pub use thumbnail::{
    AsyncThumbnailGenerator, Thumbnail, ThumbnailGenerator, ThumbnailHandle, THUMBNAIL_SCALE,
};
