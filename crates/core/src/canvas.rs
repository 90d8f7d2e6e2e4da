//! Page canvas: rasterizer adapter with cancel-superseded requests
//!
//! Owns the visible frame for one canvas. Every render request is stamped
//! with a token from the scheduler crate; a completion whose token has
//! been superseded is discarded on arrival, so the canvas always reflects
//! the most recently requested `(page, scale)` pair and never a stale
//! intermediate one. A failed render keeps the previous frame in place
//! instead of blanking the canvas.
//!
//! After a successful render the canvas repaints the overlay from the
//! current annotation store snapshot, so pending marks reappear on top of
//! the fresh raster.

use crate::annotation::AnnotationStore;
use crate::error::EditorError;
use crate::overlay::{build_overlay, paint_overlay};
use pdf_annotator_render::{Frame, PageSource, PdfResult};
use pdf_annotator_scheduler::{RequestToken, RequestTokens};

/// One outstanding render request
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest {
    token: RequestToken,
    page_index: u16,
    scale: f32,
}

impl RenderRequest {
    /// Page this request renders
    pub fn page_index(&self) -> u16 {
        self.page_index
    }

    /// Scale this request renders at
    pub fn scale(&self) -> f32 {
        self.scale
    }
}

/// The canvas for one page view
pub struct PageCanvas<S: PageSource> {
    source: S,
    tokens: RequestTokens,

    /// Last presented frame, overlay included
    frame: Option<Frame>,

    /// Last raster without overlay, kept so annotation edits can repaint
    /// the overlay without re-rasterizing the page
    page_frame: Option<Frame>,

    /// `(page_index, scale)` of the presented frame
    presented: Option<(u16, f32)>,
}

impl<S: PageSource> PageCanvas<S> {
    /// Create a canvas over a page source
    pub fn new(source: S) -> Self {
        Self {
            source,
            tokens: RequestTokens::new(),
            frame: None,
            page_frame: None,
            presented: None,
        }
    }

    /// The page source backing this canvas
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The currently presented frame, if any
    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    /// `(page_index, scale)` of the presented frame, if any
    pub fn presented(&self) -> Option<(u16, f32)> {
        self.presented
    }

    /// Begin a render request, superseding all outstanding ones
    pub fn begin_render(&mut self, page_index: u16, scale: f32) -> RenderRequest {
        RenderRequest {
            token: self.tokens.issue(),
            page_index,
            scale,
        }
    }

    /// Rasterize the page for a request
    ///
    /// Split from [`complete_render`] so an event loop can run the raster
    /// step away from the canvas state and deliver the result later, out
    /// of order if requests raced.
    pub fn render(&self, request: &RenderRequest) -> PdfResult<Frame> {
        self.source.render_page(request.page_index, request.scale)
    }

    /// Deliver a render result to the canvas
    ///
    /// Returns `Ok(true)` when the frame was presented, `Ok(false)` when
    /// the request had been superseded and its result was discarded. A
    /// render failure surfaces as an error while the previously presented
    /// frame stays in place.
    pub fn complete_render(
        &mut self,
        request: RenderRequest,
        result: PdfResult<Frame>,
        store: &AnnotationStore,
    ) -> Result<bool, EditorError> {
        if !self.tokens.is_current(request.token) {
            log::debug!(
                "discarding superseded render of page {} at scale {}",
                request.page_index,
                request.scale
            );
            return Ok(false);
        }

        let frame = match result {
            Ok(frame) => frame,
            Err(error) => {
                log::warn!(
                    "render of page {} failed, keeping previous frame: {}",
                    request.page_index,
                    error
                );
                return Err(EditorError::Render(error));
            }
        };

        self.page_frame = Some(frame);
        self.presented = Some((request.page_index, request.scale));
        self.repaint_overlay(store)?;
        Ok(true)
    }

    /// Render a page and present it in one step
    ///
    /// Convenience for synchronous callers; issues a token so any older
    /// in-flight request is still superseded correctly.
    pub fn request_render(
        &mut self,
        page_index: u16,
        scale: f32,
        store: &AnnotationStore,
    ) -> Result<(), EditorError> {
        let request = self.begin_render(page_index, scale);
        let result = self.render(&request);
        self.complete_render(request, result, store)?;
        Ok(())
    }

    /// Repaint the overlay on the retained raster
    ///
    /// Called after store mutations; the page itself is not re-rendered.
    pub fn repaint_overlay(&mut self, store: &AnnotationStore) -> Result<(), EditorError> {
        let Some((page_index, scale)) = self.presented else {
            return Ok(());
        };
        let Some(page_frame) = self.page_frame.as_ref() else {
            return Ok(());
        };

        let base_height = self
            .source
            .page_size(page_index)
            .map(|size| size.height)
            .map_err(EditorError::Render)?;

        let primitives = build_overlay(store.for_page(page_index), page_index, scale, base_height);
        let mut frame = page_frame.clone();
        paint_overlay(&mut frame, &primitives);
        self.frame = Some(frame);
        Ok(())
    }

    /// Invalidate all outstanding requests
    ///
    /// Used when the document is replaced; pending results for the old
    /// document must never reach the canvas.
    pub fn invalidate_pending(&mut self) {
        self.tokens.supersede_all();
    }
}
