//! Pixel/point coordinate transformer
//!
//! Pure functions mapping between the two coordinate systems of the
//! editor. Raster/viewport space has its origin at the top-left of the
//! canvas, y increasing downward, and is scaled by the current zoom. PDF
//! page space has its origin at the bottom-left, y increasing upward, in
//! points (1/72 inch), independent of zoom.
//!
//! Every component converts through these functions; the flip sign and
//! the baseline-vs-corner convention are easy to get inconsistently wrong
//! when re-derived at call sites.

/// A position in PDF page space (points, origin bottom-left)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PagePoint {
    pub x: f32,
    pub y: f32,
}

impl PagePoint {
    /// Create a new page point
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Convert a canvas pixel position to PDF page space
///
/// `base_height` is the page height in points at scale 1.0.
pub fn pixel_to_point(px: f32, py: f32, scale: f32, base_height: f32) -> PagePoint {
    PagePoint {
        x: px / scale,
        y: base_height - py / scale,
    }
}

/// Convert a PDF page position to canvas pixel space
///
/// Exact inverse of [`pixel_to_point`].
pub fn point_to_pixel(point: PagePoint, scale: f32, base_height: f32) -> (f32, f32) {
    ((point.x) * scale, (base_height - point.y) * scale)
}

/// Pixel-space top-left corner of a stored box annotation
///
/// Box annotations store their bottom-left corner `(x, y)` in page space;
/// the rendered pixel rectangle starts at the visual top-left, which sits
/// `height` points above the stored origin.
pub fn box_top_left_pixel(
    x: f32,
    y: f32,
    height: f32,
    scale: f32,
    base_height: f32,
) -> (f32, f32) {
    (x * scale, (base_height - y - height) * scale)
}

/// Stored bottom-left origin for a box placed by a canvas click
///
/// The click position is treated as the visual top-left of the new box,
/// so the stored origin sits `height` points below the clicked point.
pub fn box_origin_from_click(
    px: f32,
    py: f32,
    height: f32,
    scale: f32,
    base_height: f32,
) -> PagePoint {
    let clicked = pixel_to_point(px, py, scale, base_height);
    PagePoint {
        x: clicked.x,
        y: clicked.y - height,
    }
}
