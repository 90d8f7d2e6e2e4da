//! Overlay preview renderer
//!
//! Draws lightweight previews of pending annotations on top of a freshly
//! rasterized page frame. Rectangles and images are drawn with their true
//! color, opacity and bounds; text is drawn as an approximate generic-font
//! run. The preview is explicitly non-authoritative: exact glyph shaping
//! is only guaranteed by the bake engine's output.
//!
//! Overlay rendering never mutates the annotation store and is
//! idempotent: the same inputs produce the same primitives and pixels.

use crate::annotation::{Annotation, ImageFormat};
use crate::coords::{box_top_left_pixel, point_to_pixel, PagePoint};
use pdf_annotator_render::Frame;

/// Fraction of the font size used as the glyph box height above baseline
const TEXT_CAP_HEIGHT: f32 = 0.7;

/// Fraction of the font size one glyph advances the pen
const TEXT_ADVANCE: f32 = 0.6;

/// Fraction of the advance left as a gap between glyph boxes
const TEXT_GAP: f32 = 0.12;

/// One drawable preview element in pixel space
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayPrimitive {
    /// Filled rectangle; alpha carries the annotation opacity
    Rect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        rgba: [u8; 4],
    },

    /// Decoded image pixels blitted into a destination rectangle
    Image {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        pixels: Vec<u8>,
        src_width: u32,
        src_height: u32,
    },

    /// Approximate text run starting at a pixel baseline origin
    Text {
        baseline_x: f32,
        baseline_y: f32,
        size: f32,
        rgba: [u8; 4],
        text: String,
    },
}

/// Build overlay primitives for one page
///
/// Annotations belonging to other pages are skipped; the rest are
/// converted from stored page-space geometry to pixel space through the
/// coordinate transformer, in iteration (i.e. z-) order.
pub fn build_overlay<'a, I>(
    annotations: I,
    page_index: u16,
    scale: f32,
    base_height: f32,
) -> Vec<OverlayPrimitive>
where
    I: IntoIterator<Item = &'a Annotation>,
{
    let mut primitives = Vec::new();

    for annotation in annotations {
        if annotation.page_index() != page_index {
            continue;
        }

        match annotation {
            Annotation::Text {
                x,
                y,
                text,
                font_size,
                color,
                ..
            } => {
                let (px, py) = point_to_pixel(PagePoint::new(*x, *y), scale, base_height);
                primitives.push(OverlayPrimitive::Text {
                    baseline_x: px,
                    baseline_y: py,
                    size: font_size * scale,
                    rgba: color.color().to_rgba(),
                    text: text.clone(),
                });
            }

            Annotation::Image {
                x,
                y,
                width,
                height,
                bytes,
                format,
                ..
            } => {
                let (px, py) = box_top_left_pixel(*x, *y, *height, scale, base_height);
                let dst_width = (width * scale).round().max(1.0) as u32;
                let dst_height = (height * scale).round().max(1.0) as u32;

                match decode_image(bytes, *format) {
                    Ok((pixels, src_width, src_height)) => {
                        primitives.push(OverlayPrimitive::Image {
                            x: px.round() as i32,
                            y: py.round() as i32,
                            width: dst_width,
                            height: dst_height,
                            pixels,
                            src_width,
                            src_height,
                        });
                    }
                    Err(error) => {
                        // Undecodable bytes will fail the bake with a
                        // precise cause; the preview shows a gray slab at
                        // the annotation's bounds in the meantime.
                        log::warn!("overlay image decode failed: {}", error);
                        primitives.push(OverlayPrimitive::Rect {
                            x: px.round() as i32,
                            y: py.round() as i32,
                            width: dst_width,
                            height: dst_height,
                            rgba: [128, 128, 128, 180],
                        });
                    }
                }
            }

            Annotation::Rect {
                x,
                y,
                width,
                height,
                color,
                opacity_percent,
                ..
            } => {
                let (px, py) = box_top_left_pixel(*x, *y, *height, scale, base_height);
                let alpha = (*opacity_percent as u32 * 255 / 100) as u8;
                primitives.push(OverlayPrimitive::Rect {
                    x: px.round() as i32,
                    y: py.round() as i32,
                    width: (width * scale).round().max(1.0) as u32,
                    height: (height * scale).round().max(1.0) as u32,
                    rgba: color.color().with_alpha(alpha).to_rgba(),
                });
            }
        }
    }

    primitives
}

/// Paint overlay primitives onto a rendered page frame
///
/// Primitives are painted in order, so later annotations cover earlier
/// ones exactly as they will in the baked output.
pub fn paint_overlay(frame: &mut Frame, primitives: &[OverlayPrimitive]) {
    for primitive in primitives {
        match primitive {
            OverlayPrimitive::Rect {
                x,
                y,
                width,
                height,
                rgba,
            } => {
                frame.fill_rect(*x, *y, *width, *height, *rgba);
            }

            OverlayPrimitive::Image {
                x,
                y,
                width,
                height,
                pixels,
                src_width,
                src_height,
            } => {
                frame.blit_scaled(pixels, *src_width, *src_height, *x, *y, *width, *height);
            }

            OverlayPrimitive::Text {
                baseline_x,
                baseline_y,
                size,
                rgba,
                text,
            } => {
                paint_text_run(frame, *baseline_x, *baseline_y, *size, *rgba, text);
            }
        }
    }
}

/// Paint an approximate text run as per-glyph advance boxes
///
/// Each visible character becomes a filled box of generic-font
/// proportions sitting on the baseline; whitespace only advances the pen.
/// This deliberately does not match the baked output's glyph metrics.
fn paint_text_run(
    frame: &mut Frame,
    baseline_x: f32,
    baseline_y: f32,
    size: f32,
    rgba: [u8; 4],
    text: &str,
) {
    let advance = size * TEXT_ADVANCE;
    let box_width = advance * (1.0 - TEXT_GAP);
    let box_height = size * TEXT_CAP_HEIGHT;
    let top = baseline_y - box_height;

    let mut pen_x = baseline_x;
    for character in text.chars() {
        if !character.is_whitespace() {
            frame.fill_rect(
                pen_x.round() as i32,
                top.round() as i32,
                box_width.round().max(1.0) as u32,
                box_height.round().max(1.0) as u32,
                rgba,
            );
        }
        pen_x += advance;
    }
}

fn decode_image(bytes: &[u8], format: ImageFormat) -> Result<(Vec<u8>, u32, u32), String> {
    let format = match format {
        ImageFormat::Png => image::ImageFormat::Png,
        ImageFormat::Jpeg => image::ImageFormat::Jpeg,
    };
    let decoded = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| e.to_string())?
        .to_rgba8();
    let (width, height) = decoded.dimensions();
    Ok((decoded.into_raw(), width, height))
}
