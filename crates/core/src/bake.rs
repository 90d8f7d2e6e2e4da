//! Bake engine
//!
//! Turns the ordered annotation list into permanent page content of a new
//! PDF byte stream. Baking never mutates the original bytes: one mutable
//! pdfium handle is opened per bake call, annotations are written in
//! store order (which is the z-order of the final document), and the new
//! bytes come from saving that handle. Re-baking after further edits
//! always starts from the pristine source plus the full current list.
//!
//! Baking is split into a pure planning pass and a pdfium execution pass.
//! The plan resolves colors, decodes image bytes by their tagged format
//! and collects the font families to cache, so every per-annotation
//! failure mode that does not require pdfium is caught before the
//! document is even opened.

use crate::annotation::{Annotation, AnnotationId, Color, ImageFormat};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Font family used for baked text annotations
///
/// The tool panel does not expose a family picker; all text bakes with
/// the standard Helvetica font.
pub const DEFAULT_FONT_FAMILY: &str = "Helvetica";

/// Bake failure
///
/// The whole bake aborts on the first failure; no partially annotated
/// document is ever produced and the caller's annotation store is left
/// untouched, so the offending annotation can be removed and the bake
/// retried.
#[derive(Debug, thiserror::Error)]
#[error("bake aborted: {cause}")]
pub struct BakeError {
    /// The annotation that caused the failure, when one is attributable
    pub annotation_id: Option<AnnotationId>,
    pub cause: BakeCause,
}

/// Specific cause of a bake failure
#[derive(Debug, thiserror::Error)]
pub enum BakeCause {
    #[error("PDFium initialization failed: {0}")]
    Initialization(String),

    #[error("document could not be opened: {0}")]
    OpenDocument(String),

    #[error("page {0} does not exist")]
    MissingPage(u16),

    #[error("image could not be decoded: {0}")]
    ImageDecode(String),

    #[error("drawing failed: {0}")]
    Draw(String),

    #[error("document could not be saved: {0}")]
    Save(String),
}

impl BakeError {
    fn new(annotation_id: Option<AnnotationId>, cause: BakeCause) -> Self {
        Self {
            annotation_id,
            cause,
        }
    }
}

/// One planned draw operation, in z-order
#[derive(Debug)]
pub enum BakeOp {
    Text {
        annotation_id: AnnotationId,
        page_index: u16,
        x: f32,
        y: f32,
        text: String,
        font_size: f32,
        color: Color,
        font_family: &'static str,
    },

    Rect {
        annotation_id: AnnotationId,
        page_index: u16,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
    },

    Image {
        annotation_id: AnnotationId,
        page_index: u16,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        image: DynamicImage,
    },
}

impl BakeOp {
    /// Page this operation draws on
    pub fn page_index(&self) -> u16 {
        match self {
            BakeOp::Text { page_index, .. }
            | BakeOp::Rect { page_index, .. }
            | BakeOp::Image { page_index, .. } => *page_index,
        }
    }

    /// The annotation this operation was planned from
    pub fn annotation_id(&self) -> AnnotationId {
        match self {
            BakeOp::Text { annotation_id, .. }
            | BakeOp::Rect { annotation_id, .. }
            | BakeOp::Image { annotation_id, .. } => *annotation_id,
        }
    }
}

/// A fully resolved bake plan
#[derive(Debug)]
pub struct BakePlan {
    /// Draw operations in annotation insertion order
    pub ops: Vec<BakeOp>,

    /// Font families in first-use order; the executor embeds each exactly
    /// once per bake call
    pub font_families: Vec<&'static str>,
}

/// Resolve annotations into a bake plan
///
/// Pure with respect to pdfium: colors are resolved, image bytes decoded
/// by their tagged format (PNG and JPEG take distinct decode paths), and
/// font families deduplicated in first-use order. Fails with the id of
/// the offending annotation.
pub fn plan_bake(annotations: &[Annotation]) -> Result<BakePlan, BakeError> {
    let mut ops = Vec::with_capacity(annotations.len());
    let mut font_families: Vec<&'static str> = Vec::new();

    for annotation in annotations {
        match annotation {
            Annotation::Text {
                id,
                page_index,
                x,
                y,
                text,
                font_size,
                color,
            } => {
                if !font_families.contains(&DEFAULT_FONT_FAMILY) {
                    font_families.push(DEFAULT_FONT_FAMILY);
                }
                ops.push(BakeOp::Text {
                    annotation_id: *id,
                    page_index: *page_index,
                    x: *x,
                    y: *y,
                    text: text.clone(),
                    font_size: *font_size,
                    color: color.color(),
                    font_family: DEFAULT_FONT_FAMILY,
                });
            }

            Annotation::Rect {
                id,
                page_index,
                x,
                y,
                width,
                height,
                color,
                opacity_percent,
            } => {
                let alpha = (*opacity_percent as u32 * 255 / 100) as u8;
                ops.push(BakeOp::Rect {
                    annotation_id: *id,
                    page_index: *page_index,
                    x: *x,
                    y: *y,
                    width: *width,
                    height: *height,
                    color: color.color().with_alpha(alpha),
                });
            }

            Annotation::Image {
                id,
                page_index,
                x,
                y,
                width,
                height,
                bytes,
                format,
            } => {
                let decode_format = match format {
                    ImageFormat::Png => image::ImageFormat::Png,
                    ImageFormat::Jpeg => image::ImageFormat::Jpeg,
                };
                let image = image::load_from_memory_with_format(bytes, decode_format)
                    .map_err(|e| {
                        BakeError::new(Some(*id), BakeCause::ImageDecode(e.to_string()))
                    })?;
                ops.push(BakeOp::Image {
                    annotation_id: *id,
                    page_index: *page_index,
                    x: *x,
                    y: *y,
                    width: *width,
                    height: *height,
                    image,
                });
            }
        }
    }

    Ok(BakePlan { ops, font_families })
}

/// Initialize pdfium library
fn init_pdfium() -> Result<Pdfium, BakeError> {
    Ok(Pdfium::new(
        Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| BakeError::new(None, BakeCause::Initialization(e.to_string())))?,
    ))
}

/// Bake annotations into a new PDF byte stream
///
/// The original bytes are read, never written. Any failure aborts the
/// whole bake and no bytes are returned.
pub fn bake(original_bytes: &[u8], annotations: &[Annotation]) -> Result<Vec<u8>, BakeError> {
    let plan = plan_bake(annotations)?;

    let pdfium = init_pdfium()?;
    let mut document = pdfium
        .load_pdf_from_byte_slice(original_bytes, None)
        .map_err(|e| BakeError::new(None, BakeCause::OpenDocument(e.to_string())))?;

    // Per-bake font cache: each family is embedded exactly once, however
    // many text annotations use it.
    let mut fonts: HashMap<&'static str, PdfFontToken> = HashMap::new();
    for family in &plan.font_families {
        let token = match *family {
            "Times-Roman" => document.fonts_mut().times_roman(),
            "Courier" => document.fonts_mut().courier(),
            _ => document.fonts_mut().helvetica(),
        };
        fonts.insert(family, token);
    }

    // Group operations by page, preserving z-order within each page, so
    // every page handle is fetched and regenerated once.
    let mut ops_by_page: Vec<(u16, Vec<&BakeOp>)> = Vec::new();
    for op in &plan.ops {
        match ops_by_page.iter_mut().find(|(page, _)| *page == op.page_index()) {
            Some((_, page_ops)) => page_ops.push(op),
            None => ops_by_page.push((op.page_index(), vec![op])),
        }
    }

    for (page_index, page_ops) in ops_by_page {
        let first_id = page_ops.first().map(|op| op.annotation_id());
        let mut page = document
            .pages_mut()
            .get(page_index)
            .map_err(|_| BakeError::new(first_id, BakeCause::MissingPage(page_index)))?;

        for op in page_ops {
            apply_op(&document, &mut page, op, &fonts)?;
        }

        page.regenerate_content()
            .map_err(|e| BakeError::new(None, BakeCause::Draw(e.to_string())))?;
    }

    let bytes = document
        .save_to_bytes()
        .map_err(|e| BakeError::new(None, BakeCause::Save(e.to_string())))?;

    log::info!(
        "baked {} annotations into {} bytes",
        annotations.len(),
        bytes.len()
    );

    Ok(bytes)
}

fn apply_op<'a>(
    document: &PdfDocument<'a>,
    page: &mut PdfPage<'a>,
    op: &BakeOp,
    fonts: &HashMap<&'static str, PdfFontToken>,
) -> Result<(), BakeError> {
    let draw_error =
        |id: AnnotationId| move |e: PdfiumError| BakeError::new(Some(id), BakeCause::Draw(e.to_string()));

    match op {
        BakeOp::Text {
            annotation_id,
            x,
            y,
            text,
            font_size,
            color,
            font_family,
            ..
        } => {
            let font = fonts.get(font_family).copied().ok_or_else(|| {
                BakeError::new(
                    Some(*annotation_id),
                    BakeCause::Draw(format!("font {font_family} was not embedded")),
                )
            })?;
            let mut object =
                PdfPageTextObject::new(document, text, font, PdfPoints::new(*font_size))
                    .map_err(draw_error(*annotation_id))?;
            object
                .set_fill_color(PdfColor::new(color.r, color.g, color.b, color.a))
                .map_err(draw_error(*annotation_id))?;
            // Stored coordinates are already the PDF-space baseline
            // origin; no further transform is needed.
            object
                .translate(PdfPoints::new(*x), PdfPoints::new(*y))
                .map_err(draw_error(*annotation_id))?;
            page.objects_mut()
                .add_text_object(object)
                .map_err(draw_error(*annotation_id))?;
        }

        BakeOp::Rect {
            annotation_id,
            x,
            y,
            width,
            height,
            color,
            ..
        } => {
            let rect = PdfRect::new_from_values(
                *y,           // bottom
                *x,           // left
                *y + *height, // top
                *x + *width,  // right
            );
            page.objects_mut()
                .create_path_object_rect(
                    rect,
                    None,
                    None,
                    Some(PdfColor::new(color.r, color.g, color.b, color.a)),
                )
                .map_err(draw_error(*annotation_id))?;
        }

        BakeOp::Image {
            annotation_id,
            x,
            y,
            width,
            height,
            image,
            ..
        } => {
            let mut object = PdfPageImageObject::new_with_size(
                document,
                image,
                PdfPoints::new(*width),
                PdfPoints::new(*height),
            )
            .map_err(draw_error(*annotation_id))?;
            object
                .translate(PdfPoints::new(*x), PdfPoints::new(*y))
                .map_err(draw_error(*annotation_id))?;
            page.objects_mut()
                .add_image_object(object)
                .map_err(draw_error(*annotation_id))?;
        }
    }

    Ok(())
}

/// Bake on a background thread
///
/// The worker owns copies of the bytes and the annotation snapshot; a
/// bake runs to completion or failure and is not cancellable, since a
/// partially mutated document has no safe rollback.
pub fn bake_async(original_bytes: Vec<u8>, annotations: Vec<Annotation>) -> BakeHandle {
    let result = Arc::new(Mutex::new(None));
    let result_slot = Arc::clone(&result);

    let thread = std::thread::spawn(move || {
        let outcome = bake(&original_bytes, &annotations);
        *result_slot.lock().unwrap() = Some(outcome);
    });

    BakeHandle {
        thread: Some(thread),
        result,
    }
}

/// Handle to an in-flight bake
pub struct BakeHandle {
    thread: Option<std::thread::JoinHandle<()>>,
    result: Arc<Mutex<Option<Result<Vec<u8>, BakeError>>>>,
}

impl BakeHandle {
    /// Check if the bake has finished
    pub fn is_complete(&self) -> bool {
        self.result.lock().unwrap().is_some()
    }

    /// Try to take the result without blocking
    pub fn try_take(&mut self) -> Option<Result<Vec<u8>, BakeError>> {
        self.result.lock().unwrap().take()
    }

    /// Block until the bake finishes and return the result
    pub fn wait(mut self) -> Result<Vec<u8>, BakeError> {
        if let Some(thread) = self.thread.take() {
            thread.join().expect("Bake thread panicked");
        }
        self.result
            .lock()
            .unwrap()
            .take()
            .expect("No bake result available")
    }
}
