//! Annotation data model and ordered store
//!
//! Annotations are immutable once created; editing is remove + re-add,
//! never in-place mutation, so no cached render or bake state can observe
//! a half-updated record. All geometry is stored in PDF page space:
//! origin bottom-left, y increasing upward, units in points (1/72 inch).
//! For box annotations `(x, y)` is the bottom-left corner of the bounding
//! box; for text it is the baseline origin.

use serde::{Deserialize, Serialize};

/// Unique identifier for an annotation
///
/// Stable for the annotation's lifetime, generated with UUID v4.
pub type AnnotationId = uuid::Uuid;

/// RGBA color representation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    /// Create an opaque color
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Replace the alpha channel
    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Pixel value as `[r, g, b, a]`
    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Closed palette of annotation colors
///
/// The tool panel offers a fixed set of keys; resolving a key to its RGBA
/// value happens once, at draw time, in the overlay renderer and the bake
/// engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorKey {
    Black,
    White,
    Red,
    Green,
    Blue,
    Yellow,
}

impl ColorKey {
    /// Resolve this key to its color value
    pub fn color(self) -> Color {
        match self {
            ColorKey::Black => Color::rgb(0, 0, 0),
            ColorKey::White => Color::rgb(255, 255, 255),
            ColorKey::Red => Color::rgb(255, 0, 0),
            ColorKey::Green => Color::rgb(0, 255, 0),
            ColorKey::Blue => Color::rgb(0, 0, 255),
            ColorKey::Yellow => Color::rgb(255, 255, 0),
        }
    }
}

/// Encoded format of uploaded image bytes
///
/// PNG and JPEG take different decode and embed paths in the bake engine,
/// so the format is captured alongside the bytes at selection time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
}

/// A pending annotation mark
///
/// Tagged union over the three mark types. Both the overlay renderer and
/// the bake engine match exhaustively on this enum, so adding a variant
/// forces both consumers to handle it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Annotation {
    /// Text drawn at a baseline origin
    Text {
        id: AnnotationId,
        page_index: u16,
        x: f32,
        y: f32,
        text: String,
        font_size: f32,
        color: ColorKey,
    },

    /// An uploaded image drawn into a bounding box
    ///
    /// `bytes` is the encoded image captured at upload time, not a live
    /// reference to an external resource.
    Image {
        id: AnnotationId,
        page_index: u16,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        bytes: Vec<u8>,
        format: ImageFormat,
    },

    /// A filled rectangle with configurable opacity
    Rect {
        id: AnnotationId,
        page_index: u16,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: ColorKey,
        opacity_percent: u8,
    },
}

impl Annotation {
    /// Create a text annotation with a generated id
    pub fn text(
        page_index: u16,
        x: f32,
        y: f32,
        text: impl Into<String>,
        font_size: f32,
        color: ColorKey,
    ) -> Self {
        Annotation::Text {
            id: AnnotationId::new_v4(),
            page_index,
            x,
            y,
            text: text.into(),
            font_size,
            color,
        }
    }

    /// Create an image annotation with a generated id
    pub fn image(
        page_index: u16,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        bytes: Vec<u8>,
        format: ImageFormat,
    ) -> Self {
        Annotation::Image {
            id: AnnotationId::new_v4(),
            page_index,
            x,
            y,
            width,
            height,
            bytes,
            format,
        }
    }

    /// Create a rectangle annotation with a generated id
    pub fn rect(
        page_index: u16,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: ColorKey,
        opacity_percent: u8,
    ) -> Self {
        Annotation::Rect {
            id: AnnotationId::new_v4(),
            page_index,
            x,
            y,
            width,
            height,
            color,
            opacity_percent,
        }
    }

    /// Annotation id
    pub fn id(&self) -> AnnotationId {
        match self {
            Annotation::Text { id, .. }
            | Annotation::Image { id, .. }
            | Annotation::Rect { id, .. } => *id,
        }
    }

    /// Page this annotation belongs to (0-based)
    pub fn page_index(&self) -> u16 {
        match self {
            Annotation::Text { page_index, .. }
            | Annotation::Image { page_index, .. }
            | Annotation::Rect { page_index, .. } => *page_index,
        }
    }
}

/// Annotation validation failure
///
/// Surfaced inline in the tool panel; the commit is blocked and the store
/// is left unchanged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} is not a finite number")]
    NonFinite { field: &'static str },

    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f32 },

    #[error("page index {page_index} out of range (document has {page_count} pages)")]
    PageIndexOutOfRange { page_index: u16, page_count: u16 },

    #[error("opacity {value}% out of range (0-100)")]
    OpacityOutOfRange { value: u8 },
}

fn check_finite(field: &'static str, value: f32) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NonFinite { field })
    }
}

fn check_positive(field: &'static str, value: f32) -> Result<(), ValidationError> {
    check_finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::NonPositive { field, value })
    }
}

/// Ordered collection of pending annotations
///
/// Iteration order is insertion order, which defines both overlay draw
/// order and the z-order of the baked document: later annotations draw on
/// top of earlier ones, across all annotation types. Backed by a `Vec` so
/// the ordering is structural rather than maintained by bookkeeping.
///
/// The store is mutated only from UI event handlers on a single thread;
/// there is never a concurrent writer.
#[derive(Debug, Clone)]
pub struct AnnotationStore {
    entries: Vec<Annotation>,
    page_count: u16,
}

impl AnnotationStore {
    /// Create an empty store for a document with the given page count
    pub fn new(page_count: u16) -> Self {
        Self {
            entries: Vec::new(),
            page_count,
        }
    }

    /// Page count the store validates against
    pub fn page_count(&self) -> u16 {
        self.page_count
    }

    /// Validate and append an annotation, returning its id
    ///
    /// On any validation failure the store is left unchanged.
    pub fn add(&mut self, annotation: Annotation) -> Result<AnnotationId, ValidationError> {
        self.validate(&annotation)?;
        let id = annotation.id();
        self.entries.push(annotation);
        Ok(id)
    }

    /// Remove an annotation by id
    ///
    /// Returns the removed annotation, or `None` if the id is unknown.
    /// The relative order of the remaining annotations is unchanged.
    pub fn remove(&mut self, id: AnnotationId) -> Option<Annotation> {
        let position = self.entries.iter().position(|a| a.id() == id)?;
        Some(self.entries.remove(position))
    }

    /// Remove all annotations
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// All annotations in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.entries.iter()
    }

    /// Annotations for one page, in insertion order
    pub fn for_page(&self, page_index: u16) -> impl Iterator<Item = &Annotation> {
        self.entries
            .iter()
            .filter(move |a| a.page_index() == page_index)
    }

    /// Number of annotations in the store
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of all annotations, in insertion order
    ///
    /// Used to hand a stable copy to the bake engine and to background
    /// overlay repaints.
    pub fn snapshot(&self) -> Vec<Annotation> {
        self.entries.clone()
    }

    fn validate(&self, annotation: &Annotation) -> Result<(), ValidationError> {
        let page_index = annotation.page_index();
        if page_index >= self.page_count {
            return Err(ValidationError::PageIndexOutOfRange {
                page_index,
                page_count: self.page_count,
            });
        }

        match annotation {
            Annotation::Text {
                x, y, font_size, ..
            } => {
                check_finite("x", *x)?;
                check_finite("y", *y)?;
                check_positive("font_size", *font_size)?;
            }
            Annotation::Image {
                x,
                y,
                width,
                height,
                ..
            } => {
                check_finite("x", *x)?;
                check_finite("y", *y)?;
                check_positive("width", *width)?;
                check_positive("height", *height)?;
            }
            Annotation::Rect {
                x,
                y,
                width,
                height,
                opacity_percent,
                ..
            } => {
                check_finite("x", *x)?;
                check_finite("y", *y)?;
                check_positive("width", *width)?;
                check_positive("height", *height)?;
                if *opacity_percent > 100 {
                    return Err(ValidationError::OpacityOutOfRange {
                        value: *opacity_percent,
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_rect(page_index: u16) -> Annotation {
        Annotation::rect(page_index, 10.0, 20.0, 100.0, 50.0, ColorKey::Yellow, 50)
    }

    #[test]
    fn test_color_key_resolution() {
        assert_eq!(ColorKey::Black.color(), Color::rgb(0, 0, 0));
        assert_eq!(ColorKey::Red.color(), Color::rgb(255, 0, 0));
        assert_eq!(ColorKey::Yellow.color().to_rgba(), [255, 255, 0, 255]);
    }

    #[test]
    fn test_add_returns_id_and_preserves_order() {
        let mut store = AnnotationStore::new(2);

        let first = store.add(sample_rect(0)).unwrap();
        let second = store
            .add(Annotation::text(1, 50.0, 700.0, "Hello", 16.0, ColorKey::Black))
            .unwrap();
        let third = store.add(sample_rect(0)).unwrap();

        let order: Vec<AnnotationId> = store.iter().map(|a| a.id()).collect();
        assert_eq!(order, vec![first, second, third]);
    }

    #[test]
    fn test_remove_keeps_relative_order() {
        let mut store = AnnotationStore::new(1);

        let first = store.add(sample_rect(0)).unwrap();
        let second = store.add(sample_rect(0)).unwrap();
        let third = store.add(sample_rect(0)).unwrap();

        store.remove(second);

        let order: Vec<AnnotationId> = store.iter().map(|a| a.id()).collect();
        assert_eq!(order, vec![first, third]);
    }

    #[test]
    fn test_remove_unknown_id_is_none() {
        let mut store = AnnotationStore::new(1);
        store.add(sample_rect(0)).unwrap();

        assert!(store.remove(AnnotationId::new_v4()).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_for_page_filters_by_page() {
        let mut store = AnnotationStore::new(3);
        store.add(sample_rect(0)).unwrap();
        store.add(sample_rect(2)).unwrap();
        store.add(sample_rect(0)).unwrap();

        assert_eq!(store.for_page(0).count(), 2);
        assert_eq!(store.for_page(1).count(), 0);
        assert_eq!(store.for_page(2).count(), 1);
    }

    #[test]
    fn test_negative_width_rejected_store_unchanged() {
        let mut store = AnnotationStore::new(1);

        let result = store.add(Annotation::rect(
            0,
            10.0,
            10.0,
            -10.0,
            50.0,
            ColorKey::Red,
            100,
        ));

        assert_eq!(
            result,
            Err(ValidationError::NonPositive {
                field: "width",
                value: -10.0
            })
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_nan_coordinate_rejected() {
        let mut store = AnnotationStore::new(1);

        let result = store.add(Annotation::text(
            0,
            f32::NAN,
            10.0,
            "x",
            12.0,
            ColorKey::Black,
        ));

        assert_eq!(result, Err(ValidationError::NonFinite { field: "x" }));
        assert!(store.is_empty());
    }

    #[test]
    fn test_page_index_out_of_range_rejected() {
        let mut store = AnnotationStore::new(2);

        let result = store.add(sample_rect(2));
        assert_eq!(
            result,
            Err(ValidationError::PageIndexOutOfRange {
                page_index: 2,
                page_count: 2
            })
        );
    }

    #[test]
    fn test_opacity_over_100_rejected() {
        let mut store = AnnotationStore::new(1);

        let result = store.add(Annotation::rect(
            0,
            0.0,
            0.0,
            10.0,
            10.0,
            ColorKey::Blue,
            101,
        ));
        assert_eq!(
            result,
            Err(ValidationError::OpacityOutOfRange { value: 101 })
        );
    }

    #[test]
    fn test_zero_font_size_rejected() {
        let mut store = AnnotationStore::new(1);

        let result = store.add(Annotation::text(0, 5.0, 5.0, "x", 0.0, ColorKey::Black));
        assert_eq!(
            result,
            Err(ValidationError::NonPositive {
                field: "font_size",
                value: 0.0
            })
        );
    }

    #[test]
    fn test_clear_empties_store() {
        let mut store = AnnotationStore::new(1);
        store.add(sample_rect(0)).unwrap();
        store.add(sample_rect(0)).unwrap();

        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_annotation_serde_round_trip() {
        let annotation = Annotation::text(0, 50.0, 700.0, "Hello", 16.0, ColorKey::Black);

        let json = serde_json::to_string(&annotation).unwrap();
        assert!(json.contains("\"kind\":\"text\""));
        assert!(json.contains("\"color\":\"black\""));

        let parsed: Annotation = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, annotation);
    }
}
