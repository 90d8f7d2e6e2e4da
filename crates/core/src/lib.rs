//! Annotation editor core
//!
//! State and logic for an interactive PDF annotation editor, independent
//! of any particular frontend: coordinate transforms between canvas
//! pixels and PDF points, the ordered annotation store, the page canvas
//! with cancel-superseded render requests, overlay preview painting, the
//! bake engine that writes annotations into a new PDF byte stream, and
//! the session state machine that ties them together.

pub mod annotation;
pub mod bake;
pub mod canvas;
pub mod coords;
pub mod document;
pub mod error;
pub mod overlay;
pub mod session;
pub mod tools;

pub use annotation::{
    Annotation, AnnotationId, AnnotationStore, Color, ColorKey, ImageFormat, ValidationError,
};
pub use bake::{bake, bake_async, plan_bake, BakeCause, BakeError, BakeHandle, BakeOp, BakePlan};
pub use canvas::{PageCanvas, RenderRequest};
pub use coords::{box_origin_from_click, box_top_left_pixel, pixel_to_point, point_to_pixel, PagePoint};
pub use document::{Document, LoadError};
pub use error::{EditorError, UserError};
pub use overlay::{build_overlay, paint_overlay, OverlayPrimitive};
pub use session::{EditorAction, EditorSession};
pub use tools::{
    RectOptions, SelectedImage, TextOptions, Tool, ToolController, ToolState, DEFAULT_IMAGE_WIDTH,
};
