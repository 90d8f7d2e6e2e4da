//! Placement tool controller
//!
//! A small state machine selecting the active placement tool and
//! committing canvas clicks into the annotation store. Selecting the
//! active tool again toggles back to idle; selecting a different tool
//! switches directly without passing through idle. A successful commit
//! leaves the tool selected so the same mark type can be placed
//! repeatedly.

use crate::annotation::{
    Annotation, AnnotationId, AnnotationStore, ColorKey, ImageFormat,
};
use crate::coords::{box_origin_from_click, pixel_to_point};
use crate::error::{EditorError, UserError};

/// Placement tool kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Text,
    Image,
    Rect,
}

/// Tool selection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolState {
    /// No tool active; canvas clicks do nothing
    Idle,

    /// A tool is active; canvas clicks commit annotations
    Selected(Tool),
}

/// Pending settings for the text tool
#[derive(Debug, Clone, PartialEq)]
pub struct TextOptions {
    pub text: String,
    pub font_size: f32,
    pub color: ColorKey,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            text: "Text".to_string(),
            font_size: 16.0,
            color: ColorKey::Black,
        }
    }
}

/// Pending settings for the rectangle tool
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectOptions {
    pub width: f32,
    pub height: f32,
    pub color: ColorKey,
    pub opacity_percent: u8,
}

impl Default for RectOptions {
    fn default() -> Self {
        // Semi-transparent yellow, the common highlight default
        Self {
            width: 120.0,
            height: 80.0,
            color: ColorKey::Yellow,
            opacity_percent: 50,
        }
    }
}

/// Default placement width in points for a freshly chosen image
pub const DEFAULT_IMAGE_WIDTH: f32 = 200.0;

/// An image chosen for placement
///
/// Bytes are captured when the image is chosen; the placement size is in
/// points.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    pub width: f32,
    pub height: f32,
}

impl SelectedImage {
    /// Capture encoded image bytes for placement
    ///
    /// Decodes the bytes once to read the intrinsic size and scales it to
    /// the default placement width, preserving the aspect ratio.
    pub fn from_encoded(bytes: Vec<u8>, format: ImageFormat) -> Result<Self, EditorError> {
        let decode_format = match format {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        };
        let decoded = image::load_from_memory_with_format(&bytes, decode_format)
            .map_err(|e| UserError::InvalidImage(e.to_string()))?;

        let width = DEFAULT_IMAGE_WIDTH;
        let height = width * decoded.height() as f32 / decoded.width().max(1) as f32;
        Ok(Self {
            bytes,
            format,
            width,
            height,
        })
    }
}

/// Tool controller
#[derive(Debug, Clone, PartialEq)]
pub struct ToolController {
    state: ToolState,
    text_options: TextOptions,
    rect_options: RectOptions,
    selected_image: Option<SelectedImage>,
}

impl ToolController {
    /// Create a controller in the idle state with default tool options
    pub fn new() -> Self {
        Self {
            state: ToolState::Idle,
            text_options: TextOptions::default(),
            rect_options: RectOptions::default(),
            selected_image: None,
        }
    }

    /// Current selection state
    pub fn state(&self) -> ToolState {
        self.state
    }

    /// The active tool, if any
    pub fn active_tool(&self) -> Option<Tool> {
        match self.state {
            ToolState::Idle => None,
            ToolState::Selected(tool) => Some(tool),
        }
    }

    /// Select a tool
    ///
    /// Selecting the already-active tool toggles back to idle; selecting
    /// a different tool switches directly.
    pub fn select(&mut self, tool: Tool) {
        self.state = match self.state {
            ToolState::Selected(active) if active == tool => ToolState::Idle,
            _ => ToolState::Selected(tool),
        };
    }

    /// Text tool settings
    pub fn text_options(&self) -> &TextOptions {
        &self.text_options
    }

    /// Replace the text tool settings
    pub fn set_text_options(&mut self, options: TextOptions) {
        self.text_options = options;
    }

    /// Rectangle tool settings
    pub fn rect_options(&self) -> RectOptions {
        self.rect_options
    }

    /// Replace the rectangle tool settings
    pub fn set_rect_options(&mut self, options: RectOptions) {
        self.rect_options = options;
    }

    /// The image chosen for placement, if any
    pub fn selected_image(&self) -> Option<&SelectedImage> {
        self.selected_image.as_ref()
    }

    /// Choose an image for the image tool
    pub fn choose_image(&mut self, image: SelectedImage) {
        self.selected_image = Some(image);
    }

    /// Commit a canvas click into the store
    ///
    /// Converts the click position to page space through the coordinate
    /// transformer and appends the annotation the active tool describes.
    /// The image tool requires a chosen image and otherwise rejects the
    /// click with a [`UserError`] without changing state. After a
    /// successful commit the tool stays selected.
    pub fn commit_click(
        &mut self,
        store: &mut AnnotationStore,
        page_index: u16,
        px: f32,
        py: f32,
        scale: f32,
        base_height: f32,
    ) -> Result<AnnotationId, EditorError> {
        let tool = self
            .active_tool()
            .ok_or(EditorError::User(UserError::NoToolSelected))?;

        let annotation = match tool {
            Tool::Text => {
                let options = &self.text_options;
                let baseline = pixel_to_point(px, py, scale, base_height);
                Annotation::text(
                    page_index,
                    baseline.x,
                    baseline.y,
                    options.text.clone(),
                    options.font_size,
                    options.color,
                )
            }

            Tool::Rect => {
                let options = self.rect_options;
                let origin =
                    box_origin_from_click(px, py, options.height, scale, base_height);
                Annotation::rect(
                    page_index,
                    origin.x,
                    origin.y,
                    options.width,
                    options.height,
                    options.color,
                    options.opacity_percent,
                )
            }

            Tool::Image => {
                let image = self
                    .selected_image
                    .as_ref()
                    .ok_or(EditorError::User(UserError::NoImageSelected))?;
                let origin = box_origin_from_click(px, py, image.height, scale, base_height);
                Annotation::image(
                    page_index,
                    origin.x,
                    origin.y,
                    image.width,
                    image.height,
                    image.bytes.clone(),
                    image.format,
                )
            }
        };

        let id = store.add(annotation)?;
        Ok(id)
    }
}

impl Default for ToolController {
    fn default() -> Self {
        Self::new()
    }
}
