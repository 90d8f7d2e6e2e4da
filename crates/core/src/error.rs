//! Editor error taxonomy
//!
//! Validation and user errors are handled locally at the UI boundary and
//! never propagate past the tool controller; render and bake errors are
//! asynchronous failures surfaced with their specific cause. None of them
//! ever produce a half-correct artifact: a failed render keeps the prior
//! frame, a failed bake produces no file.

use crate::annotation::ValidationError;
use crate::bake::BakeError;
use crate::document::LoadError;
use pdf_annotator_render::PdfError;

/// An operator action that is invalid in the current state
///
/// Surfaced as a transient message; the state machine does not advance.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserError {
    #[error("select an image first")]
    NoImageSelected,

    #[error("no tool is selected")]
    NoToolSelected,

    #[error("no document is loaded")]
    NoDocumentLoaded,

    #[error("image could not be read: {0}")]
    InvalidImage(String),

    #[error("a bake is already in progress")]
    BakeInProgress,
}

/// Umbrella error at the session boundary
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    User(#[from] UserError),

    #[error("render failed: {0}")]
    Render(#[from] PdfError),

    #[error("{0}")]
    Bake(#[from] BakeError),

    #[error("{0}")]
    Load(#[from] LoadError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_error_messages() {
        assert_eq!(UserError::NoImageSelected.to_string(), "select an image first");
        assert_eq!(
            UserError::BakeInProgress.to_string(),
            "a bake is already in progress"
        );
    }

    #[test]
    fn test_validation_error_converts() {
        let err: EditorError = ValidationError::NonPositive {
            field: "width",
            value: -10.0,
        }
        .into();
        assert!(matches!(err, EditorError::Validation(_)));
        assert!(err.to_string().contains("width"));
    }
}
