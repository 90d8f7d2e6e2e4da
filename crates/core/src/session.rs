//! Editor session state
//!
//! One [`EditorSession`] holds everything a frontend needs between
//! events: the loaded document, the annotation store, the tool
//! controller and the bake lifecycle. State advances through
//! [`EditorSession::apply`] with an [`EditorAction`], so every frontend
//! event funnels through one place and the invariants live in one place:
//! a single bake in flight, no document swap while a bake runs, and
//! baked output invalidated by any store edit.

use crate::annotation::{Annotation, AnnotationId, AnnotationStore, ValidationError};
use crate::bake::BakeError;
use crate::document::Document;
use crate::error::{EditorError, UserError};
use crate::tools::{SelectedImage, Tool, ToolController};
use pdf_annotator_render::{AsyncThumbnailGenerator, Thumbnail, ThumbnailHandle};
use std::sync::Arc;

/// Placeholder stem when the upload carried no usable file name
const DEFAULT_FILE_STEM: &str = "document";

/// Suffix appended to the source file name for the baked download
const DOWNLOAD_SUFFIX: &str = "_edited";

/// One frontend event, applied through [`EditorSession::apply`]
#[derive(Debug)]
pub enum EditorAction {
    /// Replace the session document with freshly uploaded bytes
    LoadDocument { bytes: Vec<u8>, file_name: String },

    /// Select or toggle a placement tool
    SelectTool(Tool),

    /// Choose the image the image tool will place
    ChooseImage(SelectedImage),

    /// Commit a canvas click at pixel `(px, py)` on a page shown at
    /// `scale`
    CommitAnnotation {
        page_index: u16,
        px: f32,
        py: f32,
        scale: f32,
    },

    /// Remove one annotation by id
    RemoveAnnotation(AnnotationId),

    /// Remove every annotation
    ClearAnnotations,

    /// The first full-size render of the loaded document completed
    ///
    /// Schedules thumbnail generation; the thumbnail pass never runs
    /// before this, so it cannot block initial interactivity.
    FirstRenderCompleted,

    /// Mark a bake as started; the worker reads its inputs from
    /// [`EditorSession::bake_inputs`]
    BakeStarted,

    /// Deliver a finished bake result from the worker
    BakeFinished(Result<Vec<u8>, BakeError>),

    /// The baked bytes were handed to the user
    Downloaded,
}

/// Whole-editor state
pub struct EditorSession {
    document: Option<Document>,
    file_name: Option<String>,
    store: AnnotationStore,
    tools: ToolController,

    /// Bumped on every store mutation; a bake result is only kept when
    /// the store has not moved since the bake started
    revision: u64,

    /// Revision captured at bake start, `None` when no bake is in flight
    bake_revision: Option<u64>,

    baked_bytes: Option<Vec<u8>>,

    thumbnailer: AsyncThumbnailGenerator,
    thumbnail_handle: Option<ThumbnailHandle>,
    thumbnails: Option<Vec<Thumbnail>>,

    /// Set when thumbnail generation has been scheduled for the current
    /// document; it runs at most once per load
    thumbnails_started: bool,
}

impl EditorSession {
    /// Create an empty session with no document loaded
    pub fn new() -> Self {
        Self {
            document: None,
            file_name: None,
            store: AnnotationStore::new(0),
            tools: ToolController::new(),
            revision: 0,
            bake_revision: None,
            baked_bytes: None,
            thumbnailer: AsyncThumbnailGenerator::default(),
            thumbnail_handle: None,
            thumbnails: None,
            thumbnails_started: false,
        }
    }

    /// The loaded document, if any
    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// The annotation store
    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    /// The tool controller
    pub fn tools(&self) -> &ToolController {
        &self.tools
    }

    /// Mutable tool controller, for adjusting tool options
    pub fn tools_mut(&mut self) -> &mut ToolController {
        &mut self.tools
    }

    /// Whether a bake is currently running
    pub fn bake_in_flight(&self) -> bool {
        self.bake_revision.is_some()
    }

    /// The latest baked output, when it is still current
    pub fn baked_bytes(&self) -> Option<&[u8]> {
        self.baked_bytes.as_deref()
    }

    /// Whether a thumbnail run is currently in flight
    pub fn thumbnails_in_flight(&self) -> bool {
        self.thumbnail_handle.is_some()
    }

    /// Thumbnails for the loaded document, once generation has finished
    pub fn thumbnails(&self) -> Option<&[Thumbnail]> {
        self.thumbnails.as_deref()
    }

    /// Poll in-flight thumbnail generation
    ///
    /// Takes the worker's result once it finishes. Failures are logged
    /// and dropped; the thumbnail strip is best-effort and never blocks
    /// editing.
    pub fn poll_thumbnails(&mut self) {
        let Some(handle) = self.thumbnail_handle.as_mut() else {
            return;
        };
        let Some(result) = handle.try_take() else {
            return;
        };
        self.thumbnail_handle = None;
        match result {
            Ok(thumbnails) => {
                log::debug!("thumbnail generation finished: {} pages", thumbnails.len());
                self.thumbnails = Some(thumbnails);
            }
            Err(error) => log::warn!("thumbnail generation failed: {}", error),
        }
    }

    /// Inputs for the bake worker: pristine bytes plus a store snapshot
    ///
    /// `None` until a document is loaded.
    pub fn bake_inputs(&self) -> Option<(Arc<Vec<u8>>, Vec<Annotation>)> {
        let document = self.document.as_ref()?;
        Some((Arc::clone(document.bytes()), self.store.snapshot()))
    }

    /// File name offered for download
    ///
    /// When baked output exists the source name gains an `_edited`
    /// suffix, so `report.pdf` downloads as `report_edited.pdf`; without
    /// baked output the original name is offered unchanged.
    pub fn download_file_name(&self) -> String {
        let name = self.file_name.as_deref().unwrap_or(DEFAULT_FILE_STEM);
        if self.baked_bytes.is_none() {
            return name.to_string();
        }
        let stem = name
            .strip_suffix(".pdf")
            .or_else(|| name.strip_suffix(".PDF"))
            .unwrap_or(name);
        format!("{stem}{DOWNLOAD_SUFFIX}.pdf")
    }

    /// Apply one action to the session
    pub fn apply(&mut self, action: EditorAction) -> Result<(), EditorError> {
        match action {
            EditorAction::LoadDocument { bytes, file_name } => {
                // A bake still reads the current document's bytes; the
                // swap waits until it lands.
                if self.bake_in_flight() {
                    return Err(UserError::BakeInProgress.into());
                }

                let document = Document::load(bytes)?;

                // A thumbnail run for the old document is obsolete.
                if let Some(handle) = self.thumbnail_handle.take() {
                    handle.cancel();
                }
                self.thumbnails = None;
                self.thumbnails_started = false;

                self.store = AnnotationStore::new(document.page_count());
                self.document = Some(document);
                self.file_name = Some(file_name);
                self.tools = ToolController::new();
                self.baked_bytes = None;
                self.revision += 1;
                Ok(())
            }

            EditorAction::SelectTool(tool) => {
                if self.document.is_none() {
                    return Err(UserError::NoDocumentLoaded.into());
                }
                self.tools.select(tool);
                Ok(())
            }

            EditorAction::ChooseImage(image) => {
                if self.document.is_none() {
                    return Err(UserError::NoDocumentLoaded.into());
                }
                self.tools.choose_image(image);
                Ok(())
            }

            EditorAction::FirstRenderCompleted => {
                let document = self
                    .document
                    .as_ref()
                    .ok_or(UserError::NoDocumentLoaded)?;

                // Once per document; later render completions are no-ops.
                if !self.thumbnails_started {
                    self.thumbnails_started = true;
                    log::debug!("scheduling thumbnail generation");
                    let bytes = document.bytes().as_ref().clone();
                    self.thumbnail_handle = Some(self.thumbnailer.generate_async(bytes));
                }
                Ok(())
            }

            EditorAction::CommitAnnotation {
                page_index,
                px,
                py,
                scale,
            } => {
                let document = self
                    .document
                    .as_ref()
                    .ok_or(UserError::NoDocumentLoaded)?;
                let base_height = document
                    .page_size(page_index)
                    .ok_or(ValidationError::PageIndexOutOfRange {
                        page_index,
                        page_count: document.page_count(),
                    })?
                    .height;

                self.tools
                    .commit_click(&mut self.store, page_index, px, py, scale, base_height)?;
                self.mark_store_changed();
                Ok(())
            }

            EditorAction::RemoveAnnotation(id) => {
                if self.store.remove(id).is_some() {
                    self.mark_store_changed();
                }
                Ok(())
            }

            EditorAction::ClearAnnotations => {
                if !self.store.is_empty() {
                    self.store.clear();
                    self.mark_store_changed();
                }
                Ok(())
            }

            EditorAction::BakeStarted => {
                if self.document.is_none() {
                    return Err(UserError::NoDocumentLoaded.into());
                }
                if self.bake_in_flight() {
                    log::warn!("bake requested while one is already in flight");
                    return Err(UserError::BakeInProgress.into());
                }
                self.bake_revision = Some(self.revision);
                Ok(())
            }

            EditorAction::BakeFinished(result) => {
                let started_at = self.bake_revision.take();
                let bytes = result?;

                // Edits made while the bake ran make its output stale;
                // it is dropped rather than offered for download.
                if started_at == Some(self.revision) {
                    self.baked_bytes = Some(bytes);
                } else {
                    log::debug!("discarding stale bake result");
                }
                Ok(())
            }

            EditorAction::Downloaded => {
                self.baked_bytes = None;
                Ok(())
            }
        }
    }

    /// Bump the revision and drop any now-stale baked output
    fn mark_store_changed(&mut self) {
        self.revision += 1;
        self.baked_bytes = None;
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::ImageFormat;
    use crate::bake::BakeCause;

    /// Session with a fake one-page document injected, sidestepping the
    /// pdfium load path which needs a native library.
    fn session_with_document() -> EditorSession {
        let mut session = EditorSession::new();
        session.document = Some(fake_document());
        session.file_name = Some("report.pdf".to_string());
        session.store = AnnotationStore::new(1);
        session
    }

    fn fake_document() -> Document {
        Document::test_fixture(
            vec![0x25, 0x50, 0x44, 0x46],
            vec![pdf_annotator_render::PageSize {
                width: 612.0,
                height: 792.0,
            }],
        )
    }

    #[test]
    fn test_actions_without_document_are_rejected() {
        let mut session = EditorSession::new();

        assert!(matches!(
            session.apply(EditorAction::SelectTool(Tool::Text)),
            Err(EditorError::User(UserError::NoDocumentLoaded))
        ));
        assert!(matches!(
            session.apply(EditorAction::BakeStarted),
            Err(EditorError::User(UserError::NoDocumentLoaded))
        ));
        assert!(matches!(
            session.apply(EditorAction::CommitAnnotation {
                page_index: 0,
                px: 0.0,
                py: 0.0,
                scale: 1.0,
            }),
            Err(EditorError::User(UserError::NoDocumentLoaded))
        ));
    }

    #[test]
    fn test_choose_image_without_document_is_rejected() {
        let mut session = EditorSession::new();

        let result = session.apply(EditorAction::ChooseImage(SelectedImage {
            bytes: vec![1, 2, 3],
            format: ImageFormat::Png,
            width: 10.0,
            height: 10.0,
        }));
        assert!(matches!(
            result,
            Err(EditorError::User(UserError::NoDocumentLoaded))
        ));
        assert!(session.tools().selected_image().is_none());
    }

    #[test]
    fn test_first_render_without_document_is_rejected() {
        let mut session = EditorSession::new();

        let result = session.apply(EditorAction::FirstRenderCompleted);
        assert!(matches!(
            result,
            Err(EditorError::User(UserError::NoDocumentLoaded))
        ));
        assert!(!session.thumbnails_in_flight());
    }

    #[test]
    fn test_thumbnails_scheduled_once_after_first_render() {
        let mut session = session_with_document();

        // Nothing runs before the first full-size render completes.
        assert!(!session.thumbnails_in_flight());
        assert!(session.thumbnails().is_none());

        session.apply(EditorAction::FirstRenderCompleted).unwrap();
        assert!(session.thumbnails_in_flight());

        // Later render completions do not reschedule the run.
        session.apply(EditorAction::FirstRenderCompleted).unwrap();

        // Drain the worker; the fixture bytes are not a real PDF, so the
        // run fails and the strip stays empty.
        while session.thumbnails_in_flight() {
            session.poll_thumbnails();
            std::thread::yield_now();
        }
        assert!(session.thumbnails().is_none());

        // Still once per document: the run is not restarted after it
        // finished.
        session.apply(EditorAction::FirstRenderCompleted).unwrap();
        assert!(!session.thumbnails_in_flight());
    }

    #[test]
    fn test_commit_annotation_through_session() {
        let mut session = session_with_document();
        session.apply(EditorAction::SelectTool(Tool::Text)).unwrap();

        session
            .apply(EditorAction::CommitAnnotation {
                page_index: 0,
                px: 100.0,
                py: 184.0,
                scale: 2.0,
            })
            .unwrap();

        assert_eq!(session.store().len(), 1);
    }

    #[test]
    fn test_commit_on_out_of_range_page_is_rejected() {
        let mut session = session_with_document();
        session.apply(EditorAction::SelectTool(Tool::Text)).unwrap();

        let result = session.apply(EditorAction::CommitAnnotation {
            page_index: 5,
            px: 0.0,
            py: 0.0,
            scale: 1.0,
        });
        assert!(matches!(result, Err(EditorError::Validation(_))));
        assert!(session.store().is_empty());
    }

    #[test]
    fn test_single_bake_in_flight() {
        let mut session = session_with_document();

        session.apply(EditorAction::BakeStarted).unwrap();
        assert!(session.bake_in_flight());

        assert!(matches!(
            session.apply(EditorAction::BakeStarted),
            Err(EditorError::User(UserError::BakeInProgress))
        ));
    }

    #[test]
    fn test_load_during_bake_is_rejected() {
        let mut session = session_with_document();
        session.apply(EditorAction::BakeStarted).unwrap();

        let result = session.apply(EditorAction::LoadDocument {
            bytes: vec![1, 2, 3],
            file_name: "other.pdf".to_string(),
        });
        assert!(matches!(
            result,
            Err(EditorError::User(UserError::BakeInProgress))
        ));
    }

    #[test]
    fn test_bake_result_kept_when_store_unchanged() {
        let mut session = session_with_document();
        session.apply(EditorAction::BakeStarted).unwrap();

        session
            .apply(EditorAction::BakeFinished(Ok(vec![9, 9, 9])))
            .unwrap();

        assert!(!session.bake_in_flight());
        assert_eq!(session.baked_bytes(), Some(&[9u8, 9, 9][..]));
    }

    #[test]
    fn test_bake_result_dropped_after_store_edit() {
        let mut session = session_with_document();
        session.apply(EditorAction::SelectTool(Tool::Text)).unwrap();
        session.apply(EditorAction::BakeStarted).unwrap();

        // Edit lands while the bake is running.
        session
            .apply(EditorAction::CommitAnnotation {
                page_index: 0,
                px: 10.0,
                py: 10.0,
                scale: 1.0,
            })
            .unwrap();

        session
            .apply(EditorAction::BakeFinished(Ok(vec![9, 9, 9])))
            .unwrap();

        assert!(!session.bake_in_flight());
        assert!(session.baked_bytes().is_none());
    }

    #[test]
    fn test_bake_failure_clears_in_flight_and_surfaces() {
        let mut session = session_with_document();
        session.apply(EditorAction::BakeStarted).unwrap();

        let failure = BakeError {
            annotation_id: None,
            cause: BakeCause::Save("disk full".to_string()),
        };
        let result = session.apply(EditorAction::BakeFinished(Err(failure)));

        assert!(matches!(result, Err(EditorError::Bake(_))));
        assert!(!session.bake_in_flight());
        assert!(session.baked_bytes().is_none());
    }

    #[test]
    fn test_store_edit_invalidates_baked_bytes() {
        let mut session = session_with_document();
        session.apply(EditorAction::BakeStarted).unwrap();
        session
            .apply(EditorAction::BakeFinished(Ok(vec![1])))
            .unwrap();
        assert!(session.baked_bytes().is_some());

        session.apply(EditorAction::ClearAnnotations).unwrap();
        // Clearing an empty store is a no-op and keeps the bake.
        assert!(session.baked_bytes().is_some());

        session.apply(EditorAction::SelectTool(Tool::Rect)).unwrap();
        session
            .apply(EditorAction::CommitAnnotation {
                page_index: 0,
                px: 50.0,
                py: 50.0,
                scale: 1.0,
            })
            .unwrap();
        assert!(session.baked_bytes().is_none());
    }

    #[test]
    fn test_download_file_name() {
        let mut session = session_with_document();
        // Without baked output the original name is offered.
        assert_eq!(session.download_file_name(), "report.pdf");

        session.apply(EditorAction::BakeStarted).unwrap();
        session
            .apply(EditorAction::BakeFinished(Ok(vec![1])))
            .unwrap();
        assert_eq!(session.download_file_name(), "report_edited.pdf");

        session.file_name = Some("scan.PDF".to_string());
        assert_eq!(session.download_file_name(), "scan_edited.pdf");

        session.file_name = Some("notes".to_string());
        assert_eq!(session.download_file_name(), "notes_edited.pdf");

        session.file_name = None;
        assert_eq!(session.download_file_name(), "document_edited.pdf");
    }

    #[test]
    fn test_downloaded_clears_baked_bytes() {
        let mut session = session_with_document();
        session.apply(EditorAction::BakeStarted).unwrap();
        session
            .apply(EditorAction::BakeFinished(Ok(vec![1])))
            .unwrap();

        session.apply(EditorAction::Downloaded).unwrap();
        assert!(session.baked_bytes().is_none());
    }

    #[test]
    fn test_remove_missing_annotation_keeps_bake() {
        let mut session = session_with_document();
        session.apply(EditorAction::BakeStarted).unwrap();
        session
            .apply(EditorAction::BakeFinished(Ok(vec![1])))
            .unwrap();

        session
            .apply(EditorAction::RemoveAnnotation(uuid::Uuid::new_v4()))
            .unwrap();
        assert!(session.baked_bytes().is_some());
    }
}
