//! Contract between the mode controller and the presentation layer.

use std::time::Duration;

use crate::document::NodeId;
use crate::error::TranslateResult;

/// Class carried by every node the renderer inserts for a translation.
///
/// Extraction skips nodes with this class so re-running it after a
/// translation pass never picks up translated text as source.
pub const TRANSLATION_OUTPUT_CLASS: &str = "translation-text";

/// How long an error indicator stays visible before clearing itself.
pub const DEFAULT_ERROR_DISPLAY: Duration = Duration::from_secs(5);

/// Operations the controller performs on a paragraph's render anchor.
///
/// Every mutating call fails with
/// [`TranslateError::RenderAttachmentStale`](crate::error::TranslateError::RenderAttachmentStale)
/// when the anchor has been detached from the document.
pub trait RenderingPort {
    fn is_attached(&self, anchor: NodeId) -> bool;

    fn show_original(&self, anchor: NodeId) -> TranslateResult<()>;

    fn hide_original(&self, anchor: NodeId) -> TranslateResult<()>;

    /// Attach translated text next to the anchor, replacing any earlier one.
    fn show_translation(&self, anchor: NodeId, text: &str) -> TranslateResult<()>;

    /// Detach translated text; a no-op when none is attached.
    fn remove_translation(&self, anchor: NodeId) -> TranslateResult<()>;

    fn show_progress(&self, anchor: NodeId, message: &str) -> TranslateResult<()>;

    fn clear_progress(&self, anchor: NodeId) -> TranslateResult<()>;

    /// Show an error indicator that clears itself after a fixed duration.
    fn show_error(&self, anchor: NodeId, message: &str) -> TranslateResult<()>;
}
