//! Seams between the controller and the browser.
//!
//! The page markup is owned by the server; the controller only reads and
//! writes it through [`FormView`]. Requests go through [`Uploader`]. The
//! `web-sys` implementations live in [`crate::dom`].

use futures::future::LocalBoxFuture;

use crate::payload::UploadPayload;
use crate::progress::{ProgressDisplay, ProgressSender};
use crate::types::{AppResult, FormSnapshot};

/// Read and write access to the upload form and its surroundings.
pub trait FormView {
    /// Current name and file selection.
    fn snapshot(&self) -> AppResult<FormSnapshot>;

    fn set_submit_enabled(&self, enabled: bool);

    fn render_progress(&self, progress: ProgressDisplay);

    /// Replace the content region with an HTML fragment.
    fn replace_content(&self, html: &str) -> AppResult<()>;

    fn show_error(&self, message: &str);

    fn clear_error(&self);
}

/// Sends the multipart upload.
///
/// Implementations report byte progress on `progress` and drop it once the
/// request completes. The returned string is the response body.
pub trait Uploader {
    fn upload<'a>(
        &'a self,
        payload: &'a UploadPayload,
        progress: ProgressSender,
    ) -> LocalBoxFuture<'a, AppResult<String>>;
}
