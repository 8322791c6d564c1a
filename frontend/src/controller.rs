//! Upload form controller.
//!
//! Owns the submit gate, the upload lifecycle and the table registry.
//! Everything it touches in the page goes through the traits in
//! [`crate::view`] and [`crate::tables`].
//!
//! ```text
//! input / change ──▶ validate() ──▶ submit control enabled?
//!
//! submit ──▶ Idle? ──▶ gate open? ──▶ Uploading ──▶ POST /upload
//!                                        │   progress ──▶ progress bar
//!                                        ▼
//!                     Ok(html) ──▶ replace content ──▶ initialize tables
//!                     Err(e)   ──▶ show error
//!                                        ▼
//!                                 Idle ──▶ validate()
//! ```

use futures::StreamExt;
use std::cell::{Cell, RefCell};

use crate::form;
use crate::payload::UploadPayload;
use crate::progress::{progress_channel, ProgressDisplay};
use crate::tables::{TableInitReport, TableRegistry, TableWidget};
use crate::types::{AppError, AppResult, UploadState};
use crate::view::{FormView, Uploader};

pub struct UploadFormController<V, U, T> {
    view: V,
    uploader: U,
    tables: T,
    state: Cell<UploadState>,
    registry: RefCell<TableRegistry>,
}

impl<V, U, T> UploadFormController<V, U, T>
where
    V: FormView,
    U: Uploader,
    T: TableWidget,
{
    pub fn new(view: V, uploader: U, tables: T) -> Self {
        Self {
            view,
            uploader,
            tables,
            state: Cell::new(UploadState::Idle),
            registry: RefCell::new(TableRegistry::new()),
        }
    }

    pub fn state(&self) -> UploadState {
        self.state.get()
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    /// Recompute the submit gate from the live form.
    ///
    /// Returns whether the submit control is now enabled.
    pub fn validate(&self) -> bool {
        let enabled = match self.view.snapshot() {
            Ok(snapshot) => form::submit_enabled(&snapshot, self.state.get()),
            Err(e) => {
                log::warn!("Cannot read upload form: {}", e);
                false
            }
        };
        self.view.set_submit_enabled(enabled);
        enabled
    }

    /// Wrap flagged tables not wrapped yet.
    pub fn initialize_tables(&self) -> TableInitReport {
        self.registry.borrow_mut().initialize(&self.tables)
    }

    /// Upload the current selection and render the server's answer.
    ///
    /// Rejected without a request when an upload is in flight or the gate is
    /// closed. Success and failure both end in [`UploadState::Idle`] with the
    /// gate recomputed.
    pub async fn submit(&self) -> AppResult<()> {
        if self.state.get() == UploadState::Uploading {
            log::warn!("Submit ignored: upload already in progress");
            return Err(AppError::UploadInProgress);
        }

        let snapshot = match self.view.snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::error!("Cannot read upload form: {}", e);
                self.view.set_submit_enabled(false);
                self.view.show_error(&e.user_message());
                return Err(e);
            }
        };
        if let Some(reason) = form::rejection_reason(&snapshot) {
            self.view.set_submit_enabled(false);
            return Err(AppError::Validation(reason.to_string()));
        }

        self.state.set(UploadState::Uploading);
        self.view.set_submit_enabled(false);
        self.view.clear_error();
        self.view.render_progress(ProgressDisplay::START);

        let payload = UploadPayload::from_snapshot(&snapshot);
        log::info!(
            "Uploading {} replay(s) for {} ({} bytes)",
            payload.files.len(),
            payload.player_name,
            payload.total_size()
        );

        let (progress_tx, progress_rx) = progress_channel();
        let render_progress = progress_rx.for_each(|pct| {
            self.view.render_progress(ProgressDisplay::new(pct));
            futures::future::ready(())
        });
        let (response, ()) = futures::join!(self.uploader.upload(&payload, progress_tx), render_progress);

        let result = response.and_then(|html| self.apply_response(&html));
        self.state.set(UploadState::Idle);

        match &result {
            Ok(()) => log::info!("Upload complete"),
            Err(e) => {
                log::error!("Upload failed: {}", e);
                self.view.show_error(&e.user_message());
            }
        }
        self.validate();

        result
    }

    fn apply_response(&self, html: &str) -> AppResult<()> {
        self.view.replace_content(html)?;

        let mut registry = self.registry.borrow_mut();
        registry.reconcile(&self.tables);
        let report = registry.initialize(&self.tables);
        log::debug!(
            "Tables after refresh: {} activated, {} skipped, {} failed",
            report.activated.len(),
            report.skipped,
            report.failed.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::UploadPayload;
    use crate::progress::ProgressSender;
    use crate::tables::fake::FakeTables;
    use crate::tables::TableKind;
    use crate::types::{FormSnapshot, SelectedFile};
    use futures::channel::oneshot;
    use futures::executor::block_on;
    use futures::future::LocalBoxFuture;
    use std::rc::Rc;

    type Fragment = Vec<(Option<&'static str>, TableKind)>;

    /// Page stand-in: form values in, rendered state out.
    struct FakeView {
        snapshot: RefCell<FormSnapshot>,
        /// Simulates a page missing the form inputs
        broken: Cell<bool>,
        submit_enabled: Cell<bool>,
        progress: RefCell<Vec<u8>>,
        content: RefCell<Option<String>>,
        error: RefCell<Option<String>>,
        tables: Rc<FakeTables>,
        /// Tables the next content replacement puts in the page
        fragment: RefCell<Fragment>,
    }

    impl FakeView {
        fn new(tables: Rc<FakeTables>) -> Self {
            Self {
                snapshot: RefCell::new(FormSnapshot::default()),
                broken: Cell::new(false),
                submit_enabled: Cell::new(false),
                progress: RefCell::new(Vec::new()),
                content: RefCell::new(None),
                error: RefCell::new(None),
                tables,
                fragment: RefCell::new(Vec::new()),
            }
        }

        fn fill(&self, name: &str, files: &[(&str, i64)]) {
            *self.snapshot.borrow_mut() = FormSnapshot {
                player_name: name.to_string(),
                files: files.iter().map(|(n, t)| SelectedFile::new(*n, *t, 100)).collect(),
            };
        }
    }

    impl FormView for FakeView {
        fn snapshot(&self) -> AppResult<FormSnapshot> {
            if self.broken.get() {
                return Err(AppError::Dom("missing element #inputReplays".into()));
            }
            Ok(self.snapshot.borrow().clone())
        }

        fn set_submit_enabled(&self, enabled: bool) {
            self.submit_enabled.set(enabled);
        }

        fn render_progress(&self, progress: ProgressDisplay) {
            self.progress.borrow_mut().push(progress.value);
        }

        fn replace_content(&self, html: &str) -> AppResult<()> {
            *self.content.borrow_mut() = Some(html.to_string());
            self.tables.replace(&self.fragment.borrow());
            Ok(())
        }

        fn show_error(&self, message: &str) {
            *self.error.borrow_mut() = Some(message.to_string());
        }

        fn clear_error(&self) {
            *self.error.borrow_mut() = None;
        }
    }

    /// Uploader answering from a script, or from a oneshot when held open.
    #[derive(Default)]
    struct FakeUploader {
        requests: RefCell<Vec<UploadPayload>>,
        progress_events: Vec<(f64, f64)>,
        response: RefCell<Option<AppResult<String>>>,
        pending: RefCell<Option<oneshot::Receiver<AppResult<String>>>>,
    }

    impl FakeUploader {
        fn answering(response: AppResult<String>) -> Self {
            Self {
                response: RefCell::new(Some(response)),
                ..Default::default()
            }
        }

        fn request_count(&self) -> usize {
            self.requests.borrow().len()
        }
    }

    impl Uploader for FakeUploader {
        fn upload<'a>(
            &'a self,
            payload: &'a UploadPayload,
            progress: ProgressSender,
        ) -> LocalBoxFuture<'a, AppResult<String>> {
            self.requests.borrow_mut().push(payload.clone());
            Box::pin(async move {
                for (loaded, total) in &self.progress_events {
                    progress.report(*loaded, *total);
                }
                let pending = self.pending.borrow_mut().take();
                if let Some(rx) = pending {
                    return rx.await.unwrap_or_else(|_| Err(AppError::Network("dropped".into())));
                }
                self.response
                    .borrow_mut()
                    .take()
                    .unwrap_or_else(|| Err(AppError::Network("no scripted response".into())))
            })
        }
    }

    type Controller = UploadFormController<FakeView, FakeUploader, Rc<FakeTables>>;

    fn controller(uploader: FakeUploader) -> Controller {
        let tables = Rc::new(FakeTables::default());
        UploadFormController::new(FakeView::new(tables.clone()), uploader, tables)
    }

    #[test]
    fn test_validate_follows_form() {
        let c = controller(FakeUploader::default());
        assert!(!c.validate());

        c.view().fill("Moon", &[]);
        assert!(!c.validate());
        assert!(!c.view().submit_enabled.get());

        c.view().fill("Moon", &[("a.w3g", 1000)]);
        assert!(c.validate());
        assert!(c.view().submit_enabled.get());

        c.view().fill("", &[("a.w3g", 1000)]);
        assert!(!c.validate());
    }

    #[test]
    fn test_empty_name_issues_no_request() {
        let c = controller(FakeUploader::answering(Ok(String::new())));
        c.view().fill("", &[("a.w3g", 1000)]);

        let result = block_on(c.submit());
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(c.uploader.request_count(), 0);
        assert!(!c.view().submit_enabled.get());
        assert_eq!(c.state(), UploadState::Idle);
    }

    #[test]
    fn test_successful_upload_renders_fragment_and_tables() {
        let mut uploader = FakeUploader::answering(Ok("<table id=\"replays\"></table>".into()));
        uploader.progress_events = vec![(0.0, 0.0), (50.0, 200.0), (200.0, 200.0)];
        let c = controller(uploader);
        c.view().fill("Moon", &[("a.w3g", 1000), ("b.w3g", 2000)]);
        *c.view().fragment.borrow_mut() = vec![
            (Some("summary"), TableKind::Simple),
            (Some("replays"), TableKind::Paginated),
        ];

        block_on(c.submit()).unwrap();

        let requests = c.uploader.requests.borrow();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].player_name, "Moon");
        assert_eq!(requests[0].dates.to_json(), r#"{"a.w3g":1000,"b.w3g":2000}"#);

        assert_eq!(*c.view().progress.borrow(), vec![0, 25, 100]);
        assert_eq!(c.view().content.borrow().as_deref(), Some("<table id=\"replays\"></table>"));

        let tables = &c.view().tables;
        let replays = tables.options_for("replays").unwrap();
        assert!(replays.paging && replays.searching);
        let summary = tables.options_for("summary").unwrap();
        assert!(!summary.paging && !summary.searching);

        assert_eq!(c.state(), UploadState::Idle);
        assert!(c.view().submit_enabled.get());
        assert!(c.view().error.borrow().is_none());
    }

    #[test]
    fn test_progress_restarts_on_each_submit() {
        let mut uploader = FakeUploader::answering(Ok(String::new()));
        uploader.progress_events = vec![(100.0, 100.0)];
        let c = controller(uploader);
        c.view().fill("Moon", &[("a.w3g", 1000)]);

        block_on(c.submit()).unwrap();
        *c.uploader.response.borrow_mut() = Some(Ok(String::new()));
        block_on(c.submit()).unwrap();

        assert_eq!(*c.view().progress.borrow(), vec![0, 100, 0, 100]);
    }

    #[test]
    fn test_failed_upload_reenables_and_reports() {
        let c = controller(FakeUploader::answering(Err(AppError::Server {
            status: 500,
            body: "Internal Server Error".into(),
        })));
        c.view().fill("Moon", &[("a.w3g", 1000)]);

        let result = block_on(c.submit());
        assert!(matches!(result, Err(AppError::Server { status: 500, .. })));
        assert!(c.view().content.borrow().is_none());
        assert!(c.view().error.borrow().as_deref().unwrap().contains("500"));
        assert!(c.view().submit_enabled.get());
        assert_eq!(c.state(), UploadState::Idle);
    }

    #[test]
    fn test_rejection_reason_from_server_is_shown() {
        let c = controller(FakeUploader::answering(Err(AppError::Server {
            status: 400,
            body: "Missing form field 'dates'".into(),
        })));
        c.view().fill("Moon", &[("a.w3g", 1000)]);

        assert!(block_on(c.submit()).is_err());
        assert_eq!(
            c.view().error.borrow().as_deref(),
            Some("Upload failed: Missing form field 'dates'")
        );
        assert!(c.view().submit_enabled.get());
    }

    #[test]
    fn test_unreadable_form_is_reported() {
        let c = controller(FakeUploader::answering(Ok(String::new())));
        c.view().fill("Moon", &[("a.w3g", 1000)]);
        c.view().broken.set(true);

        let result = block_on(c.submit());
        assert!(matches!(result, Err(AppError::Dom(_))));
        assert_eq!(c.uploader.request_count(), 0);
        assert_eq!(
            c.view().error.borrow().as_deref(),
            Some("Upload failed: the page is incomplete")
        );
        assert!(!c.view().submit_enabled.get());
        assert_eq!(c.state(), UploadState::Idle);
    }

    #[test]
    fn test_second_submit_while_uploading_is_rejected() {
        let (release, pending) = oneshot::channel();
        let uploader = FakeUploader::default();
        *uploader.pending.borrow_mut() = Some(pending);
        let c = controller(uploader);
        c.view().fill("Moon", &[("a.w3g", 1000)]);

        block_on(async {
            let first = c.submit();
            futures::pin_mut!(first);
            assert!(futures::poll!(first.as_mut()).is_pending());
            assert_eq!(c.state(), UploadState::Uploading);
            assert!(!c.view().submit_enabled.get());

            // Typing while uploading keeps the gate closed
            assert!(!c.validate());

            assert_eq!(c.submit().await, Err(AppError::UploadInProgress));
            assert_eq!(c.uploader.request_count(), 1);

            release.send(Ok(String::new())).unwrap();
            first.await.unwrap();
        });

        assert_eq!(c.state(), UploadState::Idle);
        assert!(c.view().submit_enabled.get());
    }

    #[test]
    fn test_initialize_tables_is_idempotent() {
        let c = controller(FakeUploader::default());
        c.view().tables.replace(&[(Some("summary"), TableKind::Simple)]);

        assert_eq!(c.initialize_tables().activated.len(), 1);
        let again = c.initialize_tables();
        assert!(again.activated.is_empty() && again.failed.is_empty());
        assert_eq!(c.view().tables.wrap_count(), 1);
    }

    #[test]
    fn test_refresh_rewraps_tables_reusing_ids() {
        let c = controller(FakeUploader::answering(Ok("first".into())));
        c.view().fill("Moon", &[("a.w3g", 1000)]);
        *c.view().fragment.borrow_mut() = vec![(Some("replays"), TableKind::Paginated)];

        block_on(c.submit()).unwrap();
        *c.uploader.response.borrow_mut() = Some(Ok("second".into()));
        block_on(c.submit()).unwrap();

        assert_eq!(c.view().tables.wrap_count(), 1);
        assert!(c.view().tables.options_for("replays").unwrap().paging);
    }
}
