//! Browser bindings for the controller.
//!
//! - [`DomFormView`] reads the form and updates the page through `web-sys`
//! - [`XhrUploader`] posts the form with `XMLHttpRequest` so upload progress
//!   is observable (fetch has no upload progress events)
//! - [`DataTables`] drives jQuery DataTables through `src/js/tables.js`
//!
//! [`mount`] wires the page events to an [`UploadFormController`].

use futures::future::LocalBoxFuture;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{
    Document, Element, Event, EventTarget, FormData, HtmlElement, HtmlFormElement,
    HtmlInputElement, ProgressEvent, XmlHttpRequest,
};

use crate::config::{
    CONTENT_CONTAINER_ID, ERROR_REGION_ID, NAME_INPUT_ID, PROGRESS_BAR_ID, REPLAYS_INPUT_ID,
    SUBMIT_BUTTON_ID, UPLOAD_ENDPOINT,
};
use crate::controller::UploadFormController;
use crate::payload::UploadPayload;
use crate::progress::{ProgressDisplay, ProgressSender};
use crate::tables::{TableElement, TableKind, TableOptions, TableWidget};
use crate::types::{AppError, AppResult, FormSnapshot, SelectedFile};
use crate::view::{FormView, Uploader};

/// Controller wired to the real page.
pub type PageController = UploadFormController<DomFormView, XhrUploader, DataTables>;

// =============================================================================
// Helpers
// =============================================================================

/// Best-effort message from a thrown JavaScript value.
fn js_message(value: &JsValue) -> String {
    js_sys::Reflect::get(value, &"message".into())
        .ok()
        .and_then(|v| v.as_string())
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{:?}", value))
}

fn element(document: &Document, id: &str) -> AppResult<Element> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| AppError::Dom(format!("missing element #{}", id)))
}

fn input(document: &Document, id: &str) -> AppResult<HtmlInputElement> {
    element(document, id)?
        .dyn_into::<HtmlInputElement>()
        .map_err(|_| AppError::Dom(format!("#{} is not an input", id)))
}

fn replays_form(document: &Document) -> AppResult<HtmlFormElement> {
    input(document, REPLAYS_INPUT_ID)?
        .form()
        .ok_or_else(|| AppError::Dom(format!("#{} is not inside a form", REPLAYS_INPUT_ID)))
}

// =============================================================================
// Form view
// =============================================================================

pub struct DomFormView {
    document: Document,
}

impl DomFormView {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    fn error_region(&self) -> Option<HtmlElement> {
        self.document
            .get_element_by_id(ERROR_REGION_ID)
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
    }
}

impl FormView for DomFormView {
    fn snapshot(&self) -> AppResult<FormSnapshot> {
        let player_name = input(&self.document, NAME_INPUT_ID)?.value();

        let mut files = Vec::new();
        if let Some(list) = input(&self.document, REPLAYS_INPUT_ID)?.files() {
            for i in 0..list.length() {
                if let Some(file) = list.get(i) {
                    files.push(SelectedFile::new(
                        file.name(),
                        file.last_modified() as i64,
                        file.size() as u64,
                    ));
                }
            }
        }

        Ok(FormSnapshot { player_name, files })
    }

    fn set_submit_enabled(&self, enabled: bool) {
        let Ok(button) = element(&self.document, SUBMIT_BUTTON_ID) else {
            log::warn!("No #{} to gate", SUBMIT_BUTTON_ID);
            return;
        };
        let result = if enabled {
            button.remove_attribute("disabled")
        } else {
            button.set_attribute("disabled", "true")
        };
        if let Err(e) = result {
            log::warn!("Failed to toggle #{}: {}", SUBMIT_BUTTON_ID, js_message(&e));
        }
    }

    fn render_progress(&self, progress: ProgressDisplay) {
        let Ok(bar) = element(&self.document, PROGRESS_BAR_ID) else {
            return;
        };
        let _ = bar.set_attribute("aria-valuenow", &progress.aria_value());
        if let Some(html) = bar.dyn_ref::<HtmlElement>() {
            let _ = html.style().set_property("width", &progress.width());
        }
        bar.set_text_content(Some(progress.label().as_str()));
    }

    fn replace_content(&self, html: &str) -> AppResult<()> {
        element(&self.document, CONTENT_CONTAINER_ID)?.set_inner_html(html);
        Ok(())
    }

    fn show_error(&self, message: &str) {
        match self.error_region() {
            Some(region) => {
                region.set_text_content(Some(message));
                region.set_hidden(false);
            }
            None => log::error!("{}", message),
        }
    }

    fn clear_error(&self) {
        if let Some(region) = self.error_region() {
            region.set_text_content(None);
            region.set_hidden(true);
        }
    }
}

// =============================================================================
// Uploader
// =============================================================================

pub struct XhrUploader {
    document: Document,
    endpoint: String,
}

impl XhrUploader {
    pub fn new(document: Document, endpoint: impl Into<String>) -> Self {
        Self {
            document,
            endpoint: endpoint.into(),
        }
    }

    /// Form fields and attachments, with the payload's text fields set on top.
    fn form_data(&self, payload: &UploadPayload) -> AppResult<FormData> {
        let form = replays_form(&self.document)?;
        let data = FormData::new_with_form(&form)
            .map_err(|e| AppError::Dom(format!("Failed to create FormData: {}", js_message(&e))))?;
        for (field, value) in payload.text_fields() {
            data.set_with_str(field, &value)
                .map_err(|e| AppError::Dom(format!("Failed to set {}: {}", field, js_message(&e))))?;
        }
        Ok(data)
    }

    async fn send(&self, payload: &UploadPayload, progress: ProgressSender) -> AppResult<String> {
        let data = self.form_data(payload)?;
        let network = |e: JsValue| AppError::Network(js_message(&e));

        let xhr = XmlHttpRequest::new().map_err(network)?;
        xhr.open("POST", &self.endpoint).map_err(network)?;

        let on_progress = Closure::<dyn FnMut(ProgressEvent)>::new(move |ev: ProgressEvent| {
            if ev.length_computable() {
                progress.report(ev.loaded(), ev.total());
            }
        });
        let upload = xhr.upload().map_err(network)?;
        upload
            .add_event_listener_with_callback("progress", on_progress.as_ref().unchecked_ref())
            .map_err(network)?;

        // Handlers must outlive the request; they are dropped below.
        let mut handlers: Vec<Closure<dyn FnMut(Event)>> = Vec::new();
        let done = js_sys::Promise::new(&mut |resolve, reject| {
            let on_load = Closure::<dyn FnMut(Event)>::new(move |_ev: Event| {
                let _ = resolve.call0(&JsValue::UNDEFINED);
            });
            xhr.set_onload(Some(on_load.as_ref().unchecked_ref()));

            let reject_abort = reject.clone();
            let on_error = Closure::<dyn FnMut(Event)>::new(move |_ev: Event| {
                let _ = reject.call1(&JsValue::UNDEFINED, &JsValue::from_str("request failed"));
            });
            xhr.set_onerror(Some(on_error.as_ref().unchecked_ref()));

            let on_abort = Closure::<dyn FnMut(Event)>::new(move |_ev: Event| {
                let _ = reject_abort.call1(&JsValue::UNDEFINED, &JsValue::from_str("request aborted"));
            });
            xhr.set_onabort(Some(on_abort.as_ref().unchecked_ref()));

            handlers.extend([on_load, on_error, on_abort]);
        });

        xhr.send_with_opt_form_data(Some(&data)).map_err(network)?;
        let outcome = JsFuture::from(done).await;

        let _ = upload.remove_event_listener_with_callback("progress", on_progress.as_ref().unchecked_ref());
        xhr.set_onload(None);
        xhr.set_onerror(None);
        xhr.set_onabort(None);
        drop(handlers);
        drop(on_progress);

        outcome.map_err(network)?;

        let status = xhr.status().map_err(network)?;
        let body = xhr.response_text().ok().flatten().unwrap_or_default();
        if (200..300).contains(&status) {
            Ok(body)
        } else {
            Err(AppError::Server { status, body })
        }
    }
}

impl Uploader for XhrUploader {
    fn upload<'a>(
        &'a self,
        payload: &'a UploadPayload,
        progress: ProgressSender,
    ) -> LocalBoxFuture<'a, AppResult<String>> {
        Box::pin(self.send(payload, progress))
    }
}

// =============================================================================
// Table widget
// =============================================================================

/// DataTables bridge, see `src/js/tables.js`.
#[wasm_bindgen(module = "/src/js/tables.js")]
extern "C" {
    #[wasm_bindgen(js_name = "isDataTable", catch)]
    fn is_data_table(selector: &str) -> Result<bool, JsValue>;

    #[wasm_bindgen(js_name = "activateDataTable", catch)]
    fn activate_data_table(selector: &str, options: JsValue) -> Result<(), JsValue>;
}

pub struct DataTables {
    document: Document,
}

impl DataTables {
    pub fn new(document: Document) -> Self {
        Self { document }
    }
}

impl TableWidget for DataTables {
    fn find_tables(&self, kind: TableKind) -> Vec<TableElement> {
        let found = self.document.get_elements_by_class_name(kind.css_class());
        (0..found.length())
            .filter_map(|i| found.item(i))
            .map(|el| {
                let id = el.id();
                TableElement {
                    id: (!id.is_empty()).then_some(id),
                    kind,
                }
            })
            .collect()
    }

    fn is_table(&self, id: &str) -> bool {
        is_data_table(&format!("#{}", id)).unwrap_or_else(|e| {
            log::warn!("DataTables unavailable: {}", js_message(&e));
            false
        })
    }

    fn activate(&self, id: &str, options: &TableOptions) -> AppResult<()> {
        let options = serde_wasm_bindgen::to_value(options)
            .map_err(|e| AppError::Table(format!("Failed to convert options: {}", e)))?;
        activate_data_table(&format!("#{}", id), options)
            .map_err(|e| AppError::Table(js_message(&e)))
    }
}

// =============================================================================
// Wiring
// =============================================================================

/// Attach a handler for the lifetime of the page.
fn listen(target: &EventTarget, event: &str, handler: impl FnMut(Event) + 'static) -> AppResult<()> {
    let closure = Closure::<dyn FnMut(Event)>::new(handler);
    target
        .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
        .map_err(|e| AppError::Dom(format!("Failed to listen for {}: {}", event, js_message(&e))))?;
    closure.forget();
    Ok(())
}

/// Wire the server-rendered form to a new controller.
pub fn mount() -> AppResult<Rc<PageController>> {
    let document = gloo_utils::document();

    let controller = Rc::new(UploadFormController::new(
        DomFormView::new(document.clone()),
        XhrUploader::new(document.clone(), UPLOAD_ENDPOINT),
        DataTables::new(document.clone()),
    ));

    let report = controller.initialize_tables();
    log::info!("Tables ready: {} activated", report.activated.len());
    controller.validate();

    let name_input = element(&document, NAME_INPUT_ID)?;
    let c = controller.clone();
    listen(&name_input, "input", move |_ev| {
        c.validate();
    })?;

    let replays_input = element(&document, REPLAYS_INPUT_ID)?;
    let c = controller.clone();
    listen(&replays_input, "change", move |ev| {
        ev.prevent_default();
        c.validate();
    })?;

    let form = replays_form(&document)?;
    let c = controller.clone();
    listen(&form, "submit", move |ev| {
        ev.prevent_default();
        let c = c.clone();
        spawn_local(async move {
            if let Err(e) = c.submit().await {
                log::warn!("Submit not completed: {}", e);
            }
        });
    })?;

    log::info!("Upload form mounted");
    Ok(controller)
}
