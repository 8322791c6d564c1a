//! wc3stats - Replay upload form controller
//!
//! A WebAssembly library attached to the server-rendered upload page. It
//! gates the submit button, posts replays with their last-modified dates,
//! shows upload progress, and swaps in the statistics returned by the server.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  dom (web-sys)                                               │
//! │  DomFormView · XhrUploader · DataTables · mount()            │
//! ├──────────────────────────────────────────────────────────────┤
//! │  controller: UploadFormController                            │
//! │  validate() · submit() · initialize_tables()                 │
//! ├──────────────────────────────────────────────────────────────┤
//! │  form · payload · progress · tables · types                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`config`] - Element ids, field names, endpoint
//! - [`types`] - Common types (SelectedFile, FormSnapshot, AppError)
//! - [`form`] - Submit gate
//! - [`payload`] - Multipart text fields (`playerName`, `dates`)
//! - [`progress`] - Percentages and the progress stream
//! - [`tables`] - Table widget options and the activation registry
//! - [`view`] - Traits between the controller and the browser
//! - [`controller`] - Upload lifecycle
//! - [`dom`] - Browser implementations and event wiring

use wasm_bindgen::prelude::*;

// =============================================================================
// Module declarations
// =============================================================================

pub mod config;
pub mod types;
pub mod form;
pub mod payload;
pub mod progress;
pub mod tables;
pub mod view;
pub mod controller;
pub mod dom;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::*;

pub use types::{
    // Form
    FormSnapshot, SelectedFile,
    // State
    UploadState,
    // Errors
    AppError, AppResult,
};

pub use controller::UploadFormController;
pub use payload::{ReplayDates, UploadPayload};
pub use progress::{percent, ProgressDisplay};
pub use tables::{TableKind, TableOptions, TableRegistry, TableWidget};
pub use view::{FormView, Uploader};

// =============================================================================
// Application Entry Point
// =============================================================================

/// WASM entry point - called automatically once the bundle loads.
#[wasm_bindgen(start)]
pub fn main() {
    // Setup panic hook for better error messages
    console_error_panic_hook::set_once();

    // Setup console logging
    _ = console_log::init_with_level(log::Level::Debug);

    log::info!("wc3stats upload form starting");

    if let Err(e) = dom::mount() {
        log::error!("Upload form not mounted: {}", e);
    }
}
