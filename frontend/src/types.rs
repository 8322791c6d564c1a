//! Common types used across the frontend application.
//!
//! This module centralizes type definitions to avoid duplication
//! and ensure consistency across the controller and its DOM bindings.
//!
//! # Categories
//!
//! - **Form Types** - Snapshot of the upload form
//! - **State Types** - Upload lifecycle
//! - **Error Types** - Frontend error handling

use std::fmt;

// =============================================================================
// Form Types
// =============================================================================

/// A file picked in the replay input.
///
/// Mirrors the parts of the browser `File` object the upload needs.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectedFile {
    /// File name as reported by the browser
    pub name: String,
    /// Last-modified time, milliseconds since epoch
    pub last_modified: i64,
    /// Size in bytes
    pub size: u64,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, last_modified: i64, size: u64) -> Self {
        Self {
            name: name.into(),
            last_modified,
            size,
        }
    }
}

/// Current values of the upload form.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FormSnapshot {
    /// Raw value of the player name input
    pub player_name: String,
    /// Files currently selected
    pub files: Vec<SelectedFile>,
}

// =============================================================================
// State Types
// =============================================================================

/// Upload lifecycle of the controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UploadState {
    /// No request in flight
    #[default]
    Idle,
    /// A request has been sent and has not completed
    Uploading,
}

// =============================================================================
// Error Types
// =============================================================================

/// Frontend application errors.
///
/// Unified error type for all frontend operations.
#[derive(Clone, Debug, PartialEq)]
pub enum AppError {
    /// Form is not in a submittable state.
    Validation(String),
    /// A previous upload is still in flight.
    UploadInProgress,
    /// Request could not be sent or did not complete.
    Network(String),
    /// Server answered with a non-success status.
    Server { status: u16, body: String },
    /// Expected element or browser API missing.
    Dom(String),
    /// Table widget refused to initialize.
    Table(String),
}

impl AppError {
    /// Message shown to the user in the error region.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::UploadInProgress => "An upload is already in progress".to_string(),
            AppError::Network(_) => "Upload failed: the server could not be reached".to_string(),
            AppError::Server { status, body } => match server_reason(body) {
                Some(reason) => format!("Upload failed: {}", reason),
                None => format!("Upload failed: the server answered with status {}", status),
            },
            AppError::Dom(_) | AppError::Table(_) => "Upload failed: the page is incomplete".to_string(),
        }
    }
}

/// Longest response body shown verbatim as a rejection reason.
const MAX_REASON_LEN: usize = 300;

/// Plain-text reason carried by an error response body.
///
/// The upload endpoint answers rejections with a one-line text reason.
/// Markup (proxy or framework error pages) and oversized bodies are not
/// shown.
pub fn server_reason(body: &str) -> Option<&str> {
    let reason = body.trim();
    if reason.is_empty() || reason.starts_with('<') || reason.len() > MAX_REASON_LEN {
        return None;
    }
    Some(reason)
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "Validation error: {}", msg),
            AppError::UploadInProgress => write!(f, "Upload error: an upload is already in progress"),
            AppError::Network(msg) => write!(f, "Network error: {}", msg),
            AppError::Server { status, body } => write!(f, "Server error ({}): {}", status, body),
            AppError::Dom(msg) => write!(f, "DOM error: {}", msg),
            AppError::Table(msg) => write!(f, "Table error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Result type alias for frontend operations.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_idle() {
        assert_eq!(UploadState::default(), UploadState::Idle);
        assert!(FormSnapshot::default().files.is_empty());
    }

    #[test]
    fn test_server_error_shows_text_reason() {
        let err = AppError::Server { status: 400, body: "Missing form field 'dates'\n".into() };
        assert_eq!(err.to_string(), "Server error (400): Missing form field 'dates'\n");
        assert_eq!(err.user_message(), "Upload failed: Missing form field 'dates'");
    }

    #[test]
    fn test_server_error_hides_markup() {
        let err = AppError::Server {
            status: 502,
            body: "<html><body>Bad Gateway</body></html>".into(),
        };
        assert_eq!(err.user_message(), "Upload failed: the server answered with status 502");

        let err = AppError::Server { status: 500, body: "   ".into() };
        assert!(err.user_message().contains("500"));

        let err = AppError::Server { status: 500, body: "x".repeat(MAX_REASON_LEN + 1) };
        assert!(err.user_message().contains("500"));
    }
}
