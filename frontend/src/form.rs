//! Submit gate for the upload form.
//!
//! The submit control is enabled only when a player name is typed and at
//! least one replay is selected. The gate is recomputed from the live form on
//! every input or change event.

use crate::types::{FormSnapshot, UploadState};

/// Returns `true` when a form with this name and file count may be submitted.
///
/// Any non-empty name counts, whitespace included.
pub fn is_submittable(player_name: &str, file_count: usize) -> bool {
    !player_name.is_empty() && file_count > 0
}

/// Gate for a snapshot, closed while an upload is in flight.
pub fn submit_enabled(snapshot: &FormSnapshot, state: UploadState) -> bool {
    state == UploadState::Idle && is_submittable(&snapshot.player_name, snapshot.files.len())
}

/// Reason shown when a closed gate rejects a submission.
pub fn rejection_reason(snapshot: &FormSnapshot) -> Option<&'static str> {
    match (snapshot.player_name.is_empty(), snapshot.files.is_empty()) {
        (true, true) => Some("Enter a player name and select at least one replay"),
        (true, false) => Some("Enter a player name"),
        (false, true) => Some("Select at least one replay"),
        (false, false) => None,
    }
}
