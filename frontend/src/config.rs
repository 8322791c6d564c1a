//! Application configuration.
//!
//! Centralized configuration for the upload form controller. The markup is
//! rendered by the server, so these names must match the page it serves.

/// Endpoint receiving the multipart replay upload.
pub const UPLOAD_ENDPOINT: &str = "/upload";

/// Text input holding the player name.
pub const NAME_INPUT_ID: &str = "inputName";

/// File input holding the selected replays.
pub const REPLAYS_INPUT_ID: &str = "inputReplays";

/// Submit control gated by [`crate::form::is_submittable`].
pub const SUBMIT_BUTTON_ID: &str = "btnSubmit";

/// Progress indicator updated during the upload.
pub const PROGRESS_BAR_ID: &str = "progressBar";

/// Region replaced by the HTML fragment returned from the server.
pub const CONTENT_CONTAINER_ID: &str = "bodyContainer";

/// Region showing upload failures.
pub const ERROR_REGION_ID: &str = "uploadError";

/// Form field overridden with the current player name.
pub const PLAYER_NAME_FIELD: &str = "playerName";

/// Form field carrying the JSON map of file name to last-modified time.
pub const DATES_FIELD: &str = "dates";

/// Class marking tables without paging, search or info.
pub const SIMPLE_TABLE_CLASS: &str = "datatable";

/// Class marking tables with paging and search.
pub const PAGINATED_TABLE_CLASS: &str = "datatablePaging";
