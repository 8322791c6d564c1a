//! # wc3stats - Warcraft III replay statistics
//!
//! The server behind the replay upload page. A player picks `.w3g` files in
//! the browser, the frontend posts them together with each file's
//! last-modified time, and the server answers with an HTML fragment of
//! statistics tables over the named player's ladder 1on1 games.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  multipart  │────▶│   Upload    │────▶│   Replay    │────▶│    Stats    │────▶│   Render    │
//! │ (form+w3g)  │     │ (form+dates)│     │(header+data)│     │ (win/loss)  │     │ (fragment)  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per concern
//! - [`models`] - Replay headers, game data and player summaries
//! - [`replay`] - `.w3g` decoding: header, zlib blocks, startup records
//! - [`stats`] - Win/loss aggregates per race, matchup, map and length
//! - [`upload`] - Upload form validation and processing
//! - [`render`] - Upload page and HTML fragments
//! - [`config`] - Server configuration
//! - [`api`] - HTTP server and console logging

// Core modules
pub mod error;
pub mod models;

// Decoding
pub mod replay;
pub mod stats;

// Upload handling
pub mod upload;

// HTML
pub mod render;

// HTTP API
pub mod config;
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ReplayError,
    ReplayResult,
    StatsError,
    StatsResult,
    UploadError,
    UploadResult,
    ServerError,
    ServerResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    Product,
    GameMode,
    ReplayHeader,
    Race,
    GameType,
    PlayerRecord,
    SlotRecord,
    GameInfo,
    Replay,
    PlayerGame,
    ReplaySummary,
    SkippedReplay,
    PlayerSummary,
};

// =============================================================================
// Re-exports - Replay decoding
// =============================================================================

pub use replay::{parse_header, parse_replay, read_replay_file, map_name, format_length};

// =============================================================================
// Re-exports - Statistics
// =============================================================================

pub use stats::{compute_stats, player_game, LengthBucket, RaceStats, WinLoss};

// =============================================================================
// Re-exports - Upload
// =============================================================================

pub use upload::{
    process_upload,
    summarize,
    UploadForm,
    UploadFormBuilder,
    UploadReport,
};

// =============================================================================
// Re-exports - Server
// =============================================================================

pub use config::ServerConfig;
pub use api::{router, start_server};
