//! Error types for the wc3stats server.
//!
//! This module defines one error type per concern:
//!
//! - [`ReplayError`] - `.w3g` decoding errors
//! - [`StatsError`] - Replays that cannot count towards a player's statistics
//! - [`UploadError`] - Malformed upload requests
//! - [`ServerError`] - Startup and serving errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Replay Errors
// =============================================================================

/// Errors while decoding a replay.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// Failed to read file.
    #[error("Failed to read replay: {0}")]
    IoError(#[from] std::io::Error),

    /// File does not start with the replay magic.
    #[error("Not a Warcraft III replay")]
    BadMagic,

    /// File ends before the header does.
    #[error("Replay truncated: need {needed} bytes, got {got}")]
    Truncated { needed: usize, got: usize },

    /// Header version other than 0 or 1.
    #[error("Unsupported header version {0}")]
    UnsupportedVersion(u32),

    /// Product id is not ASCII.
    #[error("Invalid product id {0:?}")]
    InvalidProduct([u8; 4]),

    /// A data block failed to inflate.
    #[error("Block {block} could not be decompressed: {message}")]
    Decompress { block: usize, message: String },

    /// A data block inflated to another size than announced.
    #[error("Block {block} decompressed to {got} bytes, expected {expected}")]
    BlockSize { block: usize, expected: usize, got: usize },

    /// Unexpected content in the decompressed game data.
    #[error("Malformed game data at offset {offset:#x}: {message}")]
    Malformed { offset: usize, message: String },
}

// =============================================================================
// Statistics Errors
// =============================================================================

/// Why a decoded replay is left out of a player's statistics.
#[derive(Debug, Error, PartialEq)]
pub enum StatsError {
    /// Only ladder 1on1 games are counted.
    #[error("Not a ladder 1on1 game ({0})")]
    NotLadder1v1(String),

    /// Named player has no record in the game.
    #[error("{0} did not play in this game")]
    PlayerAbsent(String),

    /// Leave events do not tell who won.
    #[error("Winner could not be found")]
    NoWinner,
}

// =============================================================================
// Upload Errors
// =============================================================================

/// Errors in an upload request. Rendered back to the client as a 400.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Multipart body could not be read.
    #[error("Malformed upload: {0}")]
    Multipart(String),

    /// Required form field absent.
    #[error("Missing form field '{0}'")]
    MissingField(&'static str),

    /// `dates` is not a JSON object of integer timestamps.
    #[error("Invalid dates field: {0}")]
    InvalidDates(String),

    /// Request body over the configured limit.
    #[error("Upload too large")]
    TooLarge,
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Socket or filesystem error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for replay decoding.
pub type ReplayResult<T> = Result<T, ReplayError>;

/// Result type for per-player statistics.
pub type StatsResult<T> = Result<T, StatsError>;

/// Result type for upload handling.
pub type UploadResult<T> = Result<T, UploadError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncated_message() {
        let err = ReplayError::Truncated { needed: 68, got: 10 };
        let msg = err.to_string();
        assert!(msg.contains("68"));
        assert!(msg.contains("10"));
    }

    #[test]
    fn test_malformed_offset_is_hex() {
        let err = ReplayError::Malformed { offset: 0x2a, message: "expected slot table".into() };
        assert_eq!(err.to_string(), "Malformed game data at offset 0x2a: expected slot table");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken");
        let err: ServerError = io.into();
        assert!(err.to_string().contains("port taken"));
    }
}
