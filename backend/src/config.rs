//! Server configuration.
//!
//! Values come from the `serve` command line, with `WC3STATS_*` environment
//! variables (optionally from a `.env` file) as fallback.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::error::{ServerError, ServerResult};

/// Default listening port.
pub const DEFAULT_PORT: u16 = 5000;

/// Default directory holding the compiled frontend bundle.
pub const DEFAULT_STATIC_DIR: &str = "frontend/pkg";

/// Default request body limit, in megabytes.
pub const DEFAULT_MAX_UPLOAD_MB: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Served under `/pkg`
    pub static_dir: PathBuf,
    /// Maximum size of an upload request body
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    pub fn new(host: IpAddr, port: u16, static_dir: PathBuf, max_upload_mb: usize) -> ServerResult<Self> {
        if max_upload_mb == 0 {
            return Err(ServerError::Config("max upload size must be at least 1 MB".to_string()));
        }
        let max_upload_bytes = max_upload_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| ServerError::Config(format!("max upload size {} MB is too large", max_upload_mb)))?;
        Ok(Self {
            host,
            port,
            static_dir,
            max_upload_bytes,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: DEFAULT_PORT,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
        }
    }
}
