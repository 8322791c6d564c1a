//! HTTP API module.
//!
//! The axum server and the console logger it reports through.

pub mod server;
pub mod logs;

pub use server::{router, start_server};
pub use logs::*;
