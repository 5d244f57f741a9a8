#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

mod backend;
mod config;
mod endpoint;
mod envelope;
mod error;
mod transfer;

pub use backend::HttpBackend;
pub use config::{BackendConfig, DEFAULT_API_URL};
pub use transfer::HttpTransfer;

// Silence unused dev-dependency warnings (used by integration tests)
#[cfg(test)]
use axum as _;
#[cfg(test)]
use tempfile as _;
