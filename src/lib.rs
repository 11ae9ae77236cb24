//! b64shell - Base64 utility with an offline app-shell cache
//!
//! Encodes and decodes Base64 text and Data URIs, and models the versioned
//! offline cache that keeps the app usable without a network: cache-first
//! fetches, per-version stores, and the install/activate/skip-waiting
//! lifecycle.

pub mod cache;
pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod net;
pub mod ui;
pub mod worker;

pub use error::{B64Error, B64Result};
