//! Base64 codec and Data URI preview
//!
//! Text is always encoded over its UTF-8 bytes, so any string round-trips
//! through `encode_text` and `decode_text` unchanged.

pub mod data_uri;
pub mod text;

pub use data_uri::{inspect, DataUri, Inspection, Preview};
pub use text::{decode_bytes, decode_text, encode_bytes, encode_text};
