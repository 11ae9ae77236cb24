//! UTF-8 safe Base64 text encoding
//!
//! Decoding is forgiving in the same places a browser's `atob` is: ASCII
//! whitespace is ignored and missing `=` padding is restored before decoding.

use crate::error::{B64Error, B64Result};
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::{DecodePaddingMode, Engine};

/// Standard alphabet, canonical padding, non-zero trailing bits tolerated
const FORGIVING: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::RequireCanonical),
);

/// Encode text as padded standard Base64 over its UTF-8 bytes
pub fn encode_text(text: &str) -> String {
    encode_bytes(text.as_bytes())
}

/// Encode raw bytes as padded standard Base64
pub fn encode_bytes(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode Base64 into raw bytes
pub fn decode_bytes(input: &str) -> B64Result<Vec<u8>> {
    let normalized = normalize(input);
    FORGIVING
        .decode(normalized.as_bytes())
        .map_err(|e| B64Error::InvalidBase64(e.to_string()))
}

/// Decode Base64 into UTF-8 text
pub fn decode_text(input: &str) -> B64Result<String> {
    let bytes = decode_bytes(input)?;
    String::from_utf8(bytes).map_err(|_| B64Error::InvalidUtf8)
}

/// Strip ASCII whitespace and pad with `=` to a multiple of four
fn normalize(input: &str) -> String {
    let mut out: String = input
        .trim()
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let missing = (4 - out.len() % 4) % 4;
    out.extend(std::iter::repeat('=').take(missing));
    out
}
