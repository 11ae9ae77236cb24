//! Data URI parsing and preview classification

use super::text::{decode_text, encode_bytes};
use serde::Serialize;
use std::fmt;

const SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// A `data:<mime>;base64,<payload>` URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    /// Media type, including any parameters before `;base64`
    pub mime: String,
    /// Base64 payload as written
    pub payload: String,
}

impl DataUri {
    /// Parse a Base64 Data URI
    ///
    /// Only single-line input is recognised, and the media type must be
    /// non-empty. The media type ends at the first `;base64,`.
    pub fn parse(input: &str) -> Option<Self> {
        if input.contains(['\n', '\r']) {
            return None;
        }
        let rest = input.strip_prefix(SCHEME)?;
        let (mime, payload) = rest.split_once(BASE64_MARKER)?;
        if mime.is_empty() {
            return None;
        }
        Some(Self {
            mime: mime.to_string(),
            payload: payload.to_string(),
        })
    }

    /// Build a Data URI from raw bytes
    pub fn encode(mime: &str, bytes: &[u8]) -> Self {
        Self {
            mime: mime.to_string(),
            payload: encode_bytes(bytes),
        }
    }

    /// Label shown when the content is not rendered as text
    pub fn label(&self) -> String {
        format!("[Previewable Data URI: {}]", self.mime)
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}{}", SCHEME, self.mime, BASE64_MARKER, self.payload)
    }
}

/// How a Data URI would be previewed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum Preview {
    /// `image/*`, rendered as an image
    Image,
    /// Exactly `text/html`, rendered in a sandboxed frame
    Html,
    /// `application/pdf`, rendered in a frame
    Pdf,
    /// Other `text/*`, rendered as decoded text
    Text(String),
    /// `text/*` whose payload failed to decode
    TextUndecodable,
    /// No preview for this media type
    Unsupported(String),
}

impl Preview {
    /// Classify a parsed Data URI
    pub fn classify(uri: &DataUri) -> Self {
        let mime = uri.mime.as_str();
        if mime.starts_with("image/") {
            Self::Image
        } else if mime == "text/html" {
            Self::Html
        } else if mime == "application/pdf" {
            Self::Pdf
        } else if mime.starts_with("text/") {
            match decode_text(&uri.payload) {
                Ok(text) => Self::Text(text),
                Err(_) => Self::TextUndecodable,
            }
        } else {
            Self::Unsupported(uri.mime.clone())
        }
    }
}

/// Result of inspecting user input in the decode direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inspection {
    /// Nothing to decode
    Empty,
    /// A Data URI; `text` is the decoded payload for `text/*` types
    DataUri { uri: DataUri, text: Option<String> },
    /// Plain Base64 decoded to text
    Text(String),
    /// Input was neither a Data URI nor valid Base64 text
    Invalid(String),
}

impl Inspection {
    /// Text to display for this inspection
    pub fn display_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::DataUri { uri, text } => text.clone().unwrap_or_else(|| uri.label()),
            Self::Text(text) => text.clone(),
            Self::Invalid(_) => String::new(),
        }
    }
}

/// Inspect Base64 or Data URI input
///
/// Data URIs are never decoded as plain Base64. Their text payload is only
/// decoded when the media type is `text/*`.
pub fn inspect(input: &str) -> Inspection {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Inspection::Empty;
    }

    if let Some(uri) = DataUri::parse(trimmed) {
        let text = if uri.mime.starts_with("text/") {
            decode_text(&uri.payload).ok()
        } else {
            None
        };
        return Inspection::DataUri { uri, text };
    }

    match decode_text(trimmed) {
        Ok(text) => Inspection::Text(text),
        Err(_) => Inspection::Invalid("Invalid Base64 string".to_string()),
    }
}
