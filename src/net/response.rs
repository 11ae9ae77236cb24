//! Responses returned by the network or the cache

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Response type, as the fetch handler classifies it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    /// Same-origin response, fully readable
    Basic,
    /// Cross-origin response allowed by CORS
    Cors,
    /// Cross-origin response with no readable content
    Opaque,
    /// Network error placeholder
    Error,
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Basic => "basic",
            Self::Cors => "cors",
            Self::Opaque => "opaque",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// An HTTP response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// URL the response was produced for
    pub url: String,
    pub status: u16,
    pub status_text: String,
    /// Header names are lower-cased
    pub headers: BTreeMap<String, String>,
    #[serde(with = "body_base64")]
    pub body: Vec<u8>,
    pub kind: ResponseKind,
}

impl Response {
    /// Create a basic response with no headers
    pub fn new(url: impl Into<String>, status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            url: url.into(),
            status,
            status_text: String::new(),
            headers: BTreeMap::new(),
            body: body.into(),
            kind: ResponseKind::Basic,
        }
    }

    /// Set a header (name is lower-cased)
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Set the response type
    pub fn with_kind(mut self, kind: ResponseKind) -> Self {
        self.kind = kind;
        self
    }

    /// Whether the status is in the 2xx range
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Only a plain `200` same-origin response is stored opportunistically
    pub fn is_cacheable(&self) -> bool {
        self.status == 200 && self.kind == ResponseKind::Basic
    }

    /// `content-type` header, if any
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }

    /// Body as UTF-8 text, if it is valid UTF-8
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    /// Approximate storage footprint in bytes
    pub fn size(&self) -> u64 {
        let headers: usize = self.headers.iter().map(|(k, v)| k.len() + v.len()).sum();
        (self.body.len() + headers + self.url.len()) as u64
    }
}

/// Store bodies as Base64 strings in JSON
mod body_base64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(body: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(body))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded.as_bytes()).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cacheable_requires_200_and_basic() {
        let ok = Response::new("http://a.test/", 200, "x");
        assert!(ok.is_cacheable());

        assert!(!Response::new("http://a.test/", 204, "").is_cacheable());
        assert!(!Response::new("http://a.test/", 404, "").is_cacheable());
        assert!(!ok.clone().with_kind(ResponseKind::Cors).is_cacheable());
        assert!(!ok.with_kind(ResponseKind::Opaque).is_cacheable());
    }

    #[test]
    fn headers_are_lowercased() {
        let resp = Response::new("http://a.test/", 200, "").with_header("Content-Type", "text/css");
        assert_eq!(resp.content_type(), Some("text/css"));
    }

    #[test]
    fn body_serializes_as_base64() {
        let resp = Response::new("http://a.test/", 200, vec![0u8, 159, 146, 150]);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["body"], "AJ+Slg==");
        assert_eq!(json["kind"], "basic");

        let parsed: Response = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, resp);
    }

    #[test]
    fn text_rejects_binary() {
        assert_eq!(Response::new("u", 200, "hi").text(), Some("hi"));
        assert_eq!(Response::new("u", 200, vec![0xff]).text(), None);
    }
}
