//! Request identity and fetch destinations

use crate::error::{B64Error, B64Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::{Origin, Url};

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Canonical upper-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "HEAD" => Ok(Self::Head),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            other => Err(format!("unsupported HTTP method '{other}'")),
        }
    }
}

/// What the fetched resource will be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    /// Top-level navigation
    Document,
    Style,
    Script,
    Image,
    Font,
    Manifest,
    /// Programmatic fetch with no specific destination
    Empty,
}

impl Destination {
    /// Guess a subresource destination from the URL path's extension
    ///
    /// Navigations are never inferred: a document request has to be marked
    /// with [`Request::with_destination`]. Extensionless paths are `Empty`.
    pub fn infer(url: &Url) -> Self {
        let file = url.path().rsplit('/').next().unwrap_or_default();
        let Some((_, ext)) = file.rsplit_once('.') else {
            return Self::Empty;
        };

        match ext.to_ascii_lowercase().as_str() {
            "css" => Self::Style,
            "js" | "mjs" => Self::Script,
            "png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" | "ico" | "avif" => Self::Image,
            "woff" | "woff2" | "ttf" | "otf" => Self::Font,
            "webmanifest" => Self::Manifest,
            "json" if file == "manifest.json" => Self::Manifest,
            _ => Self::Empty,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Document => "document",
            Self::Style => "style",
            Self::Script => "script",
            Self::Image => "image",
            Self::Font => "font",
            Self::Manifest => "manifest",
            Self::Empty => "empty",
        };
        f.write_str(name)
    }
}

/// An outgoing request as seen by the fetch handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub destination: Destination,
}

impl Request {
    /// Create a request with a subresource destination inferred from the URL
    pub fn new(method: Method, url: Url) -> Self {
        let destination = Destination::infer(&url);
        Self {
            method,
            url,
            destination,
        }
    }

    /// GET request with inferred destination
    pub fn get(url: Url) -> Self {
        Self::new(Method::Get, url)
    }

    /// Parse an absolute URL into a request
    pub fn parse(method: Method, url: &str) -> B64Result<Self> {
        let url = Url::parse(url).map_err(|e| B64Error::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::new(method, url))
    }

    /// Override the destination
    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    /// Whether this is a top-level navigation
    pub fn is_document(&self) -> bool {
        self.destination == Destination::Document
    }

    /// Whether the request targets the given origin
    pub fn is_same_origin(&self, origin: &Origin) -> bool {
        &self.url.origin() == origin
    }

    /// Cache identity of this request
    pub fn key(&self) -> RequestKey {
        RequestKey::new(self.method, &self.url)
    }
}

/// Request identity used as the cache key: method plus absolute URL
///
/// Fragments never reach the network, so they are not part of the identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestKey {
    pub method: Method,
    pub url: String,
}

impl RequestKey {
    /// Build the identity for a method and URL
    pub fn new(method: Method, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self {
            method,
            url: url.to_string(),
        }
    }

    /// String form used as the store map key
    pub fn as_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn method_parse_case_insensitive() {
        assert_eq!("get".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("Post".parse::<Method>().unwrap(), Method::Post);
        assert!("TRACE".parse::<Method>().is_err());
    }

    #[test]
    fn destination_inference() {
        assert_eq!(Destination::infer(&url("http://a.test/")), Destination::Empty);
        assert_eq!(Destination::infer(&url("http://a.test/api/items")), Destination::Empty);
        assert_eq!(Destination::infer(&url("http://a.test/index.html")), Destination::Empty);
        assert_eq!(Destination::infer(&url("http://a.test/app.css")), Destination::Style);
        assert_eq!(Destination::infer(&url("http://a.test/manifest.json")), Destination::Manifest);
        assert_eq!(Destination::infer(&url("http://a.test/data.json")), Destination::Empty);
        assert_eq!(Destination::infer(&url("http://a.test/logo.SVG")), Destination::Image);
    }

    #[test]
    fn document_must_be_explicit() {
        let request = Request::get(url("http://a.test/settings"));
        assert!(!request.is_document());
        assert!(request.with_destination(Destination::Document).is_document());
    }

    #[test]
    fn same_origin_requires_scheme_host_and_port() {
        let origin = url("http://localhost:3000/").origin();
        assert!(Request::get(url("http://localhost:3000/a.css")).is_same_origin(&origin));
        assert!(!Request::get(url("http://localhost:3001/a.css")).is_same_origin(&origin));
        assert!(!Request::get(url("https://localhost:3000/a.css")).is_same_origin(&origin));
        assert!(!Request::get(url("http://cdn.test/a.css")).is_same_origin(&origin));
    }

    #[test]
    fn key_strips_fragment() {
        let a = Request::get(url("http://a.test/page#top")).key();
        let b = Request::get(url("http://a.test/page")).key();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "GET http://a.test/page");
    }

    #[test]
    fn key_distinguishes_method() {
        let get = Request::new(Method::Get, url("http://a.test/x")).key();
        let head = Request::new(Method::Head, url("http://a.test/x")).key();
        assert_ne!(get, head);
    }
}
