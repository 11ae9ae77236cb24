//! Network abstraction
//!
//! The cache manager only ever talks to the network through this trait, so
//! it can run against real HTTP, a permanently offline network, or a test
//! double.

use crate::error::{B64Error, B64Result};
use crate::net::request::{Method, Request};
use crate::net::response::{Response, ResponseKind};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;
use ureq::ResponseExt;
use url::{Origin, Url};

/// Abstract network interface
#[async_trait]
pub trait Network: Send + Sync {
    /// Perform a single fetch. No retries.
    ///
    /// Any completed HTTP exchange is `Ok`, whatever its status. `Err` means
    /// the request never produced a response.
    async fn fetch(&self, request: &Request) -> B64Result<Response>;
}

/// Blocking HTTP client (`ureq`) driven from the async runtime
pub struct HttpNetwork {
    agent: ureq::Agent,
    origin: Origin,
}

impl HttpNetwork {
    /// Create a client; responses from `origin` are classified as basic
    pub fn new(origin: Origin, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();

        Self {
            agent: ureq::Agent::new_with_config(config),
            origin,
        }
    }

    fn fetch_blocking(
        agent: &ureq::Agent,
        origin: &Origin,
        method: Method,
        url: &str,
    ) -> B64Result<Response> {
        let result = match method {
            Method::Get => agent.get(url).call(),
            Method::Head => agent.head(url).call(),
            Method::Delete => agent.delete(url).call(),
            Method::Post => agent.post(url).send_empty(),
            Method::Put => agent.put(url).send_empty(),
            Method::Patch => agent.patch(url).send_empty(),
        };
        let mut response = result.map_err(|e| B64Error::network(url, e.to_string()))?;

        // Redirects are followed, so the response may come from elsewhere
        let final_url = response.get_uri().to_string();
        let kind = response_kind(&final_url, origin);

        let status = response.status();
        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();

        let body = if method == Method::Head {
            Vec::new()
        } else {
            response
                .body_mut()
                .read_to_vec()
                .map_err(|e| B64Error::network(url, format!("reading body: {e}")))?
        };

        Ok(Response {
            url: final_url,
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
            kind,
        })
    }
}

/// Basic when the final URL is on `origin`, CORS otherwise
fn response_kind(final_url: &str, origin: &Origin) -> ResponseKind {
    match Url::parse(final_url) {
        Ok(url) if &url.origin() == origin => ResponseKind::Basic,
        _ => ResponseKind::Cors,
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> B64Result<Response> {
        let agent = self.agent.clone();
        let origin = self.origin.clone();
        let method = request.method;
        let url = request.url.to_string();

        debug!("{} {}", method, url);
        tokio::task::spawn_blocking(move || Self::fetch_blocking(&agent, &origin, method, &url))
            .await
            .map_err(|e| B64Error::Internal(format!("fetch task failed: {e}")))?
    }
}

/// A network that is always unreachable
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineNetwork;

#[async_trait]
impl Network for OfflineNetwork {
    async fn fetch(&self, request: &Request) -> B64Result<Response> {
        Err(B64Error::network(request.url.as_str(), "network is offline"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn offline_network_always_fails() {
        let request = Request::get(Url::parse("http://localhost:3000/").unwrap());
        let err = OfflineNetwork.fetch(&request).await.unwrap_err();
        assert!(matches!(err, B64Error::Network { .. }));
        assert!(err.to_string().contains("offline"));
    }

    #[test]
    fn kind_follows_final_url() {
        let origin = Url::parse("http://localhost:3000/").unwrap().origin();
        assert_eq!(
            response_kind("http://localhost:3000/app.css", &origin),
            ResponseKind::Basic
        );
        // Same-origin request redirected to a CDN
        assert_eq!(
            response_kind("https://cdn.example.com/app.css", &origin),
            ResponseKind::Cors
        );
        assert_eq!(response_kind("not a url", &origin), ResponseKind::Cors);
    }

    #[tokio::test]
    async fn http_network_reports_unreachable_host() {
        // Port 9 (discard) on loopback is closed in test environments
        let origin = Url::parse("http://127.0.0.1:9/").unwrap().origin();
        let network = HttpNetwork::new(origin, Duration::from_secs(2));
        let request = Request::get(Url::parse("http://127.0.0.1:9/").unwrap());

        let err = network.fetch(&request).await.unwrap_err();
        assert!(matches!(err, B64Error::Network { .. }));
    }
}
