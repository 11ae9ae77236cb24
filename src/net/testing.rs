//! In-memory network for unit tests

use crate::error::{B64Error, B64Result};
use crate::net::{Network, Request, Response};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Serves canned responses by URL and counts every call
#[derive(Default)]
pub struct MockNetwork {
    routes: Mutex<HashMap<String, Response>>,
    calls: AtomicUsize,
    offline: AtomicBool,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with status 200 at `url`
    pub fn route(&self, url: &str, body: &str) -> &Self {
        self.route_response(url, Response::new(url, 200, body))
    }

    pub fn route_response(&self, url: &str, response: Response) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), response);
        self
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Network for MockNetwork {
    async fn fetch(&self, request: &Request) -> B64Result<Response> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(B64Error::network(request.url.as_str(), "offline"));
        }

        let routes = self.routes.lock().unwrap();
        match routes.get(request.url.as_str()) {
            Some(response) => Ok(response.clone()),
            None => Ok(Response::new(request.url.as_str(), 404, "not found")),
        }
    }
}
