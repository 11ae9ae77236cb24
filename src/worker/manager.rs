//! Offline cache manager: the install, activate, fetch and message handlers
//!
//! Cache-first for same-origin GET requests. Misses go to the network once,
//! and successful basic responses are stored for next time. When the
//! network is gone, navigations fall back to the cached app shell.

use crate::cache::CacheStorage;
use crate::error::{B64Error, B64Result};
use crate::net::{Method, Network, Request, RequestKey, Response};
use crate::worker::event::{EventOutcome, FetchOutcome, Message, ServedFrom};
use crate::worker::manifest::CacheManifest;
use futures_util::future::{join_all, try_join_all};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use url::{Origin, Url};

/// Handlers for one worker version
pub struct OfflineCacheManager {
    manifest: CacheManifest,
    cache_name: String,
    origin: Origin,
    resources: Vec<Url>,
    app_shell: Url,
    storage: Arc<CacheStorage>,
    network: Arc<dyn Network>,
}

impl OfflineCacheManager {
    /// Create the handlers for a validated manifest
    pub fn new(
        manifest: CacheManifest,
        storage: Arc<CacheStorage>,
        network: Arc<dyn Network>,
    ) -> B64Result<Self> {
        let cache_name = manifest.cache_name()?.to_string();
        let resources = manifest.resource_urls()?;
        let app_shell = manifest.app_shell_url()?;
        let origin = manifest.origin.origin();

        Ok(Self {
            manifest,
            cache_name,
            origin,
            resources,
            app_shell,
            storage,
            network,
        })
    }

    /// Name of the store this version owns
    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    pub fn manifest(&self) -> &CacheManifest {
        &self.manifest
    }

    /// Open the version's store and fill it with the static resources
    ///
    /// All resources are fetched before anything is written. On any failure
    /// nothing is written, and a store created by this install is removed.
    pub async fn install(&self) -> B64Result<EventOutcome> {
        info!("Installing version {}", self.manifest.version);

        let created = self.storage.open(&self.cache_name).await;
        info!("Caching static resources into {}", self.cache_name);

        match self.precache().await {
            Ok(cached) => Ok(EventOutcome::Installed {
                cache_name: self.cache_name.clone(),
                cached,
                skip_waiting: self.manifest.skip_waiting_on_install,
            }),
            Err(e) => {
                error!("Install of {} failed: {}", self.cache_name, e);
                if created {
                    self.storage.delete(&self.cache_name).await;
                }
                Err(e)
            }
        }
    }

    async fn precache(&self) -> B64Result<Vec<String>> {
        let requests: Vec<Request> = self
            .resources
            .iter()
            .map(|url| Request::get(url.clone()))
            .collect();

        let responses = try_join_all(requests.iter().map(|r| self.fetch_required(r))).await?;

        let entries: Vec<(RequestKey, Response)> = requests
            .iter()
            .map(Request::key)
            .zip(responses)
            .collect();
        let cached = entries.iter().map(|(key, _)| key.url.clone()).collect();

        self.storage.put_all(&self.cache_name, entries).await?;
        Ok(cached)
    }

    /// Fetch one static resource; any non-2xx status fails the install
    async fn fetch_required(&self, request: &Request) -> B64Result<Response> {
        let response = self.network.fetch(request).await?;
        if !response.is_ok() {
            return Err(B64Error::HttpStatus {
                url: request.url.to_string(),
                status: response.status,
            });
        }
        Ok(response)
    }

    /// Delete every store except this version's
    pub async fn activate(&self) -> B64Result<EventOutcome> {
        info!("Activating version {}", self.manifest.version);

        let stale: Vec<String> = self
            .storage
            .keys()
            .await
            .into_iter()
            .filter(|name| name != &self.cache_name)
            .collect();

        join_all(stale.iter().map(|name| async move {
            info!("Deleting old cache: {}", name);
            self.storage.delete(name).await
        }))
        .await;

        Ok(EventOutcome::Activated {
            deleted: stale,
            claim_clients: self.manifest.claim_clients,
        })
    }

    /// Intercept a request
    pub async fn fetch(&self, request: Request) -> B64Result<FetchOutcome> {
        if request.method != Method::Get || !request.is_same_origin(&self.origin) {
            return Ok(FetchOutcome::Passthrough(request));
        }

        let key = request.key();
        if let Some(response) = self.storage.match_in(&self.cache_name, &key).await {
            debug!("Serving from cache: {}", request.url);
            return Ok(FetchOutcome::Respond {
                response,
                source: ServedFrom::Cache,
            });
        }

        match self.network.fetch(&request).await {
            Ok(response) => {
                if response.is_cacheable() {
                    self.store_copy(&key, &response).await;
                }
                Ok(FetchOutcome::Respond {
                    response,
                    source: ServedFrom::Network,
                })
            }
            Err(e) if request.is_document() => {
                warn!("Network failed for {}: {}", request.url, e);
                self.offline_fallback(&request).await
            }
            Err(e) => Err(e),
        }
    }

    /// Best-effort write; failures never reach the requester
    async fn store_copy(&self, key: &RequestKey, response: &Response) {
        self.storage.open(&self.cache_name).await;
        match self
            .storage
            .put(&self.cache_name, key, response.clone())
            .await
        {
            Ok(()) => debug!("Cached {}", key),
            Err(e) => warn!("Could not cache {}: {}", key, e),
        }
    }

    /// Serve the app shell from any store
    async fn offline_fallback(&self, request: &Request) -> B64Result<FetchOutcome> {
        let shell = RequestKey::new(Method::Get, &self.app_shell);
        match self.storage.match_any(&shell).await {
            Some(response) => {
                info!("Offline: serving app shell for {}", request.url);
                Ok(FetchOutcome::Respond {
                    response,
                    source: ServedFrom::Fallback,
                })
            }
            None => Err(B64Error::OfflineFallbackMissing(request.url.to_string())),
        }
    }

    /// Handle a posted message
    pub fn message(&self, message: &Message) -> EventOutcome {
        match message {
            Message::SkipWaiting => {
                info!("Skip waiting requested for {}", self.cache_name);
                EventOutcome::Message { skip_waiting: true }
            }
            Message::Other(kind) => {
                debug!("Ignoring message {:?}", kind);
                EventOutcome::Message {
                    skip_waiting: false,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::net::testing::MockNetwork;
    use crate::net::{Destination, ResponseKind};

    const ORIGIN: &str = "http://localhost:3000";

    fn url(path: &str) -> String {
        format!("{ORIGIN}{path}")
    }

    fn shell_network() -> Arc<MockNetwork> {
        let network = Arc::new(MockNetwork::new());
        network
            .route(&url("/"), "<html>shell</html>")
            .route(&url("/manifest.json"), "{}")
            .route(&url("/_next/static/css/app/layout.css"), "body{}")
            .route(&url("/_next/static/css/app/page.css"), "main{}");
        network
    }

    fn manager_for(
        version: &str,
        storage: &Arc<CacheStorage>,
        network: &Arc<MockNetwork>,
    ) -> OfflineCacheManager {
        let mut config = Config::default();
        config.app.version = version.to_string();
        let manifest = CacheManifest::from_config(&config).unwrap();
        OfflineCacheManager::new(manifest, storage.clone(), network.clone()).unwrap()
    }

    fn get(path: &str) -> Request {
        Request::parse(Method::Get, &url(path)).unwrap()
    }

    #[tokio::test]
    async fn install_caches_every_static_resource() {
        let storage = Arc::new(CacheStorage::new());
        let network = shell_network();
        let manager = manager_for("1.0.0", &storage, &network);

        let outcome = manager.install().await.unwrap();
        match outcome {
            EventOutcome::Installed {
                cache_name,
                cached,
                skip_waiting,
            } => {
                assert_eq!(cache_name, "base64-app-v1.0.0");
                assert_eq!(cached.len(), 4);
                assert!(skip_waiting);
            }
            other => panic!("unexpected outcome {other:?}"),
        }

        for path in CacheManifest::default().static_resources {
            let key = get(&path).key();
            assert!(
                storage.match_in("base64-app-v1.0.0", &key).await.is_some(),
                "{path} missing"
            );
        }
    }

    #[tokio::test]
    async fn install_failure_leaves_no_store() {
        let storage = Arc::new(CacheStorage::new());
        let network = Arc::new(MockNetwork::new());
        network.route(&url("/"), "shell"); // the rest 404
        let manager = manager_for("1.0.0", &storage, &network);

        let err = manager.install().await.unwrap_err();
        assert!(matches!(err, B64Error::HttpStatus { status: 404, .. }));
        assert!(!storage.has("base64-app-v1.0.0").await);
    }

    #[tokio::test]
    async fn install_failure_offline() {
        let storage = Arc::new(CacheStorage::new());
        let network = shell_network();
        network.set_offline(true);
        let manager = manager_for("1.0.0", &storage, &network);

        assert!(manager.install().await.is_err());
        assert!(storage.keys().await.is_empty());
    }

    #[tokio::test]
    async fn activate_deletes_other_stores() {
        let storage = Arc::new(CacheStorage::new());
        storage.open("base64-app-v0.9.0").await;
        storage.open("unrelated").await;
        let network = shell_network();
        let manager = manager_for("1.0.0", &storage, &network);
        manager.install().await.unwrap();

        match manager.activate().await.unwrap() {
            EventOutcome::Activated {
                deleted,
                claim_clients,
            } => {
                assert_eq!(deleted, vec!["base64-app-v0.9.0", "unrelated"]);
                assert!(claim_clients);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(storage.keys().await, vec!["base64-app-v1.0.0"]);
    }

    #[tokio::test]
    async fn non_get_and_cross_origin_pass_through() {
        let storage = Arc::new(CacheStorage::new());
        let network = shell_network();
        let manager = manager_for("1.0.0", &storage, &network);

        let post = Request::parse(Method::Post, &url("/")).unwrap();
        assert!(matches!(
            manager.fetch(post.clone()).await.unwrap(),
            FetchOutcome::Passthrough(r) if r == post
        ));

        let cross = Request::parse(Method::Get, "https://cdn.example.com/lib.js").unwrap();
        assert!(matches!(
            manager.fetch(cross).await.unwrap(),
            FetchOutcome::Passthrough(_)
        ));
        assert_eq!(network.calls(), 0);
    }

    #[tokio::test]
    async fn cache_hit_skips_network() {
        let storage = Arc::new(CacheStorage::new());
        let network = shell_network();
        let manager = manager_for("1.0.0", &storage, &network);
        manager.install().await.unwrap();
        let calls_after_install = network.calls();

        let outcome = manager.fetch(get("/manifest.json")).await.unwrap();
        match outcome {
            FetchOutcome::Respond { response, source } => {
                assert_eq!(source, ServedFrom::Cache);
                assert_eq!(response.body, b"{}");
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(network.calls(), calls_after_install);
    }

    #[tokio::test]
    async fn miss_populates_cache_then_hits() {
        let storage = Arc::new(CacheStorage::new());
        let network = shell_network();
        network.route(&url("/icon.png"), "png");
        let manager = manager_for("1.0.0", &storage, &network);

        let first = manager.fetch(get("/icon.png")).await.unwrap();
        assert!(matches!(
            first,
            FetchOutcome::Respond { source: ServedFrom::Network, .. }
        ));
        assert_eq!(network.calls(), 1);

        let second = manager.fetch(get("/icon.png")).await.unwrap();
        assert!(matches!(
            second,
            FetchOutcome::Respond { source: ServedFrom::Cache, .. }
        ));
        assert_eq!(network.calls(), 1);
    }

    #[tokio::test]
    async fn non_cacheable_responses_are_not_stored() {
        let storage = Arc::new(CacheStorage::new());
        let network = shell_network();
        network.route_response(
            &url("/opaque"),
            Response::new(url("/opaque"), 200, "x").with_kind(ResponseKind::Opaque),
        );
        let manager = manager_for("1.0.0", &storage, &network);

        // 404 from the mock for an unknown path
        manager.fetch(get("/missing.css")).await.unwrap();
        manager.fetch(get("/opaque")).await.unwrap();

        assert!(storage.match_any(&get("/missing.css").key()).await.is_none());
        assert!(storage.match_any(&get("/opaque").key()).await.is_none());
    }

    #[tokio::test]
    async fn cache_write_failure_still_returns_response() {
        let storage = Arc::new(CacheStorage::new().with_quota(Some(10)));
        let network = shell_network();
        network.route(&url("/big.js"), &"x".repeat(1000));
        let manager = manager_for("1.0.0", &storage, &network);

        match manager.fetch(get("/big.js")).await.unwrap() {
            FetchOutcome::Respond { response, source } => {
                assert_eq!(source, ServedFrom::Network);
                assert_eq!(response.body.len(), 1000);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!(storage.match_any(&get("/big.js").key()).await.is_none());
    }

    #[tokio::test]
    async fn offline_document_falls_back_to_shell() {
        let storage = Arc::new(CacheStorage::new());
        let network = shell_network();
        let manager = manager_for("1.0.0", &storage, &network);
        manager.install().await.unwrap();
        network.set_offline(true);

        let deep_link = get("/settings").with_destination(Destination::Document);
        match manager.fetch(deep_link).await.unwrap() {
            FetchOutcome::Respond { response, source } => {
                assert_eq!(source, ServedFrom::Fallback);
                assert_eq!(response.body, b"<html>shell</html>");
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn offline_document_without_shell_fails() {
        let storage = Arc::new(CacheStorage::new());
        let network = shell_network();
        network.set_offline(true);
        let manager = manager_for("1.0.0", &storage, &network);

        let shell = get("/").with_destination(Destination::Document);
        let err = manager.fetch(shell).await.unwrap_err();
        assert!(matches!(err, B64Error::OfflineFallbackMissing(_)));
    }

    #[tokio::test]
    async fn offline_fallback_uses_shell_from_prior_population() {
        let storage = Arc::new(CacheStorage::new());
        let network = shell_network();
        manager_for("1.0.0", &storage, &network)
            .install()
            .await
            .unwrap();
        network.set_offline(true);

        // A newer version with an empty store still finds the older shell
        let newer = manager_for("2.0.0", &storage, &network);
        let shell = get("/").with_destination(Destination::Document);
        match newer.fetch(shell).await.unwrap() {
            FetchOutcome::Respond { source, .. } => assert_eq!(source, ServedFrom::Fallback),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn offline_subresource_propagates_failure() {
        let storage = Arc::new(CacheStorage::new());
        let network = shell_network();
        network.set_offline(true);
        let manager = manager_for("1.0.0", &storage, &network);

        let err = manager.fetch(get("/app.js")).await.unwrap_err();
        assert!(matches!(err, B64Error::Network { .. }));
    }

    #[tokio::test]
    async fn offline_api_fetch_is_not_a_navigation() {
        let storage = Arc::new(CacheStorage::new());
        let network = shell_network();
        let manager = manager_for("1.0.0", &storage, &network);
        manager.install().await.unwrap();
        network.set_offline(true);

        // The shell is cached, but a programmatic fetch must not receive it
        let err = manager.fetch(get("/api/items")).await.unwrap_err();
        assert!(matches!(err, B64Error::Network { .. }));
    }

    #[test]
    fn skip_waiting_message() {
        let storage = Arc::new(CacheStorage::new());
        let network = shell_network();
        let manager = manager_for("1.0.0", &storage, &network);

        assert!(matches!(
            manager.message(&Message::SkipWaiting),
            EventOutcome::Message { skip_waiting: true }
        ));
        assert!(matches!(
            manager.message(&Message::Other(None)),
            EventOutcome::Message { skip_waiting: false }
        ));
    }
}
