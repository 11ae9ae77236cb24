//! Event dispatch table
//!
//! Handlers are registered per event kind. Dispatching an event with no
//! registered handler is an error rather than a silent no-op.

use crate::error::{B64Error, B64Result};
use crate::worker::event::{Event, EventKind, EventOutcome};
use crate::worker::manager::OfflineCacheManager;
use futures_util::future::BoxFuture;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Boxed handler: owns the manager handle and the event
pub type Handler =
    fn(Arc<OfflineCacheManager>, Event) -> BoxFuture<'static, B64Result<EventOutcome>>;

/// Maps each event kind to its handler
#[derive(Default)]
pub struct HandlerTable {
    handlers: HashMap<EventKind, Handler>,
}

impl HandlerTable {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Table wired to the offline cache manager for all four events
    pub fn standard() -> Self {
        Self::new()
            .on(EventKind::Install, install)
            .on(EventKind::Activate, activate)
            .on(EventKind::Fetch, fetch)
            .on(EventKind::Message, message)
    }

    /// Register (or replace) the handler for `kind`
    pub fn on(mut self, kind: EventKind, handler: Handler) -> Self {
        self.handlers.insert(kind, handler);
        self
    }

    /// Run the handler registered for the event's kind
    pub async fn dispatch(
        &self,
        manager: Arc<OfflineCacheManager>,
        event: Event,
    ) -> B64Result<EventOutcome> {
        let kind = event.kind();
        let handler = self
            .handlers
            .get(&kind)
            .ok_or_else(|| B64Error::NoHandler(kind.to_string()))?;

        debug!("Dispatching {} to {}", kind, manager.cache_name());
        handler(manager, event).await
    }
}

fn install(
    manager: Arc<OfflineCacheManager>,
    _event: Event,
) -> BoxFuture<'static, B64Result<EventOutcome>> {
    Box::pin(async move { manager.install().await })
}

fn activate(
    manager: Arc<OfflineCacheManager>,
    _event: Event,
) -> BoxFuture<'static, B64Result<EventOutcome>> {
    Box::pin(async move { manager.activate().await })
}

fn fetch(
    manager: Arc<OfflineCacheManager>,
    event: Event,
) -> BoxFuture<'static, B64Result<EventOutcome>> {
    Box::pin(async move {
        match event {
            Event::Fetch(request) => manager.fetch(request).await.map(EventOutcome::Fetched),
            other => Err(B64Error::Internal(format!(
                "fetch handler received {} event",
                other.kind()
            ))),
        }
    })
}

fn message(
    manager: Arc<OfflineCacheManager>,
    event: Event,
) -> BoxFuture<'static, B64Result<EventOutcome>> {
    Box::pin(async move {
        match event {
            Event::Message(msg) => Ok(manager.message(&msg)),
            other => Err(B64Error::Internal(format!(
                "message handler received {} event",
                other.kind()
            ))),
        }
    })
}
