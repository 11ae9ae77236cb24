//! Lifecycle events, messages and handler outcomes

use crate::error::{B64Error, B64Result};
use crate::net::{Request, Response};
use serde_json::Value;
use std::fmt;

/// Message type that forces a waiting worker to activate
pub const SKIP_WAITING: &str = "SKIP_WAITING";

/// Kind of lifecycle event; the dispatch table is keyed by this
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Install,
    Activate,
    Fetch,
    Message,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Install => "install",
            Self::Activate => "activate",
            Self::Fetch => "fetch",
            Self::Message => "message",
        };
        f.write_str(name)
    }
}

/// Message posted to a worker by a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// `{ "type": "SKIP_WAITING" }`
    SkipWaiting,
    /// Any other payload; carries the `type` field when present
    Other(Option<String>),
}

impl Message {
    /// Parse a JSON message payload
    ///
    /// Payloads without a recognised `type` are `Other`, not errors. Only
    /// malformed JSON is rejected.
    pub fn parse(payload: &str) -> B64Result<Self> {
        let value: Value = serde_json::from_str(payload)
            .map_err(|e| B64Error::InvalidMessage(e.to_string()))?;

        let kind = value.get("type").and_then(Value::as_str);
        Ok(match kind {
            Some(SKIP_WAITING) => Self::SkipWaiting,
            other => Self::Other(other.map(str::to_string)),
        })
    }
}

/// A lifecycle event delivered to a worker
#[derive(Debug, Clone)]
pub enum Event {
    Install,
    Activate,
    Fetch(Request),
    Message(Message),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Install => EventKind::Install,
            Self::Activate => EventKind::Activate,
            Self::Fetch(_) => EventKind::Fetch,
            Self::Message(_) => EventKind::Message,
        }
    }
}

/// Where a fetch was answered from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedFrom {
    /// Cache hit, no network round-trip
    Cache,
    /// Cache miss answered by the network
    Network,
    /// Network failed; cached app shell served instead
    Fallback,
    /// Not intercepted; sent to the network untouched
    Passthrough,
}

impl fmt::Display for ServedFrom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cache => "cache",
            Self::Network => "network",
            Self::Fallback => "offline fallback",
            Self::Passthrough => "passthrough",
        };
        f.write_str(name)
    }
}

/// Result of the fetch handler
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// Not intercepted; the host must perform the request itself
    Passthrough(Request),
    /// Intercepted and answered
    Respond { response: Response, source: ServedFrom },
}

/// Side effects a handler asks the host to apply
#[derive(Debug, Clone)]
pub enum EventOutcome {
    Installed {
        cache_name: String,
        cached: Vec<String>,
        skip_waiting: bool,
    },
    Activated {
        deleted: Vec<String>,
        claim_clients: bool,
    },
    Fetched(FetchOutcome),
    Message {
        skip_waiting: bool,
    },
}
