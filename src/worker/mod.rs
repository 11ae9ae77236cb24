//! Offline cache worker
//!
//! One worker exists per deployment version. The [`Registration`] drives it
//! through `install`, `activate`, `fetch` and `message` events, delivered by
//! the [`HandlerTable`] to the [`OfflineCacheManager`] handlers.

pub mod dispatch;
pub mod event;
pub mod manager;
pub mod manifest;
pub mod registration;
pub mod state;

pub use dispatch::HandlerTable;
pub use event::{Event, EventKind, EventOutcome, FetchOutcome, Message, ServedFrom, SKIP_WAITING};
pub use manager::OfflineCacheManager;
pub use manifest::CacheManifest;
pub use registration::{Activation, ClientRecord, Registration, RegistrationState, UpdateOutcome};
pub use state::{WorkerRecord, WorkerState};
