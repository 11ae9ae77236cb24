//! Requests, responses and the network seam

mod network;
mod request;
mod response;
#[cfg(test)]
pub(crate) mod testing;

pub use network::{HttpNetwork, Network, OfflineNetwork};
pub use request::{Destination, Method, Request, RequestKey};
pub use response::{Response, ResponseKind};
