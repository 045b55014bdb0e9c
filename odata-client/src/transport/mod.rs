//! Transport boundary
//!
//! The engine never talks HTTP itself. A [`Transport`] receives a rendered
//! [`ODataRequest`] and answers with a stream of events that ends with the
//! response.

#[cfg(feature = "reqwest-transport")]
pub mod http;

#[cfg(feature = "reqwest-transport")]
pub use http::ReqwestTransport;

use crate::request::{ODataRequest, ODataResponse};
use futures::stream::BoxStream;

/// Event emitted while a request is in flight
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// The request left the client
    Sent,
    /// Download progress
    Progress { loaded: u64, total: Option<u64> },
    /// Terminal event
    Response(ODataResponse),
}

/// Failure before any response was received
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TransportError {}

/// Sends rendered requests to the remote service
pub trait Transport: Send + Sync {
    fn send(&self, request: ODataRequest)
    -> BoxStream<'static, Result<TransportEvent, TransportError>>;
}
