//! The sender capability: turns a request into a response.

use crate::error::SendError;
use crate::provider::Provider;
use ferrule_message::{SimpleRequest, SimpleResponse};
use std::fmt;
use std::sync::Arc;

/// Performs the network exchange for a request.
///
/// Implementations own transport concerns (connections, TLS, timeouts). The
/// client never retries.
pub trait Sender: Send + Sync {
    fn send_request(&self, request: &SimpleRequest) -> Result<SimpleResponse, SendError>;
}

/// A closure acting as a sender.
pub struct SenderFn<F>(F);

impl<F> SenderFn<F>
where
    F: Fn(&SimpleRequest) -> Result<SimpleResponse, SendError> + Send + Sync + 'static,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> fmt::Debug for SenderFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SenderFn")
    }
}

impl<F> Sender for SenderFn<F>
where
    F: Fn(&SimpleRequest) -> Result<SimpleResponse, SendError> + Send + Sync,
{
    fn send_request(&self, request: &SimpleRequest) -> Result<SimpleResponse, SendError> {
        (self.0)(request)
    }
}

impl<F> Provider for SenderFn<F>
where
    F: Fn(&SimpleRequest) -> Result<SimpleResponse, SendError> + Send + Sync + 'static,
{
    fn sender(self: Arc<Self>) -> Option<Arc<dyn Sender>> {
        Some(self)
    }
}
