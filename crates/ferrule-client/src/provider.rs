//! Capability providers and the lookup that picks one.
//!
//! A client is built from an ordered list of providers. For each capability it
//! needs, the first provider that supplies it wins; when none does, the
//! built-in [`SimpleFactory`] is asked, and only then does construction fail.

use crate::error::{ClientError, Result};
use crate::factory::{RequestFactory, ResponseFactory, SimpleFactory, StreamFactory, UriFactory};
use crate::sender::Sender;
use ferrule_log::{Logger, MemoryLogger, TracingLogger};
use std::fmt;
use std::sync::Arc;

/// Something a client can be built from.
///
/// Every accessor defaults to `None`; implementors override the ones they
/// supply and return themselves.
pub trait Provider: Send + Sync {
    fn sender(self: Arc<Self>) -> Option<Arc<dyn Sender>> {
        None
    }

    fn request_factory(self: Arc<Self>) -> Option<Arc<dyn RequestFactory>> {
        None
    }

    fn response_factory(self: Arc<Self>) -> Option<Arc<dyn ResponseFactory>> {
        None
    }

    fn stream_factory(self: Arc<Self>) -> Option<Arc<dyn StreamFactory>> {
        None
    }

    fn uri_factory(self: Arc<Self>) -> Option<Arc<dyn UriFactory>> {
        None
    }

    fn logger(self: Arc<Self>) -> Option<Arc<dyn Logger>> {
        None
    }
}

/// Named capability, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Sender,
    RequestFactory,
    ResponseFactory,
    StreamFactory,
    UriFactory,
    Logger,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sender => "a sender",
            Self::RequestFactory => "a request factory",
            Self::ResponseFactory => "a response factory",
            Self::StreamFactory => "a stream factory",
            Self::UriFactory => "a URI factory",
            Self::Logger => "a logger",
        })
    }
}

/// First provider supplying a capability, else the default factory's, else
/// `MissingCapability`.
pub fn select<T, F>(providers: &[Arc<dyn Provider>], capability: Capability, pick: F) -> Result<Arc<T>>
where
    T: ?Sized,
    F: Fn(Arc<dyn Provider>) -> Option<Arc<T>>,
{
    providers
        .iter()
        .cloned()
        .find_map(&pick)
        .or_else(|| {
            let fallback: Arc<dyn Provider> = Arc::new(SimpleFactory);
            pick(fallback)
        })
        .ok_or(ClientError::MissingCapability { capability })
}

/// Capabilities resolved from a provider list.
#[derive(Clone)]
pub struct Capabilities {
    pub sender: Arc<dyn Sender>,
    pub request_factory: Arc<dyn RequestFactory>,
    pub response_factory: Arc<dyn ResponseFactory>,
    pub stream_factory: Arc<dyn StreamFactory>,
    pub uri_factory: Arc<dyn UriFactory>,
    pub logger: Arc<dyn Logger>,
}

impl Capabilities {
    /// Resolve everything a client needs. Only the sender has no default; the
    /// logger falls back to [`TracingLogger`].
    pub fn resolve(providers: &[Arc<dyn Provider>]) -> Result<Self> {
        Ok(Self {
            sender: select(providers, Capability::Sender, |p| p.sender())?,
            request_factory: select(providers, Capability::RequestFactory, |p| p.request_factory())?,
            response_factory: select(providers, Capability::ResponseFactory, |p| {
                p.response_factory()
            })?,
            stream_factory: select(providers, Capability::StreamFactory, |p| p.stream_factory())?,
            uri_factory: select(providers, Capability::UriFactory, |p| p.uri_factory())?,
            logger: select(providers, Capability::Logger, |p| p.logger())
                .unwrap_or_else(|_| default_logger()),
        })
    }
}

fn default_logger() -> Arc<dyn Logger> {
    Arc::new(TracingLogger::new())
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities").finish_non_exhaustive()
    }
}

impl Provider for TracingLogger {
    fn logger(self: Arc<Self>) -> Option<Arc<dyn Logger>> {
        Some(self)
    }
}

impl Provider for MemoryLogger {
    fn logger(self: Arc<Self>) -> Option<Arc<dyn Logger>> {
        Some(self)
    }
}
