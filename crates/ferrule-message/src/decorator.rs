//! Forwarding wrappers.
//!
//! A type that implements [`Decorator`] gets [`Message`], [`Request`] and
//! [`Response`] for free whenever its inner value has them. Reads go straight to
//! the inner value. Writes mutate a copy of the inner value and wrap it in a
//! duplicate of the decorator via [`Decorator::with_inner`].

use crate::headers::{HeaderValues, Headers};
use crate::message::{Message, Request, Response};
use crate::stream::Body;
use crate::uri::Uri;

/// A value that wraps exactly one inner value.
pub trait Decorator: Sized {
    type Inner;

    fn inner(&self) -> &Self::Inner;

    /// A copy of `self` around `inner`, with all other wrapper state kept.
    fn with_inner(&self, inner: Self::Inner) -> Self;
}

impl<D> Message for D
where
    D: Decorator,
    D::Inner: Message,
{
    fn protocol_version(&self) -> &str {
        self.inner().protocol_version()
    }

    fn headers(&self) -> &Headers {
        self.inner().headers()
    }

    fn header(&self, name: &str) -> &[String] {
        self.inner().header(name)
    }

    fn header_line(&self, name: &str) -> String {
        self.inner().header_line(name)
    }

    fn has_header(&self, name: &str) -> bool {
        self.inner().has_header(name)
    }

    fn body(&self) -> &Body {
        self.inner().body()
    }

    fn with_protocol_version(&self, version: impl Into<String>) -> Self {
        self.with_inner(self.inner().with_protocol_version(version))
    }

    fn with_header(&self, name: &str, value: impl Into<HeaderValues>) -> Self {
        self.with_inner(self.inner().with_header(name, value))
    }

    fn with_added_header(&self, name: &str, value: impl Into<HeaderValues>) -> Self {
        self.with_inner(self.inner().with_added_header(name, value))
    }

    fn without_header(&self, name: &str) -> Self {
        self.with_inner(self.inner().without_header(name))
    }

    fn with_body(&self, body: Body) -> Self {
        self.with_inner(self.inner().with_body(body))
    }
}

impl<D> Request for D
where
    D: Decorator,
    D::Inner: Request,
{
    fn method(&self) -> &str {
        self.inner().method()
    }

    fn uri(&self) -> &Uri {
        self.inner().uri()
    }

    fn request_target(&self) -> String {
        self.inner().request_target()
    }

    fn with_method(&self, method: &str) -> Self {
        self.with_inner(self.inner().with_method(method))
    }

    fn with_request_target(&self, target: &str) -> Self {
        self.with_inner(self.inner().with_request_target(target))
    }

    fn with_uri(&self, uri: Uri, preserve_host: bool) -> Self {
        self.with_inner(self.inner().with_uri(uri, preserve_host))
    }
}

impl<D> Response for D
where
    D: Decorator,
    D::Inner: Response,
{
    fn status_code(&self) -> u16 {
        self.inner().status_code()
    }

    fn reason_phrase(&self) -> &str {
        self.inner().reason_phrase()
    }

    fn with_status(&self, code: u16, reason: &str) -> Self {
        self.with_inner(self.inner().with_status(code, reason))
    }
}

/// Plain pass-through wrapper with no state of its own.
#[derive(Debug, Clone, Default)]
pub struct Decorated<T> {
    inner: T,
}

impl<T> Decorated<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Clone> Decorator for Decorated<T> {
    type Inner = T;

    fn inner(&self) -> &T {
        &self.inner
    }

    fn with_inner(&self, inner: T) -> Self {
        Self { inner }
    }
}
