//! Message, Request and Response capabilities and their concrete values.
//!
//! Every `with_*` method returns a new value. Header storage is copy-on-write,
//! so two values from the same `with_*` chain never observe each other's
//! writes. The body is a shared [`Body`] handle: it is passed along, never read.

use crate::headers::{HeaderValues, Headers};
use crate::stream::Body;
use crate::uri::Uri;

/// Protocol version, headers and body.
pub trait Message: Sized {
    fn protocol_version(&self) -> &str;

    fn headers(&self) -> &Headers;

    /// Values for `name` (case-insensitive), or an empty slice.
    fn header(&self, name: &str) -> &[String] {
        self.headers().get(name)
    }

    /// Values for `name` joined with `", "`; empty when absent.
    fn header_line(&self, name: &str) -> String {
        self.headers().line(name)
    }

    fn has_header(&self, name: &str) -> bool {
        self.headers().contains(name)
    }

    fn body(&self) -> &Body;

    fn with_protocol_version(&self, version: impl Into<String>) -> Self;

    /// Replace every value of `name`.
    fn with_header(&self, name: &str, value: impl Into<HeaderValues>) -> Self;

    /// Append to the values of `name`, creating it when absent.
    fn with_added_header(&self, name: &str, value: impl Into<HeaderValues>) -> Self;

    /// Remove `name`. Removing an absent header is not an error.
    fn without_header(&self, name: &str) -> Self;

    /// Replace the body reference. The new stream is not read.
    fn with_body(&self, body: Body) -> Self;
}

/// A message sent to a server.
pub trait Request: Message {
    fn method(&self) -> &str;

    fn uri(&self) -> &Uri;

    /// The explicit target if one was set, else `path?query` of the URI.
    fn request_target(&self) -> String;

    fn with_method(&self, method: &str) -> Self;

    fn with_request_target(&self, target: &str) -> Self;

    /// Replace the URI.
    ///
    /// The Host header is never derived from the URI: it is left as is whether
    /// or not `preserve_host` is set, and keeping it in sync is up to the caller.
    fn with_uri(&self, uri: Uri, preserve_host: bool) -> Self;
}

/// A message received from a server.
pub trait Response: Message {
    fn status_code(&self) -> u16;

    fn reason_phrase(&self) -> &str;

    /// Replace the status.
    ///
    /// An empty `reason` keeps the current reason phrase instead of clearing
    /// it, so a code-only update never erases a known phrase.
    fn with_status(&self, code: u16, reason: &str) -> Self;
}

/// Start line of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    pub uri: Uri,
    pub target: Option<String>,
}

impl Default for RequestLine {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            uri: Uri::default(),
            target: None,
        }
    }
}

/// Start line of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub code: u16,
    pub reason: String,
}

impl Default for StatusLine {
    fn default() -> Self {
        Self {
            code: 200,
            reason: String::new(),
        }
    }
}

/// Concrete message value, parameterized by its start line.
///
/// `()` gives a bare message, [`RequestLine`] a request and [`StatusLine`] a
/// response.
#[derive(Debug, Clone)]
pub struct SimpleMessage<L = ()> {
    start: L,
    protocol_version: String,
    headers: Headers,
    body: Body,
}

pub type SimpleRequest = SimpleMessage<RequestLine>;

pub type SimpleResponse = SimpleMessage<StatusLine>;

impl<L: Default> Default for SimpleMessage<L> {
    fn default() -> Self {
        Self::from_start(L::default())
    }
}

impl<L> SimpleMessage<L> {
    /// Message with the given start line, protocol `1.1`, no headers and an
    /// empty body.
    pub fn from_start(start: L) -> Self {
        Self {
            start,
            protocol_version: "1.1".to_string(),
            headers: Headers::new(),
            body: Body::empty(),
        }
    }

    pub fn start_line(&self) -> &L {
        &self.start
    }
}

impl SimpleMessage<RequestLine> {
    pub fn new(method: &str, uri: Uri) -> Self {
        Self::from_start(RequestLine {
            method: method.to_string(),
            uri,
            target: None,
        })
    }
}

impl SimpleMessage<StatusLine> {
    pub fn new(code: u16, reason: &str) -> Self {
        Self::from_start(StatusLine {
            code,
            reason: reason.to_string(),
        })
    }
}

impl<L: Clone> SimpleMessage<L> {
    fn map_headers(&self, f: impl FnOnce(&mut Headers)) -> Self {
        let mut next = self.clone();
        f(&mut next.headers);
        next
    }

    fn map_start(&self, f: impl FnOnce(&mut L)) -> Self {
        let mut next = self.clone();
        f(&mut next.start);
        next
    }
}

impl<L: Clone> Message for SimpleMessage<L> {
    fn protocol_version(&self) -> &str {
        &self.protocol_version
    }

    fn headers(&self) -> &Headers {
        &self.headers
    }

    fn body(&self) -> &Body {
        &self.body
    }

    fn with_protocol_version(&self, version: impl Into<String>) -> Self {
        Self {
            protocol_version: version.into(),
            ..self.clone()
        }
    }

    fn with_header(&self, name: &str, value: impl Into<HeaderValues>) -> Self {
        self.map_headers(|headers| headers.insert(name, value))
    }

    fn with_added_header(&self, name: &str, value: impl Into<HeaderValues>) -> Self {
        self.map_headers(|headers| headers.append(name, value))
    }

    fn without_header(&self, name: &str) -> Self {
        self.map_headers(|headers| {
            headers.remove(name);
        })
    }

    fn with_body(&self, body: Body) -> Self {
        Self {
            body,
            ..self.clone()
        }
    }
}

impl Request for SimpleMessage<RequestLine> {
    fn method(&self) -> &str {
        &self.start.method
    }

    fn uri(&self) -> &Uri {
        &self.start.uri
    }

    fn request_target(&self) -> String {
        match &self.start.target {
            Some(target) => target.clone(),
            None => self.start.uri.path_and_query(),
        }
    }

    fn with_method(&self, method: &str) -> Self {
        self.map_start(|line| line.method = method.to_string())
    }

    fn with_request_target(&self, target: &str) -> Self {
        self.map_start(|line| line.target = Some(target.to_string()))
    }

    fn with_uri(&self, uri: Uri, _preserve_host: bool) -> Self {
        self.map_start(|line| line.uri = uri)
    }
}

impl Response for SimpleMessage<StatusLine> {
    fn status_code(&self) -> u16 {
        self.start.code
    }

    fn reason_phrase(&self) -> &str {
        &self.start.reason
    }

    fn with_status(&self, code: u16, reason: &str) -> Self {
        self.map_start(|line| {
            line.code = code;
            if !reason.is_empty() {
                line.reason = reason.to_string();
            }
        })
    }
}
