//! Test utilities for Ferrule crates.

use ferrule_client::{Provider, SendError, Sender};
use ferrule_message::{Body, Message, MemoryStream, Request, SimpleRequest, SimpleResponse};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Creates a temporary directory that is cleaned up on drop.
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Creates a temporary file with given content.
pub fn temp_file(content: &str) -> (TempDir, PathBuf) {
    let dir = temp_dir();
    let path = dir.path().join("test_file");
    std::fs::write(&path, content).expect("Failed to write temp file");
    (dir, path)
}

/// Seekable body positioned at the start.
pub fn seekable_body(content: &str) -> Body {
    Body::new(MemoryStream::new(content.to_string()))
}

/// Forward-only body positioned at the start.
pub fn forward_only_body(content: &str) -> Body {
    Body::new(MemoryStream::forward_only(content.to_string()))
}

/// Assert that a Result is Ok and return the value.
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(v) => v,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
}

/// Assert that a Result is Err and return the error.
#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {
        match $expr {
            Ok(v) => panic!("Expected Err, got Ok: {:?}", v),
            Err(e) => e,
        }
    };
}

/// What [`MockSender`] answers for a path.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Error response with this status, body `Oh no error!` and reason
    /// `Simulated error`. Status 0 is a network failure instead.
    Status(u16),
    /// 200 response with this body.
    Text(String),
    /// This exact response.
    Response(SimpleResponse),
    NetworkFailure,
    RequestFailure,
    /// A failure that is neither network- nor request-shaped.
    ClientFailure(String),
}

impl From<u16> for Reply {
    fn from(status: u16) -> Self {
        Self::Status(status)
    }
}

impl From<&str> for Reply {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<SimpleResponse> for Reply {
    fn from(response: SimpleResponse) -> Self {
        Self::Response(response)
    }
}

/// A sender that answers from a table keyed by request path.
///
/// The query string is ignored when routing. Unrouted paths get a plain-text
/// 404. Every request is recorded, in order.
#[derive(Debug, Default)]
pub struct MockSender {
    routes: HashMap<String, Reply>,
    requests: Mutex<Vec<SimpleRequest>>,
}

impl MockSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style route registration.
    pub fn route(mut self, path: &str, reply: impl Into<Reply>) -> Self {
        self.routes.insert(path.to_string(), reply.into());
        self
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<SimpleRequest> {
        self.requests.lock().clone()
    }

    /// Remove and return the oldest recorded request.
    pub fn take_first(&self) -> Option<SimpleRequest> {
        let mut requests = self.requests.lock();
        if requests.is_empty() {
            None
        } else {
            Some(requests.remove(0))
        }
    }

    pub fn not_found() -> SimpleResponse {
        SimpleResponse::new(404, "Not Found")
            .with_header("Content-Type", "text/plain")
            .with_body(seekable_body("404 Not Found"))
    }
}

impl Sender for MockSender {
    fn send_request(&self, request: &SimpleRequest) -> Result<SimpleResponse, SendError> {
        self.requests.lock().push(request.clone());

        let target = request.request_target();
        let path = target.split('?').next().unwrap_or_default();
        let Some(reply) = self.routes.get(path) else {
            return Ok(Self::not_found());
        };

        match reply {
            Reply::Status(0) | Reply::NetworkFailure => {
                Err(SendError::network("Simulated network exception."))
            }
            Reply::Status(status) => Ok(SimpleResponse::new(*status, "Simulated error")
                .with_body(seekable_body("Oh no error!"))),
            Reply::Text(text) => Ok(SimpleResponse::default().with_body(seekable_body(text))),
            Reply::Response(response) => Ok(response.clone()),
            Reply::RequestFailure => Err(SendError::request("Simulated request exception.")),
            Reply::ClientFailure(message) => Err(SendError::other(message.clone())),
        }
    }
}

impl Provider for MockSender {
    fn sender(self: Arc<Self>) -> Option<Arc<dyn Sender>> {
        Some(self)
    }
}
